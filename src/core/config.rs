use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::valuation::ReconcileSettings;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LedgerProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub ledger: Option<LedgerProviderConfig>,
    pub coingecko: Option<CoinGeckoProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            ledger: Some(LedgerProviderConfig {
                base_url: "http://localhost:8080".to_string(),
            }),
            coingecko: Some(CoinGeckoProviderConfig {
                base_url: "https://api.coingecko.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Credential the holdings service scopes its answer by.
    pub api_key: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Catalog id substrings that never match; defaults to bridged-token
    /// clones when omitted.
    pub exclude_catalog_ids: Option<Vec<String>>,
    /// Quote symbols treated as USD at par.
    pub usd_equivalents: Option<Vec<String>>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "coinlens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Lowers the optional overrides into reconciliation settings, keeping
    /// the built-in defaults where the config stays silent.
    pub fn reconcile_settings(&self) -> ReconcileSettings {
        let mut settings = ReconcileSettings::default();
        if let Some(patterns) = &self.exclude_catalog_ids {
            settings.exclude_id_patterns = patterns.iter().map(|p| p.to_lowercase()).collect();
        }
        if let Some(symbols) = &self.usd_equivalents {
            settings.usd_equivalents = symbols.iter().map(|s| s.to_lowercase()).collect();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let yaml_str = r#"
api_key: "secret-key"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.api_key, "secret-key");
        assert_eq!(
            config.providers.ledger.as_ref().unwrap().base_url,
            "http://localhost:8080"
        );
        assert_eq!(
            config.providers.coingecko.as_ref().unwrap().base_url,
            "https://api.coingecko.com"
        );

        let settings = config.reconcile_settings();
        assert_eq!(settings.exclude_id_patterns, vec!["wormhole"]);
        assert!(settings.usd_equivalents.contains("usdt"));
        assert!(settings.usd_equivalents.contains("busd"));
    }

    #[test]
    fn test_full_config_overrides_everything() {
        let yaml_str = r#"
api_key: "secret-key"
providers:
  ledger:
    base_url: "http://example.com/ledger"
  coingecko:
    base_url: "http://example.com/gecko"
exclude_catalog_ids:
  - "Wormhole"
  - "wrapped"
usd_equivalents:
  - "USD"
  - "DAI"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(
            config.providers.ledger.as_ref().unwrap().base_url,
            "http://example.com/ledger"
        );
        assert_eq!(
            config.providers.coingecko.as_ref().unwrap().base_url,
            "http://example.com/gecko"
        );

        let settings = config.reconcile_settings();
        assert_eq!(settings.exclude_id_patterns, vec!["wormhole", "wrapped"]);
        assert!(settings.usd_equivalents.contains("dai"));
        assert!(!settings.usd_equivalents.contains("usdt"));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result: std::result::Result<AppConfig, _> = serde_yaml::from_str("providers: {}");
        assert!(result.is_err());
    }
}
