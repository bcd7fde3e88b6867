//! Error taxonomy for a refresh cycle.

use thiserror::Error;

/// Failures surfaced by the collaborators of a refresh cycle.
///
/// `NotFound` and `Unauthorized` come from the holdings service and end the
/// cycle. `Unavailable` ends the cycle only when raised by the holdings
/// service; for the catalog and quote services the cycle keeps going and the
/// affected symbols degrade to unmatched. `Malformed` always ends the cycle:
/// an upstream that answers with an unexpected shape cannot be trusted for a
/// partial result.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no trade history recorded for this key")]
    NotFound,

    #[error("the holdings service rejected the key")]
    Unauthorized,

    #[error("{service} is unavailable: {detail}")]
    Unavailable { service: &'static str, detail: String },

    #[error("{service} returned a malformed response: {detail}")]
    Malformed { service: &'static str, detail: String },
}

impl RefreshError {
    pub fn unavailable(service: &'static str, detail: impl ToString) -> Self {
        RefreshError::Unavailable {
            service,
            detail: detail.to_string(),
        }
    }

    pub fn malformed(service: &'static str, detail: impl ToString) -> Self {
        RefreshError::Malformed {
            service,
            detail: detail.to_string(),
        }
    }

    /// Whether a catalog/quote failure of this kind may be absorbed by
    /// degrading the affected symbols instead of failing the cycle.
    pub fn is_degradable(&self) -> bool {
        matches!(self, RefreshError::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RefreshError::NotFound.to_string(),
            "no trade history recorded for this key"
        );
        assert_eq!(
            RefreshError::unavailable("catalog service", "connection refused").to_string(),
            "catalog service is unavailable: connection refused"
        );
        assert_eq!(
            RefreshError::malformed("quote service", "missing field `usd`").to_string(),
            "quote service returned a malformed response: missing field `usd`"
        );
    }

    #[test]
    fn test_only_unavailable_is_degradable() {
        assert!(RefreshError::unavailable("quote service", "timeout").is_degradable());
        assert!(!RefreshError::malformed("quote service", "bad json").is_degradable());
        assert!(!RefreshError::NotFound.is_degradable());
        assert!(!RefreshError::Unauthorized.is_degradable());
    }
}
