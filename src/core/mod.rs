//! Core reconciliation logic and collaborator abstractions

pub mod catalog;
pub mod config;
pub mod error;
pub mod holdings;
pub mod log;
pub mod matcher;
pub mod metrics;
pub mod normalize;
pub mod refresh;
pub mod valuation;

// Re-export main types for cleaner imports
pub use catalog::{CatalogEntry, CatalogProvider, PriceQuote, QuoteProvider};
pub use error::RefreshError;
pub use holdings::{AssetHolding, HoldingsProvider, HoldingsSnapshot, Trade, TradeAggregate};
pub use matcher::MatchedQuote;
pub use refresh::{ValuationReport, refresh_valuation};
pub use valuation::{ReconcileSettings, ValuationRecord, reconcile};
