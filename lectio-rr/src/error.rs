//! Error types for lectio-rr
//!
//! Only strict-mode missing slots fail a resolution. Configuration and
//! override-file errors fail startup. Fetch failures never leave the adapter
//! layer (see `adapters::http::FetchError`).

use crate::types::Slot;
use chrono::NaiveDate;
use thiserror::Error;

/// Resolver error type
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Strict mode: a required slot is empty after overrides
    #[error("{date}: required slot(s) missing: {}", format_slots(.slots))]
    MissingRequiredSlots { date: NaiveDate, slots: Vec<Slot> },

    /// Invalid resolver configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Override file unreadable or malformed
    #[error("Override file error: {0}")]
    Overrides(String),

    /// lectio-common error
    #[error("Common error: {0}")]
    Common(#[from] lectio_common::Error),
}

fn format_slots(slots: &[Slot]) -> String {
    slots
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, ResolveError>;
