//! lectio-rr library interface
//!
//! Multi-source liturgical reference resolver: for a calendar date, scrape
//! several lectionary providers and reconcile their citations into one value
//! per reading slot (`first`, `second`, `psalm`, `gospel`).
//!
//! Exposes public APIs for the binary and for integration testing.

pub mod adapters;
pub mod canonical;
pub mod config;
pub mod error;
pub mod grammar;
pub mod overrides;
pub mod reconciler;
pub mod resolver;
pub mod types;
pub mod validator;

pub use crate::adapters::SourceAdapter;
pub use crate::config::{AppConfig, ResolverConfig};
pub use crate::error::{ResolveError, Result};
pub use crate::overrides::{OverrideRecord, OverrideStore};
pub use crate::resolver::Resolver;
pub use crate::types::{Candidate, CitationClass, ResolutionResult, Slot, SlotOutcome};
