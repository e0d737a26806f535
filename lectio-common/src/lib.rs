//! # Lectio Common Library
//!
//! Shared code for the lectio tools including:
//! - Error type shared by every crate in the workspace
//! - Configuration file discovery and TOML loading
//! - ISO date helpers for date windows

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
