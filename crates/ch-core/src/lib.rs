//! # ch-core
//!
//! Core types, traits, and error handling for Combine Harvester.
//!
//! This crate provides:
//! - Common error types
//! - The [`Histogram`] value type shared by every record
//! - Collaborator traits ([`HistogramSource`], [`ModelObject`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod histogram;
pub mod traits;

pub use error::{Error, Result};
pub use histogram::Histogram;
pub use traits::{HistogramSource, ModelObject};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
