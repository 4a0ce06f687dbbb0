//! # hm-core
//!
//! Core types and error handling for HistoMap.
//!
//! This crate provides:
//! - The common error type
//! - `UFloat`, a value carrying a standard deviation with linear error propagation
//! - `IdentityHash`, the opaque cache key attached to histograms
//! - Rounding helpers used to canonicalize states for comparison
//! - Identifier validation shared by maps and binning axes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod names;
pub mod numerical;
pub mod types;

pub use error::{Error, Result};
pub use names::{is_valid_name, validate_name};
pub use numerical::{HASH_SIGFIGS, round_sigfigs};
pub use types::{IdentityHash, UFloat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
