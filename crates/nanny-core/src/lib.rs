//! Core types, configuration, thresholds, and error handling for diff-nanny.
//!
//! This crate provides the shared foundation used by the other crates:
//! - [`NannyError`]: unified error type using `thiserror`
//! - [`NannyConfig`]: configuration loaded from `.diffnanny.toml`
//! - [`Limits`] / [`LimitStatus`]: the threshold evaluator
//! - Shared types: [`DiffTotals`], [`DiffReport`], [`OutputFormat`]

mod config;
mod error;
mod threshold;
mod types;

pub use config::{ConfigOverrides, NannyConfig, CONFIG_FILE_NAME};
pub use error::NannyError;
pub use threshold::{Limit, LimitStatus, Limits};
pub use types::{DiffReport, DiffTotals, OutputFormat};

/// A convenience `Result` type for diff-nanny operations.
pub type Result<T> = std::result::Result<T, NannyError>;
