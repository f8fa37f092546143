#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use ncf_patch_core::AppError;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Engine or plan error.
    #[display("{_0}")]
    Core(AppError),

    /// Report serialization failure.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// General failure message.
    #[display("Operation failed: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
///
/// `General(String)` holds no source error, so `derive(Error)` does not fit.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
