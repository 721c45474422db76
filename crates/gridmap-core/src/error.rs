//! Unified error types for the gridmap crates
//!
//! [`GridError`] is the common error at API boundaries. Crate-specific error
//! types (such as the layout engine's) convert into it so callers can use `?`
//! across crates.
//!
//! # Example
//!
//! ```ignore
//! use gridmap_core::{GridResult, Network};
//!
//! fn load(path: &str) -> GridResult<Network> {
//!     let text = std::fs::read_to_string(path)?;
//!     Network::from_json(&text)
//! }
//! ```

use thiserror::Error;

/// Unified error type for gridmap operations.
#[derive(Error, Debug)]
pub enum GridError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network structure errors (dangling references, duplicate ids)
    #[error("Network error: {0}")]
    Network(String),

    /// Layout and geometry errors
    #[error("Layout error: {0}")]
    Layout(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GridError.
pub type GridResult<T> = Result<T, GridError>;

impl From<anyhow::Error> for GridError {
    fn from(err: anyhow::Error) -> Self {
        GridError::Other(err.to_string())
    }
}

impl From<String> for GridError {
    fn from(s: String) -> Self {
        GridError::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        GridError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Parse(err.to_string())
    }
}
