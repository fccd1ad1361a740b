//! Error types for the dwellglow core crate.
//!
//! This module provides error handling using [`thiserror`] for automatic
//! `Display` and `Error` trait implementations.

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error type for configuration and validation failures in the core crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },

    /// Validation error for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
