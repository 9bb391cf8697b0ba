//! Error types for Groundwork operations.
//!
//! This module defines [`GroundworkError`], the umbrella error type used at
//! the CLI boundary, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - The orchestrator never propagates errors across stage boundaries: each
//!   pipeline step normalizes its errors into a typed step outcome
//!   ([`crate::setup::StepOutcome`]).
//! - Domain-specific failure taxonomies live next to their collaborators:
//!   [`crate::provider::ProviderFailure`], [`crate::template::TemplateError`]
//!   and [`crate::template::HookFailure`].
//! - `GroundworkError` wraps those for one-shot CLI commands and interop.

use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderFailure;
use crate::template::{HookFailure, TemplateError};

/// Core error type for Groundwork operations.
#[derive(Debug, Error)]
pub enum GroundworkError {
    /// Setup request was malformed (bad name, unknown template, conflicting flags).
    #[error("Invalid setup request: {message}")]
    Validation { message: String },

    /// A required credential or configuration key is missing.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A resource provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderFailure),

    /// Template resolution failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A template post-setup hook failed.
    #[error(transparent)]
    Hook(#[from] HookFailure),

    /// Template materialization or other filesystem operation failed.
    #[error("IO error at {path}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GroundworkError {
    /// Shorthand for a validation error with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a configuration error with a formatted message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias for Groundwork operations.
pub type Result<T> = std::result::Result<T, GroundworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_message() {
        let err = GroundworkError::validation("empty project name");
        assert!(err.to_string().contains("empty project name"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = GroundworkError::config("GITHUB_API_TOKEN is required");
        assert!(err.to_string().contains("GITHUB_API_TOKEN"));
    }

    #[test]
    fn path_io_error_displays_path() {
        let err = GroundworkError::PathIo {
            path: PathBuf::from("/target/demo1"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/target/demo1"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: GroundworkError = io_err.into();
        assert!(matches!(err, GroundworkError::Io(_)));
    }

    #[test]
    fn provider_failure_converts() {
        let failure = ProviderFailure::Transient {
            message: "connection reset".into(),
        };
        let err: GroundworkError = failure.into();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(GroundworkError::validation("test"))
        }
        assert!(returns_error().is_err());
    }
}
