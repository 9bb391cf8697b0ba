//! Groundwork - project scaffolding and infrastructure provisioning automation.
//!
//! Groundwork takes a target stack (for example Django + PostgreSQL + React),
//! creates a source-control repository, provisions cloud resources, copies a
//! template's boilerplate into a local directory and runs template-specific
//! post-setup steps.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Credential and configuration lookup
//! - [`error`] - Error types and result alias
//! - [`provider`] - Resource provider capability interfaces and implementations
//! - [`secrets`] - Secret masking for logs and command output
//! - [`setup`] - The setup orchestrator, context and report types
//! - [`shell`] - Shell command execution
//! - [`template`] - Template resolution, materialization and post-setup hooks
//! - [`ui`] - Terminal output helpers
//!
//! # Example
//!
//! ```no_run
//! use groundwork::setup::{Orchestrator, SetupRequest};
//! use groundwork::config::EnvCredentials;
//! use groundwork::template::BuiltinTemplates;
//! use std::sync::Arc;
//!
//! let credentials = Arc::new(EnvCredentials::from_env());
//! let orchestrator = Orchestrator::new(Box::new(BuiltinTemplates::new()), credentials);
//! let request = SetupRequest::builder("demo1", "webapp").build();
//! let report = orchestrator.run(request, None);
//! println!("{}", report.status);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod provider;
pub mod secrets;
pub mod setup;
pub mod shell;
pub mod template;
pub mod ui;

pub use error::{GroundworkError, Result};
