//! Template resolution, materialization and post-setup hooks.
//!
//! A template is a directory of boilerplate files plus an optional post-setup
//! hook. Resolution maps a template identifier to a [`TemplateHandle`];
//! materialization copies the file tree verbatim into the target directory —
//! any parameterization happens inside the hook, which runs after the copy
//! with access to the fully populated setup context.

pub mod builtin;
pub mod environment;
pub mod hooks;
pub mod materialize;

pub use builtin::BuiltinTemplates;
pub use hooks::{ChatbotHook, LandingHook, WebappHook};
pub use materialize::materialize;

use crate::setup::SetupContext;
use include_dir::Dir;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Template resolution failure.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Referenced template does not exist.
    #[error("Unknown template: {id}")]
    Unknown { id: String },

    /// Template files could not be read or copied.
    #[error("Template IO error: {message}")]
    Io { message: String },
}

/// A template post-setup hook failure. Confined to the hook stage; resources
/// provisioned earlier stay recorded in the context.
#[derive(Debug, Error)]
pub enum HookFailure {
    /// A setup command exited non-zero.
    #[error("'{command}' failed: {message}")]
    Command { command: String, message: String },

    /// A required tool is not installed.
    #[error("'{tool}' not found. Is it installed and on PATH?")]
    MissingTool { tool: String },

    /// Filesystem access inside the project directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The file tree backing a template.
#[derive(Debug, Clone)]
pub enum TemplateFiles {
    /// Compile-time embedded tree.
    Embedded(&'static Dir<'static>),
    /// On-disk tree (user-provided template directories).
    OnDisk(PathBuf),
}

/// A resolved template: boilerplate files plus an optional post-setup hook.
#[derive(Clone)]
pub struct TemplateHandle {
    /// The template identifier this handle was resolved from.
    pub id: String,
    /// Boilerplate file tree, copied verbatim by [`materialize`].
    pub files: TemplateFiles,
    /// Optional post-setup hook, invoked after all provisioning stages.
    pub hook: Option<Arc<dyn TemplateHook>>,
}

impl std::fmt::Debug for TemplateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateHandle")
            .field("id", &self.id)
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}

/// Template-specific post-setup behavior.
///
/// Runs with the fully populated setup context after materialization and
/// provisioning. May return a resolved resource name (by convention the final
/// database name), which the orchestrator merges into the context outputs.
pub trait TemplateHook: Send + Sync {
    fn run(&self, ctx: &mut SetupContext) -> Result<Option<String>, HookFailure>;
}

/// Resolves template identifiers to handles.
pub trait TemplateStore: Send + Sync {
    /// Resolve a template identifier.
    fn resolve(&self, id: &str) -> Result<TemplateHandle, TemplateError>;

    /// Identifiers of every available template.
    fn template_ids(&self) -> Vec<String>;

    /// Whether a template exists. Used by request validation.
    fn contains(&self, id: &str) -> bool {
        self.template_ids().iter().any(|t| t == id)
    }
}
