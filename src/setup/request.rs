//! Setup request construction and validation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Database engines the cloud provider can provision.
pub const KNOWN_ENGINES: &[&str] = &["postgres"];

/// Immutable description of one project setup run.
///
/// Construct through [`SetupRequest::builder`]. Validation happens once, at
/// the start of the pipeline, before any external call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupRequest {
    /// Project name; must be valid simultaneously as a directory name, a git
    /// repository name and a cloud resource name.
    pub name: String,

    /// Template identifier resolved through the template store.
    pub template: String,

    /// Whether the source-control repository should be private.
    pub private: bool,

    /// Whether to create a source-control repository at all.
    pub create_repo: bool,

    /// Database engine to provision, or None to skip the database.
    pub database: Option<String>,

    /// Container image to deploy, or None to skip the container.
    pub container_image: Option<String>,

    /// Whether to provision an object storage bucket.
    pub create_bucket: bool,

    /// Whether to inject CI variables into the repository.
    pub ci_variables: bool,

    /// Target directory override. Defaults to `<projects root>/<name>`.
    pub target_dir: Option<PathBuf>,
}

impl SetupRequest {
    /// Start building a request with the defaults: private repository,
    /// postgres database, CI variables on, no container, no bucket.
    pub fn builder(name: impl Into<String>, template: impl Into<String>) -> SetupRequestBuilder {
        SetupRequestBuilder {
            request: SetupRequest {
                name: name.into(),
                template: template.into(),
                private: true,
                create_repo: true,
                database: Some("postgres".to_string()),
                container_image: None,
                create_bucket: false,
                ci_variables: true,
                target_dir: None,
            },
        }
    }

    /// Check name and flag consistency. Template existence is checked
    /// separately against the template store.
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        if let Some(engine) = &self.database {
            if !KNOWN_ENGINES.contains(&engine.as_str()) {
                return Err(format!(
                    "unknown database engine '{}' (available: {})",
                    engine,
                    KNOWN_ENGINES.join(", ")
                ));
            }
        }
        if self.ci_variables && !self.create_repo {
            return Err("CI variables require a repository; drop --no-repo or disable them".to_string());
        }
        if let Some(image) = &self.container_image {
            if image.trim().is_empty() {
                return Err("container image must not be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Check a resource or project name against the shared naming rules. Single
/// `create` commands hit this before talking to any API, the same way the
/// pipeline's validation stage does.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("project name must not be empty".to_string());
    }
    if !name_pattern().is_match(name) || name.ends_with('-') {
        return Err(format!(
            "invalid project name '{}': use lowercase letters, digits and inner hyphens, \
             starting with a letter, at most 63 characters",
            name
        ));
    }
    Ok(())
}

/// The intersection of filesystem, git and cloud resource naming rules.
fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]{0,62}$").expect("static pattern"))
}

/// Builder for [`SetupRequest`].
#[derive(Debug, Clone)]
pub struct SetupRequestBuilder {
    request: SetupRequest,
}

impl SetupRequestBuilder {
    /// Make the repository public.
    pub fn public(mut self) -> Self {
        self.request.private = false;
        self
    }

    /// Skip repository creation entirely.
    pub fn no_repo(mut self) -> Self {
        self.request.create_repo = false;
        self.request.ci_variables = false;
        self
    }

    /// Provision a database with the given engine.
    pub fn database(mut self, engine: impl Into<String>) -> Self {
        self.request.database = Some(engine.into());
        self
    }

    /// Skip database provisioning.
    pub fn no_database(mut self) -> Self {
        self.request.database = None;
        self
    }

    /// Provision a container running the given image.
    pub fn container(mut self, image: impl Into<String>) -> Self {
        self.request.container_image = Some(image.into());
        self
    }

    /// Provision an object storage bucket.
    pub fn bucket(mut self) -> Self {
        self.request.create_bucket = true;
        self
    }

    /// Do not inject CI variables.
    pub fn no_ci_variables(mut self) -> Self {
        self.request.ci_variables = false;
        self
    }

    /// Override the target directory.
    pub fn target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.request.target_dir = Some(dir.into());
        self
    }

    /// Finish building. Does not validate; the pipeline's first stage does.
    pub fn build(self) -> SetupRequest {
        self.request
    }
}
