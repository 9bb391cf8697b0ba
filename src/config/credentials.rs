//! Credential store and typed credential bundles.
//!
//! The orchestrator and providers never hold raw secret material; resource
//! descriptors carry a key name (a "credentials reference") and resolve it
//! through [`CredentialStore::lookup`] at the point of use. The store itself
//! is immutable after construction so it can be shared across concurrent
//! setup runs.

use crate::config::env_file::EnvFileParser;
use crate::error::{GroundworkError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the `.env` file location.
pub const ENV_FILE_VAR: &str = "GROUNDWORK_ENV_FILE";

/// Read-only key/value credential lookup.
///
/// Must be thread-safe: a server-hosted variant may run several setups
/// concurrently against one shared store.
pub trait CredentialStore: Send + Sync {
    /// Look up a configuration value by key.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Look up a value, failing with a configuration error if absent.
    fn require(&self, key: &str) -> Result<String> {
        self.lookup(key).ok_or_else(|| {
            GroundworkError::config(format!("{} is required. Set it in .env or the environment.", key))
        })
    }
}

/// Git hosting credentials (token plus account name).
#[derive(Debug, Clone)]
pub struct GitHostCredentials {
    pub token: String,
    pub username: String,
}

impl GitHostCredentials {
    /// Resolve from a credential store.
    pub fn from_store(store: &dyn CredentialStore) -> Result<Self> {
        Ok(Self {
            token: store.require("GITHUB_API_TOKEN")?,
            username: store.require("GITHUB_USERNAME")?,
        })
    }
}

/// Cloud account credentials.
#[derive(Debug, Clone)]
pub struct CloudCredentials {
    pub oauth_token: String,
    pub cloud_id: Option<String>,
    pub folder_id: Option<String>,
}

impl CloudCredentials {
    /// Resolve from a credential store. Cloud and folder ids are optional;
    /// the cloud CLI falls back to its own profile when they are absent.
    pub fn from_store(store: &dyn CredentialStore) -> Result<Self> {
        let oauth_token = store.require("YC_OAUTH_TOKEN")?;
        let cloud_id = store.lookup("YC_CLOUD_ID");
        let folder_id = store.lookup("YC_FOLDER_ID");
        if cloud_id.is_none() {
            tracing::warn!("YC_CLOUD_ID not set; relying on the cloud CLI profile");
        }
        Ok(Self {
            oauth_token,
            cloud_id,
            folder_id,
        })
    }
}

/// Database admin credentials used when provisioning managed databases.
#[derive(Debug, Clone)]
pub struct DbAdminCredentials {
    pub username: String,
    pub password: String,
}

impl DbAdminCredentials {
    /// Resolve from a credential store.
    pub fn from_store(store: &dyn CredentialStore) -> Result<Self> {
        Ok(Self {
            username: store.require("DB_ADMIN_USERNAME")?,
            password: store.require("DB_ADMIN_PASSWORD")?,
        })
    }
}

/// Credential store backed by a `.env` file layered under the process
/// environment. Process environment wins on conflicts.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    values: HashMap<String, String>,
}

impl EnvCredentials {
    /// Load from the default `.env` location (or `GROUNDWORK_ENV_FILE`),
    /// overlaid with the current process environment.
    pub fn from_env() -> Self {
        let env_file = std::env::var(ENV_FILE_VAR).unwrap_or_else(|_| ".env".to_string());
        Self::from_env_file(Path::new(&env_file))
    }

    /// Load from a specific `.env` file, overlaid with the process environment.
    pub fn from_env_file(path: &Path) -> Self {
        let mut values = match EnvFileParser::load_optional(path) {
            Ok(vars) => vars,
            Err(e) => {
                tracing::warn!("failed to read {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        values.extend(std::env::vars());
        Self { values }
    }

    /// Build directly from a map. Used by tests and embedding callers.
    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// The directory new projects are created under.
    ///
    /// Defaults to `~/projects` when `PROJECTS_ROOT_DIR` is not set.
    pub fn projects_root(&self) -> PathBuf {
        match self.lookup("PROJECTS_ROOT_DIR") {
            Some(dir) => expand_home(&dir),
            None => home_dir().join("projects"),
        }
    }
}

impl CredentialStore for EnvCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}
