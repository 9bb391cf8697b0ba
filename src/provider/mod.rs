//! Resource provider capability interfaces.
//!
//! Each kind of external resource (source-control repository, managed
//! database, container, storage bucket) is provisioned through one
//! [`ResourceProvider`] implementation exposing a single idempotent
//! `create_or_get` operation. Providers are registered in an explicit
//! kind-to-implementation map at orchestrator construction; there is no
//! dynamic discovery.
//!
//! Descriptors carry identifying fields only — connection parameters, urls,
//! names — never raw secret material. A database descriptor references its
//! credentials by store key (`credentials_ref`), resolved at the point of
//! use.

pub mod cloud;
pub mod github;
pub mod local_git;

pub use cloud::bucket::BucketProvider;
pub use cloud::container::ContainerProvider;
pub use cloud::database::DatabaseProvider;
pub use github::GitHubProvider;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default size cap for provisioned buckets (1 GiB).
pub const DEFAULT_BUCKET_MAX_SIZE_BYTES: u64 = 1_073_741_824;

/// A category of external provisioned entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Repository,
    Database,
    Container,
    Bucket,
}

impl ResourceKind {
    /// All kinds in canonical provisioning order.
    pub fn all() -> [ResourceKind; 4] {
        [
            ResourceKind::Repository,
            ResourceKind::Database,
            ResourceKind::Container,
            ResourceKind::Bucket,
        ]
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Repository => "repository",
            ResourceKind::Database => "database",
            ResourceKind::Container => "container",
            ResourceKind::Bucket => "bucket",
        };
        write!(f, "{}", s)
    }
}

/// Identifying fields of a provisioned resource.
///
/// Secrets are referenced by credential-store key, never embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceDescriptor {
    Repository {
        name: String,
        url: String,
        clone_url: String,
        default_branch: String,
    },
    Database {
        name: String,
        engine: String,
        host: String,
        port: u16,
        /// Credential-store key of the admin bundle used to connect.
        credentials_ref: String,
    },
    Container {
        name: String,
        id: String,
        image: String,
    },
    Bucket {
        name: String,
        endpoint: String,
    },
}

impl ResourceDescriptor {
    /// The kind tag of this descriptor.
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDescriptor::Repository { .. } => ResourceKind::Repository,
            ResourceDescriptor::Database { .. } => ResourceKind::Database,
            ResourceDescriptor::Container { .. } => ResourceKind::Container,
            ResourceDescriptor::Bucket { .. } => ResourceKind::Bucket,
        }
    }

    /// The resource's own name.
    pub fn name(&self) -> &str {
        match self {
            ResourceDescriptor::Repository { name, .. }
            | ResourceDescriptor::Database { name, .. }
            | ResourceDescriptor::Container { name, .. }
            | ResourceDescriptor::Bucket { name, .. } => name,
        }
    }

    /// One-line human summary for logs and reports.
    pub fn summary(&self) -> String {
        match self {
            ResourceDescriptor::Repository { url, .. } => format!("repository {}", url),
            ResourceDescriptor::Database {
                name, host, port, ..
            } => format!("database {} at {}:{}", name, host, port),
            ResourceDescriptor::Container { name, image, .. } => {
                format!("container {} ({})", name, image)
            }
            ResourceDescriptor::Bucket { name, endpoint } => {
                format!("bucket {} at {}", name, endpoint)
            }
        }
    }
}

/// Specification handed to a provider's `create_or_get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Resource name; validated upstream to satisfy all naming constraints.
    pub name: String,
    /// Kind-specific parameters.
    pub params: ResourceParams,
}

/// Kind-specific creation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceParams {
    Repository { private: bool },
    Database { engine: String },
    Container { image: String },
    Bucket { max_size_bytes: u64 },
}

impl ResourceParams {
    /// The kind this parameter set belongs to.
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceParams::Repository { .. } => ResourceKind::Repository,
            ResourceParams::Database { .. } => ResourceKind::Database,
            ResourceParams::Container { .. } => ResourceKind::Container,
            ResourceParams::Bucket { .. } => ResourceKind::Bucket,
        }
    }
}

/// Result of an idempotent create-or-get call.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub descriptor: ResourceDescriptor,
    /// True when the resource already existed and nothing was created.
    pub already_existed: bool,
}

/// Classified provider failure.
///
/// `AlreadyExists` is not an error in the pipeline: it signals idempotent
/// convergence when a provider cannot return the existing resource itself.
#[derive(Debug, Clone, Error)]
pub enum ProviderFailure {
    /// The resource exists but the provider could not fetch its descriptor.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    /// Authentication or authorization against the provider failed.
    /// Fatal: after this, no later provider call can succeed either.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// A retryable failure (network error, service unavailable, timeout).
    #[error("transient failure: {message}")]
    Transient { message: String },

    /// Quota exceeded or missing permission for this specific resource.
    #[error("quota or permission failure: {message}")]
    QuotaOrPermission { message: String },
}

impl ProviderFailure {
    /// Whether this failure invalidates the rest of the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderFailure::Auth { .. })
    }
}

/// Idempotent create-or-get over one resource kind.
///
/// Contract: calling twice with the same spec either returns the existing
/// resource unchanged (`already_existed = true`) or creates exactly one.
pub trait ResourceProvider: Send + Sync {
    /// The resource kind this provider handles.
    fn kind(&self) -> ResourceKind;

    /// Create the resource or return the existing one.
    fn create_or_get(&self, spec: &ResourceSpec) -> Result<Provisioned, ProviderFailure>;
}

/// Injection of CI variables into a created repository.
pub trait SecretStore: Send + Sync {
    /// Set the given variables on the repository, overwriting existing values.
    fn set_ci_variables(
        &self,
        repository: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<(), ProviderFailure>;
}
