//! Cloud resource providers backed by the `yc` command-line tool.
//!
//! Managed databases, serverless containers and storage buckets are
//! provisioned by shelling out to the cloud CLI with `--format json` and
//! parsing its output. Each provider lists before creating, which is what
//! makes `create_or_get` idempotent.

pub mod bucket;
pub mod container;
pub mod database;

pub use bucket::BucketProvider;
pub use container::ContainerProvider;
pub use database::DatabaseProvider;

use crate::config::CloudCredentials;
use crate::provider::ProviderFailure;
use crate::shell::{self, CommandOptions};
use serde::de::DeserializeOwned;

/// Name of the cloud CLI binary.
pub const CLOUD_CLI: &str = "yc";

/// Thin wrapper around the cloud CLI carrying account credentials.
///
/// The CLI binary can be overridden for tests via `with_binary`.
#[derive(Debug, Clone)]
pub struct CloudCli {
    binary: String,
    credentials: CloudCredentials,
}

impl CloudCli {
    pub fn new(credentials: CloudCredentials) -> Self {
        Self {
            binary: CLOUD_CLI.to_string(),
            credentials,
        }
    }

    /// Use a different binary (a stub script in tests).
    pub fn with_binary(credentials: CloudCredentials, binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            credentials,
        }
    }

    /// Run a CLI subcommand and parse its JSON output.
    pub fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, ProviderFailure> {
        let result = self.run(args)?;
        serde_json::from_str(&result).map_err(|e| ProviderFailure::Transient {
            message: format!("unparseable {} output: {}", self.binary, e),
        })
    }

    /// Run a CLI subcommand, returning stdout on success.
    pub fn run(&self, args: &[&str]) -> Result<String, ProviderFailure> {
        let mut options = CommandOptions::default();
        options
            .env
            .insert("YC_TOKEN".to_string(), self.credentials.oauth_token.clone());
        if let Some(cloud_id) = &self.credentials.cloud_id {
            options
                .env
                .insert("YC_CLOUD_ID".to_string(), cloud_id.clone());
        }
        if let Some(folder_id) = &self.credentials.folder_id {
            options
                .env
                .insert("YC_FOLDER_ID".to_string(), folder_id.clone());
        }

        let mut full_args: Vec<&str> = args.to_vec();
        full_args.extend_from_slice(&["--format", "json"]);

        let result =
            shell::execute(&self.binary, &full_args, &options).map_err(|e| {
                ProviderFailure::Transient {
                    message: format!("{} not runnable: {}", self.binary, e),
                }
            })?;

        if result.success {
            Ok(result.stdout)
        } else {
            Err(classify_cli_failure(&result.error_line()))
        }
    }
}

/// Map a CLI error line onto the provider failure taxonomy.
pub fn classify_cli_failure(stderr_line: &str) -> ProviderFailure {
    let lower = stderr_line.to_lowercase();
    if lower.contains("unauthenticated")
        || lower.contains("oauth token")
        || lower.contains("invalid token")
    {
        ProviderFailure::Auth {
            message: stderr_line.to_string(),
        }
    } else if lower.contains("permission denied")
        || lower.contains("quota")
        || lower.contains("forbidden")
    {
        ProviderFailure::QuotaOrPermission {
            message: stderr_line.to_string(),
        }
    } else {
        ProviderFailure::Transient {
            message: stderr_line.to_string(),
        }
    }
}
