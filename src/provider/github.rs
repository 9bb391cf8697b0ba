//! GitHub resource provider.
//!
//! Implements [`ResourceProvider`] for source-control repositories and
//! [`SecretStore`] for Actions CI variables over the GitHub REST API. The
//! existence check before creation is what makes `create_or_get` safe to
//! retry.

use crate::config::GitHostCredentials;
use crate::provider::{
    Provisioned, ProviderFailure, ResourceDescriptor, ResourceKind, ResourceParams, ResourceProvider,
    ResourceSpec, SecretStore,
};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub REST provider for repositories and CI variables.
pub struct GitHubProvider {
    client: Client,
    credentials: GitHostCredentials,
    api_base: String,
}

/// Repository payload subset returned by the GitHub API.
#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    html_url: String,
    clone_url: String,
    #[serde(default = "default_branch")]
    default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

impl GitHubProvider {
    /// Create a provider against the public GitHub API.
    pub fn new(credentials: GitHostCredentials) -> Self {
        Self::with_api_base(credentials, DEFAULT_API_BASE)
    }

    /// Create a provider against a custom API base url. Used by tests.
    pub fn with_api_base(credentials: GitHostCredentials, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("groundwork")
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            credentials,
            api_base: api_base.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn get_repository(&self, name: &str) -> Result<Option<ResourceDescriptor>, ProviderFailure> {
        let url = self.url(&format!(
            "/repos/{}/{}",
            self.credentials.username, name
        ));
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.credentials.token)
            .send()
            .map_err(transient)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let repo: RepoResponse = response.json().map_err(transient)?;
                Ok(Some(descriptor_from(repo)))
            }
            status => Err(classify_status(status, &response_message(response))),
        }
    }

    fn create_repository(
        &self,
        name: &str,
        private: bool,
    ) -> Result<ResourceDescriptor, ProviderFailure> {
        let body = serde_json::json!({
            "name": name,
            "private": private,
            "description": format!("{} project", name),
            "auto_init": false,
        });

        let response = self
            .client
            .post(self.url("/user/repos"))
            .bearer_auth(&self.credentials.token)
            .json(&body)
            .send()
            .map_err(transient)?;

        let status = response.status();
        if status.is_success() {
            let repo: RepoResponse = response.json().map_err(transient)?;
            return Ok(descriptor_from(repo));
        }

        // 422 on create means the name is taken; the caller's existence check
        // raced with someone else creating it.
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(ProviderFailure::AlreadyExists {
                kind: ResourceKind::Repository,
                name: name.to_string(),
            });
        }

        Err(classify_status(status, &response_message(response)))
    }
}

impl ResourceProvider for GitHubProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Repository
    }

    fn create_or_get(&self, spec: &ResourceSpec) -> Result<Provisioned, ProviderFailure> {
        let private = match &spec.params {
            ResourceParams::Repository { private } => *private,
            other => {
                return Err(ProviderFailure::Transient {
                    message: format!("repository provider given {} spec", other.kind()),
                })
            }
        };

        if let Some(existing) = self.get_repository(&spec.name)? {
            tracing::info!("repository {} already exists", spec.name);
            return Ok(Provisioned {
                descriptor: existing,
                already_existed: true,
            });
        }

        tracing::info!(
            "creating {} repository {}",
            if private { "private" } else { "public" },
            spec.name
        );
        let descriptor = self.create_repository(&spec.name, private)?;
        Ok(Provisioned {
            descriptor,
            already_existed: false,
        })
    }
}

impl SecretStore for GitHubProvider {
    fn set_ci_variables(
        &self,
        repository: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<(), ProviderFailure> {
        let base = format!(
            "/repos/{}/{}/actions/variables",
            self.credentials.username, repository
        );

        for (name, value) in variables {
            let body = serde_json::json!({ "name": name, "value": value });
            let response = self
                .client
                .post(self.url(&base))
                .bearer_auth(&self.credentials.token)
                .json(&body)
                .send()
                .map_err(transient)?;

            let status = response.status();
            if status == StatusCode::CONFLICT {
                // Variable exists; overwrite it.
                let response = self
                    .client
                    .patch(self.url(&format!("{}/{}", base, name)))
                    .bearer_auth(&self.credentials.token)
                    .json(&serde_json::json!({ "name": name, "value": value }))
                    .send()
                    .map_err(transient)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(classify_status(status, &response_message(response)));
                }
            } else if !status.is_success() {
                return Err(classify_status(status, &response_message(response)));
            }
            tracing::debug!("set CI variable {} on {}", name, repository);
        }

        Ok(())
    }
}

fn descriptor_from(repo: RepoResponse) -> ResourceDescriptor {
    ResourceDescriptor::Repository {
        name: repo.name,
        url: repo.html_url,
        clone_url: repo.clone_url,
        default_branch: repo.default_branch,
    }
}

fn transient(e: reqwest::Error) -> ProviderFailure {
    ProviderFailure::Transient {
        message: e.to_string(),
    }
}

fn response_message(response: reqwest::blocking::Response) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }
    let status = response.status();
    response
        .json::<ApiError>()
        .map(|e| e.message)
        .unwrap_or_else(|_| format!("HTTP {}", status))
}

fn classify_status(status: StatusCode, message: &str) -> ProviderFailure {
    match status {
        StatusCode::UNAUTHORIZED => ProviderFailure::Auth {
            message: message.to_string(),
        },
        StatusCode::FORBIDDEN => ProviderFailure::QuotaOrPermission {
            message: message.to_string(),
        },
        _ => ProviderFailure::Transient {
            message: format!("{} ({})", message, status),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> GitHostCredentials {
        GitHostCredentials {
            token: "ghp_test".into(),
            username: "octocat".into(),
        }
    }

    #[test]
    fn url_joins_base_and_path() {
        let provider = GitHubProvider::with_api_base(credentials(), "http://localhost:1234");
        assert_eq!(
            provider.url("/user/repos"),
            "http://localhost:1234/user/repos"
        );
    }

    #[test]
    fn classify_unauthorized_as_auth() {
        let failure = classify_status(StatusCode::UNAUTHORIZED, "Bad credentials");
        assert!(matches!(failure, ProviderFailure::Auth { .. }));
        assert!(failure.is_fatal());
    }

    #[test]
    fn classify_forbidden_as_quota_or_permission() {
        let failure = classify_status(StatusCode::FORBIDDEN, "rate limited");
        assert!(matches!(failure, ProviderFailure::QuotaOrPermission { .. }));
    }

    #[test]
    fn classify_server_error_as_transient() {
        let failure = classify_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(failure, ProviderFailure::Transient { .. }));
    }

    #[test]
    fn repo_response_defaults_branch() {
        let repo: RepoResponse = serde_json::from_str(
            r#"{"name":"demo1","html_url":"https://github.com/octocat/demo1","clone_url":"https://github.com/octocat/demo1.git"}"#,
        )
        .unwrap();
        assert_eq!(repo.default_branch, "main");
    }

    #[test]
    fn provider_kind_is_repository() {
        let provider = GitHubProvider::new(credentials());
        assert_eq!(provider.kind(), ResourceKind::Repository);
    }
}
