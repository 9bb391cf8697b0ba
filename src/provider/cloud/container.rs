//! Serverless container provisioning.

use crate::config::CloudCredentials;
use crate::provider::cloud::CloudCli;
use crate::provider::{
    Provisioned, ProviderFailure, ResourceDescriptor, ResourceKind, ResourceParams,
    ResourceProvider, ResourceSpec,
};
use serde::Deserialize;

/// Provisions serverless containers through the cloud CLI.
pub struct ContainerProvider {
    cli: CloudCli,
}

#[derive(Debug, Deserialize)]
struct ContainerEntry {
    id: String,
    name: String,
}

impl ContainerProvider {
    pub fn new(cloud: CloudCredentials) -> Self {
        Self {
            cli: CloudCli::new(cloud),
        }
    }

    /// Build against a stub CLI binary. Used by tests.
    pub fn with_cli(cli: CloudCli) -> Self {
        Self { cli }
    }

    fn find_container(&self, name: &str) -> Result<Option<ContainerEntry>, ProviderFailure> {
        let containers: Vec<ContainerEntry> =
            self.cli.run_json(&["serverless", "container", "list"])?;
        Ok(containers.into_iter().find(|c| c.name == name))
    }
}

impl ResourceProvider for ContainerProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Container
    }

    fn create_or_get(&self, spec: &ResourceSpec) -> Result<Provisioned, ProviderFailure> {
        let image = match &spec.params {
            ResourceParams::Container { image } => image.clone(),
            other => {
                return Err(ProviderFailure::Transient {
                    message: format!("container provider given {} spec", other.kind()),
                })
            }
        };

        if let Some(existing) = self.find_container(&spec.name)? {
            tracing::info!("container {} already exists", spec.name);
            return Ok(Provisioned {
                descriptor: ResourceDescriptor::Container {
                    name: existing.name,
                    id: existing.id,
                    image,
                },
                already_existed: true,
            });
        }

        tracing::info!("creating container {} with image {}", spec.name, image);
        let created: ContainerEntry =
            self.cli
                .run_json(&["serverless", "container", "create", "--name", &spec.name])?;

        // The image goes live as the first revision; the container itself is
        // the durable resource recorded in the context.
        self.cli.run(&[
            "serverless",
            "container",
            "revision",
            "deploy",
            "--container-name",
            &spec.name,
            "--image",
            &image,
        ])?;

        Ok(Provisioned {
            descriptor: ResourceDescriptor::Container {
                name: created.name,
                id: created.id,
                image,
            },
            already_existed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_stub(script: &str) -> (tempfile::TempDir, ContainerProvider) {
        let temp = tempfile::TempDir::new().unwrap();
        let stub = temp.path().join("yc-stub");
        std::fs::write(&stub, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let cloud = CloudCredentials {
            oauth_token: "y0_test".into(),
            cloud_id: None,
            folder_id: None,
        };
        let cli = CloudCli::with_binary(cloud, stub.to_string_lossy().to_string());
        (temp, ContainerProvider::with_cli(cli))
    }

    fn spec(name: &str) -> ResourceSpec {
        ResourceSpec {
            name: name.into(),
            params: ResourceParams::Container {
                image: "cr.example/app:latest".into(),
            },
        }
    }

    #[test]
    fn existing_container_skips_creation() {
        let script = r#"#!/bin/sh
case "$3" in
  list) echo '[{"id":"cont-1","name":"demo1"}]' ;;
  *) echo 'ERROR: unexpected call' >&2; exit 1 ;;
esac
"#;
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1")).unwrap();

        assert!(result.already_existed);
        assert_eq!(result.descriptor.kind(), ResourceKind::Container);
    }

    #[test]
    fn creates_container_and_deploys_revision() {
        let script = r#"#!/bin/sh
case "$3" in
  list) echo '[]' ;;
  create) echo '{"id":"cont-2","name":"demo1"}' ;;
  revision) echo '{}' ;;
esac
"#;
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1")).unwrap();

        assert!(!result.already_existed);
        match result.descriptor {
            ResourceDescriptor::Container { id, image, .. } => {
                assert_eq!(id, "cont-2");
                assert_eq!(image, "cr.example/app:latest");
            }
            other => panic!("unexpected descriptor {:?}", other),
        }
    }
}
