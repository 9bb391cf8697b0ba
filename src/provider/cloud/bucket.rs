//! Object storage bucket provisioning.

use crate::config::CloudCredentials;
use crate::provider::cloud::CloudCli;
use crate::provider::{
    Provisioned, ProviderFailure, ResourceDescriptor, ResourceKind, ResourceParams,
    ResourceProvider, ResourceSpec,
};
use serde::Deserialize;

/// Public endpoint of the object storage service.
const STORAGE_ENDPOINT: &str = "storage.yandexcloud.net";

/// Provisions storage buckets for static files through the cloud CLI.
pub struct BucketProvider {
    cli: CloudCli,
}

#[derive(Debug, Deserialize)]
struct BucketEntry {
    name: String,
}

impl BucketProvider {
    pub fn new(cloud: CloudCredentials) -> Self {
        Self {
            cli: CloudCli::new(cloud),
        }
    }

    /// Build against a stub CLI binary. Used by tests.
    pub fn with_cli(cli: CloudCli) -> Self {
        Self { cli }
    }

    fn bucket_exists(&self, name: &str) -> Result<bool, ProviderFailure> {
        let buckets: Vec<BucketEntry> = self.cli.run_json(&["storage", "bucket", "list"])?;
        Ok(buckets.iter().any(|b| b.name == name))
    }

    fn descriptor(&self, name: &str) -> ResourceDescriptor {
        ResourceDescriptor::Bucket {
            name: name.to_string(),
            endpoint: STORAGE_ENDPOINT.to_string(),
        }
    }
}

impl ResourceProvider for BucketProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Bucket
    }

    fn create_or_get(&self, spec: &ResourceSpec) -> Result<Provisioned, ProviderFailure> {
        let max_size = match &spec.params {
            ResourceParams::Bucket { max_size_bytes } => *max_size_bytes,
            other => {
                return Err(ProviderFailure::Transient {
                    message: format!("bucket provider given {} spec", other.kind()),
                })
            }
        };

        if self.bucket_exists(&spec.name)? {
            tracing::info!("bucket {} already exists", spec.name);
            return Ok(Provisioned {
                descriptor: self.descriptor(&spec.name),
                already_existed: true,
            });
        }

        tracing::info!("creating bucket {}", spec.name);
        let max_size_arg = max_size.to_string();
        self.cli.run(&[
            "storage",
            "bucket",
            "create",
            "--name",
            &spec.name,
            "--max-size",
            &max_size_arg,
        ])?;

        Ok(Provisioned {
            descriptor: self.descriptor(&spec.name),
            already_existed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_stub(script: &str) -> (tempfile::TempDir, BucketProvider) {
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
        (temp, BucketProvider::with_cli(cli))
    }

    fn spec(name: &str) -> ResourceSpec {
        ResourceSpec {
            name: name.into(),
            params: ResourceParams::Bucket {
                max_size_bytes: 1_073_741_824,
            },
        }
    }

    #[test]
    fn existing_bucket_skips_creation() {
        let script = r#"#!/bin/sh
case "$3" in
  list) echo '[{"name":"demo1"}]' ;;
  create) echo 'ERROR: create should not be called' >&2; exit 1 ;;
esac
"#;
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1")).unwrap();

        assert!(result.already_existed);
        assert_eq!(result.descriptor.kind(), ResourceKind::Bucket);
    }

    #[test]
    fn missing_bucket_is_created_with_max_size() {
        let script = r#"#!/bin/sh
case "$3" in
  list) echo '[]' ;;
  create)
    # create must receive the size cap
    echo "$@" | grep -q -- '--max-size 1073741824' || { echo 'ERROR: no max size' >&2; exit 1; }
    echo '{}'
    ;;
esac
"#;
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1")).unwrap();

        assert!(!result.already_existed);
        match result.descriptor {
            ResourceDescriptor::Bucket { name, endpoint } => {
                assert_eq!(name, "demo1");
                assert_eq!(endpoint, STORAGE_ENDPOINT);
            }
            other => panic!("unexpected descriptor {:?}", other),
        }
    }
}
