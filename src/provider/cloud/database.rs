//! Managed PostgreSQL database provisioning.

use crate::config::{CloudCredentials, CredentialStore, DbAdminCredentials};
use crate::provider::cloud::CloudCli;
use crate::provider::{
    Provisioned, ProviderFailure, ResourceDescriptor, ResourceKind, ResourceParams,
    ResourceProvider, ResourceSpec,
};
use serde::Deserialize;
use std::sync::Arc;

/// Managed database port used by the cloud's connection pooler.
const DATABASE_PORT: u16 = 6432;

/// Credential-store key recorded on database descriptors. The real password
/// is resolved through the store at the point of use, never embedded.
pub const DB_ADMIN_CREDENTIALS_REF: &str = "DB_ADMIN_PASSWORD";

/// Provisions managed database clusters through the cloud CLI.
pub struct DatabaseProvider {
    cli: CloudCli,
    credentials: Arc<dyn CredentialStore>,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    id: String,
    name: String,
}

impl DatabaseProvider {
    pub fn new(cloud: CloudCredentials, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            cli: CloudCli::new(cloud),
            credentials,
        }
    }

    /// Build against a stub CLI binary. Used by tests.
    pub fn with_cli(cli: CloudCli, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { cli, credentials }
    }

    fn find_cluster(&self, name: &str) -> Result<Option<ClusterEntry>, ProviderFailure> {
        let clusters: Vec<ClusterEntry> =
            self.cli.run_json(&["managed-postgresql", "cluster", "list"])?;
        Ok(clusters.into_iter().find(|c| c.name == name))
    }

    fn create_cluster(
        &self,
        name: &str,
        admin: &DbAdminCredentials,
    ) -> Result<ClusterEntry, ProviderFailure> {
        let user_arg = format!("name={},password={}", admin.username, admin.password);
        let db_arg = format!("name={},owner={}", name, admin.username);
        let created: ClusterEntry = self.cli.run_json(&[
            "managed-postgresql",
            "cluster",
            "create",
            "--name",
            name,
            "--environment",
            "production",
            "--network-name",
            "default",
            "--user",
            &user_arg,
            "--database",
            &db_arg,
            "--resource-preset",
            "s2.micro",
            "--disk-size",
            "10",
        ])?;
        Ok(created)
    }

    fn descriptor(&self, cluster: &ClusterEntry, engine: &str) -> ResourceDescriptor {
        ResourceDescriptor::Database {
            name: cluster.name.clone(),
            engine: engine.to_string(),
            host: format!("c-{}.rw.mdb.yandexcloud.net", cluster.id),
            port: DATABASE_PORT,
            credentials_ref: DB_ADMIN_CREDENTIALS_REF.to_string(),
        }
    }
}

impl ResourceProvider for DatabaseProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Database
    }

    fn create_or_get(&self, spec: &ResourceSpec) -> Result<Provisioned, ProviderFailure> {
        let engine = match &spec.params {
            ResourceParams::Database { engine } => engine.clone(),
            other => {
                return Err(ProviderFailure::Transient {
                    message: format!("database provider given {} spec", other.kind()),
                })
            }
        };

        if engine != "postgres" {
            return Err(ProviderFailure::QuotaOrPermission {
                message: format!("unsupported database engine: {}", engine),
            });
        }

        if let Some(existing) = self.find_cluster(&spec.name)? {
            tracing::info!("database cluster {} already exists", spec.name);
            return Ok(Provisioned {
                descriptor: self.descriptor(&existing, &engine),
                already_existed: true,
            });
        }

        let admin = DbAdminCredentials::from_store(self.credentials.as_ref()).map_err(|e| {
            ProviderFailure::Auth {
                message: e.to_string(),
            }
        })?;

        tracing::info!("creating database cluster {}", spec.name);
        let created = self.create_cluster(&spec.name, &admin)?;
        Ok(Provisioned {
            descriptor: self.descriptor(&created, &engine),
            already_existed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvCredentials;

    fn provider_with_stub(script: &str) -> (tempfile::TempDir, DatabaseProvider) {
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
        let store = Arc::new(EnvCredentials::from_map(
            [
                ("DB_ADMIN_USERNAME".to_string(), "admin".to_string()),
                ("DB_ADMIN_PASSWORD".to_string(), "pw".to_string()),
            ]
            .into_iter()
            .collect(),
        ));
        let cli = CloudCli::with_binary(cloud, stub.to_string_lossy().to_string());
        (temp, DatabaseProvider::with_cli(cli, store))
    }

    fn spec(name: &str, engine: &str) -> ResourceSpec {
        ResourceSpec {
            name: name.into(),
            params: ResourceParams::Database {
                engine: engine.into(),
            },
        }
    }

    #[test]
    fn existing_cluster_is_returned_without_create() {
        // Stub fails loudly if asked to create.
        let script = r#"#!/bin/sh
case "$3" in
  list) echo '[{"id":"abc123","name":"demo1"}]' ;;
  create) echo 'ERROR: create should not be called' >&2; exit 1 ;;
esac
"#;
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1", "postgres")).unwrap();

        assert!(result.already_existed);
        match result.descriptor {
            ResourceDescriptor::Database { host, port, .. } => {
                assert_eq!(host, "c-abc123.rw.mdb.yandexcloud.net");
                assert_eq!(port, 6432);
            }
            other => panic!("unexpected descriptor {:?}", other),
        }
    }

    #[test]
    fn missing_cluster_is_created() {
        let script = r#"#!/bin/sh
case "$3" in
  list) echo '[]' ;;
  create) echo '{"id":"new456","name":"demo1"}' ;;
esac
"#;
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1", "postgres")).unwrap();

        assert!(!result.already_existed);
        assert_eq!(result.descriptor.name(), "demo1");
    }

    #[test]
    fn descriptor_references_credentials_by_name() {
        let script = "#!/bin/sh\necho '[{\"id\":\"abc\",\"name\":\"demo1\"}]'\n";
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1", "postgres")).unwrap();

        match result.descriptor {
            ResourceDescriptor::Database {
                credentials_ref, ..
            } => assert_eq!(credentials_ref, DB_ADMIN_CREDENTIALS_REF),
            other => panic!("unexpected descriptor {:?}", other),
        }
    }

    #[test]
    fn unsupported_engine_is_rejected() {
        let script = "#!/bin/sh\necho '[]'\n";
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1", "mysql"));
        assert!(matches!(
            result,
            Err(ProviderFailure::QuotaOrPermission { .. })
        ));
    }

    #[test]
    fn cli_auth_error_is_classified() {
        let script = "#!/bin/sh\necho 'ERROR: rpc error: code = Unauthenticated' >&2\nexit 1\n";
        let (_temp, provider) = provider_with_stub(script);

        let result = provider.create_or_get(&spec("demo1", "postgres"));
        assert!(matches!(result, Err(ProviderFailure::Auth { .. })));
    }
}
