//! Command dispatch.

use crate::cli::args::{Cli, Commands, CreateCommands, ListCommands, SetupArgs};
use crate::config::{CloudCredentials, CredentialStore, EnvCredentials, GitHostCredentials};
use crate::error::Result;
use crate::provider::{
    BucketProvider, ContainerProvider, DatabaseProvider, GitHubProvider, Provisioned,
    ResourceParams, ResourceProvider, ResourceSpec, DEFAULT_BUCKET_MAX_SIZE_BYTES,
};
use crate::setup::{LogSink, Orchestrator, SetupReport, SetupRequest, SetupStatus};
use crate::template::{BuiltinTemplates, TemplateStore};
use crate::ui::{self, Output};
use std::path::PathBuf;
use std::sync::Arc;

/// Routes a parsed command line to its implementation.
pub struct CommandDispatcher {
    output: Output,
}

impl CommandDispatcher {
    pub fn new(output: Output) -> Self {
        Self { output }
    }

    /// Execute the selected command and return the process exit code.
    pub fn dispatch(&self, cli: &Cli) -> Result<i32> {
        let credentials = Arc::new(match &cli.env_file {
            Some(path) => EnvCredentials::from_env_file(path),
            None => EnvCredentials::from_env(),
        });

        match &cli.command {
            Commands::Setup(args) => self.run_setup(args, credentials),
            Commands::Create(create) => self.run_create(create, credentials),
            Commands::List(ListCommands::Templates) => {
                for id in BuiltinTemplates::new().template_ids() {
                    self.output.println(&id);
                }
                Ok(0)
            }
        }
    }

    fn run_setup(&self, args: &SetupArgs, credentials: Arc<EnvCredentials>) -> Result<i32> {
        let request = build_request(args);
        let projects_root = credentials.projects_root();
        let target_dir = args
            .dir
            .clone()
            .unwrap_or_else(|| projects_root.join(&args.name));

        if !args.yes && !args.json && dir_is_nonempty(&target_dir) {
            let proceed = ui::confirm(
                &format!(
                    "Directory {} already exists and is not empty. Continue?",
                    target_dir.display()
                ),
                false,
            )?;
            if !proceed {
                self.output.println("Aborted.");
                return Ok(1);
            }
        }

        let orchestrator = self
            .build_orchestrator(&request, credentials)?
            .with_projects_root(projects_root);

        let sink: Option<LogSink> = if args.json {
            None
        } else {
            let output = self.output;
            Some(Box::new(move |entry| {
                if entry.stage.is_some() {
                    output.println(&format!("→ {}", entry.message));
                } else {
                    output.log_entry(&entry.message);
                }
            }))
        };

        let report = orchestrator.run(request, sink);

        if args.json {
            let rendered = serde_json::to_string_pretty(&report)
                .map_err(|e| crate::error::GroundworkError::config(e.to_string()))?;
            println!("{}", rendered);
        } else {
            self.print_report(&report);
        }

        Ok(match report.status {
            SetupStatus::Success => 0,
            SetupStatus::PartialFailure => 2,
            SetupStatus::Failed => 1,
        })
    }

    /// Register only the providers the request actually needs, so credentials
    /// for unused providers are never required.
    fn build_orchestrator(
        &self,
        request: &SetupRequest,
        credentials: Arc<EnvCredentials>,
    ) -> Result<Orchestrator> {
        let store: Arc<dyn CredentialStore> = credentials.clone();
        let mut orchestrator =
            Orchestrator::new(Box::new(BuiltinTemplates::new()), store.clone());

        if request.create_repo {
            let git = GitHostCredentials::from_store(store.as_ref())?;
            orchestrator = orchestrator
                .with_provider(Box::new(GitHubProvider::new(git.clone())))
                .with_secret_store(Box::new(GitHubProvider::new(git)))
                .with_local_git();
        }

        let needs_cloud = request.database.is_some()
            || request.container_image.is_some()
            || request.create_bucket;
        if needs_cloud {
            let cloud = CloudCredentials::from_store(store.as_ref())?;
            if request.database.is_some() {
                orchestrator = orchestrator.with_provider(Box::new(DatabaseProvider::new(
                    cloud.clone(),
                    store.clone(),
                )));
            }
            if request.container_image.is_some() {
                orchestrator =
                    orchestrator.with_provider(Box::new(ContainerProvider::new(cloud.clone())));
            }
            if request.create_bucket {
                orchestrator = orchestrator.with_provider(Box::new(BucketProvider::new(cloud)));
            }
        }

        Ok(orchestrator)
    }

    fn print_report(&self, report: &SetupReport) {
        match report.status {
            SetupStatus::Success => {
                self.output
                    .success(&format!("Setup finished: {}", report.status));
            }
            SetupStatus::PartialFailure => {
                self.output
                    .warn(&format!("Setup finished: {}", report.status));
            }
            SetupStatus::Failed => {
                self.output.error(&format!("Setup {}", report.status));
            }
        }

        for descriptor in &report.created_resources {
            self.output.println(&format!("  {}", descriptor.summary()));
        }
        for error in &report.errors {
            self.output.error(&error.to_string());
        }
        for (key, value) in &report.outputs {
            self.output.println(&format!("  {}: {}", key, value));
        }
    }

    fn run_create(
        &self,
        command: &CreateCommands,
        credentials: Arc<EnvCredentials>,
    ) -> Result<i32> {
        let name = match command {
            CreateCommands::Repo { name, .. }
            | CreateCommands::Db { name, .. }
            | CreateCommands::Container { name, .. }
            | CreateCommands::Bucket { name } => name,
        };
        crate::setup::validate_name(name)
            .map_err(crate::error::GroundworkError::validation)?;

        let store: Arc<dyn CredentialStore> = credentials;

        let (provider, spec): (Box<dyn ResourceProvider>, ResourceSpec) = match command {
            CreateCommands::Repo { name, public } => {
                let git = GitHostCredentials::from_store(store.as_ref())?;
                (
                    Box::new(GitHubProvider::new(git)),
                    ResourceSpec {
                        name: name.clone(),
                        params: ResourceParams::Repository { private: !public },
                    },
                )
            }
            CreateCommands::Db { name, engine } => {
                let cloud = CloudCredentials::from_store(store.as_ref())?;
                (
                    Box::new(DatabaseProvider::new(cloud, store.clone())),
                    ResourceSpec {
                        name: name.clone(),
                        params: ResourceParams::Database {
                            engine: engine.clone(),
                        },
                    },
                )
            }
            CreateCommands::Container { name, image } => {
                let cloud = CloudCredentials::from_store(store.as_ref())?;
                (
                    Box::new(ContainerProvider::new(cloud)),
                    ResourceSpec {
                        name: name.clone(),
                        params: ResourceParams::Container {
                            image: image.clone(),
                        },
                    },
                )
            }
            CreateCommands::Bucket { name } => {
                let cloud = CloudCredentials::from_store(store.as_ref())?;
                (
                    Box::new(BucketProvider::new(cloud)),
                    ResourceSpec {
                        name: name.clone(),
                        params: ResourceParams::Bucket {
                            max_size_bytes: DEFAULT_BUCKET_MAX_SIZE_BYTES,
                        },
                    },
                )
            }
        };

        let spinner = self
            .output
            .stage_spinner(&format!("Creating {} '{}'", spec.params.kind(), spec.name));
        let result = provider.create_or_get(&spec);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let Provisioned {
            descriptor,
            already_existed,
        } = result?;

        if already_existed {
            self.output.println(&format!(
                "{} '{}' already exists",
                descriptor.kind(),
                descriptor.name()
            ));
        } else {
            self.output
                .success(&format!("Created {}", descriptor.summary()));
        }
        Ok(0)
    }
}

fn build_request(args: &SetupArgs) -> SetupRequest {
    let mut builder = SetupRequest::builder(&args.name, &args.template);
    if args.public {
        builder = builder.public();
    }
    if args.no_repo {
        builder = builder.no_repo();
    }
    if args.no_db {
        builder = builder.no_database();
    } else {
        builder = builder.database(&args.db);
    }
    if let Some(image) = &args.container_image {
        builder = builder.container(image);
    }
    if args.bucket {
        builder = builder.bucket();
    }
    if args.no_ci_variables {
        builder = builder.no_ci_variables();
    }
    if let Some(dir) = &args.dir {
        builder = builder.target_dir(dir.clone());
    }
    builder.build()
}

fn dir_is_nonempty(path: &PathBuf) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
