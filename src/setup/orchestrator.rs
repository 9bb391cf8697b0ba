//! The project setup orchestrator.
//!
//! Executes a fixed, ordered sequence of setup steps for one request and
//! produces a final report. Steps are individually skippable based on
//! request flags but never reordered:
//!
//! 1. validate the request (fails fast, no resources touched);
//! 2. create the source-control repository;
//! 3. materialize template files into the target directory, then push them
//!    to the repository as the initial commit;
//! 4. provision cloud resources (database, container, bucket) sequentially;
//! 5. inject CI variables into the repository;
//! 6. invoke the template's post-setup hook;
//! 7. produce the final report.
//!
//! Failure policy: ValidationError, IOFailure during materialization and
//! provider auth failures abort the remaining pipeline; all other provider
//! failures are isolated to their own resource and the run continues. There
//! is no automatic rollback — resources created before a failure are left in
//! place and reported, so a user can inspect or retry against them. Retry is
//! an explicit re-invocation by the caller; providers' create-or-get
//! idempotence makes that safe.

use crate::config::CredentialStore;
use crate::provider::{
    local_git, Provisioned, ProviderFailure, ResourceDescriptor, ResourceKind, ResourceParams,
    ResourceProvider, ResourceSpec, SecretStore, DEFAULT_BUCKET_MAX_SIZE_BYTES,
};
use crate::secrets::OutputMasker;
use crate::setup::context::{LogSink, SetupContext};
use crate::setup::outcome::{ErrorClass, Stage, StepError, StepOutcome};
use crate::setup::report::{SetupReport, SetupStatus};
use crate::setup::request::SetupRequest;
use crate::template::{self, TemplateHandle, TemplateStore};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Owns the ordered pipeline of setup steps.
///
/// Providers are registered per resource kind at construction time; the
/// orchestrator itself holds no state across runs — every invocation builds
/// a fresh [`SetupContext`] and runs are fully independent.
pub struct Orchestrator {
    templates: Box<dyn TemplateStore>,
    credentials: Arc<dyn CredentialStore>,
    providers: BTreeMap<ResourceKind, Box<dyn ResourceProvider>>,
    secret_store: Option<Box<dyn SecretStore>>,
    projects_root: PathBuf,
    local_git: bool,
}

impl Orchestrator {
    /// Create an orchestrator with no providers registered yet.
    pub fn new(templates: Box<dyn TemplateStore>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            templates,
            credentials,
            providers: BTreeMap::new(),
            secret_store: None,
            projects_root: PathBuf::from("."),
            local_git: false,
        }
    }

    /// Register the provider for its resource kind, replacing any previous
    /// registration.
    pub fn with_provider(mut self, provider: Box<dyn ResourceProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Register the CI-variable store used in the secret injection stage.
    pub fn with_secret_store(mut self, store: Box<dyn SecretStore>) -> Self {
        self.secret_store = Some(store);
        self
    }

    /// Directory new projects are created under when the request does not
    /// override the target directory.
    pub fn with_projects_root(mut self, root: PathBuf) -> Self {
        self.projects_root = root;
        self
    }

    /// Also initialize a local git repository in the target directory and
    /// push the materialized files to the created remote.
    pub fn with_local_git(mut self) -> Self {
        self.local_git = true;
        self
    }

    /// Execute the full pipeline for one request.
    ///
    /// The optional sink is invoked once per appended log entry for live
    /// progress display. Always returns a complete report; errors never
    /// escape as panics or early returns without a log and status.
    pub fn run(&self, request: SetupRequest, sink: Option<LogSink>) -> SetupReport {
        let target_dir = request
            .target_dir
            .clone()
            .unwrap_or_else(|| self.projects_root.join(&request.name));
        let masker = OutputMasker::from_store(self.credentials.as_ref());
        let mut ctx = SetupContext::new(request, target_dir, masker, sink);
        let mut errors: Vec<StepError> = Vec::new();

        // Stage 1: validate. Fails fast; no provider has been called yet.
        ctx.begin_stage(Stage::Validate);
        let handle = match self.validate(&mut ctx) {
            Ok(handle) => handle,
            Err(message) => {
                ctx.append_log(format!("validation failed: {}", message));
                errors.push(StepError {
                    stage: Stage::Validate,
                    class: ErrorClass::Validation,
                    message,
                });
                return self.finish(ctx, errors, true);
            }
        };
        ctx.append_log(format!(
            "setting up project '{}' from template '{}'",
            ctx.request().name,
            handle.id
        ));

        let mut aborted = false;

        // Stage 2: source-control repository.
        if ctx.request().create_repo {
            let spec = ResourceSpec {
                name: ctx.request().name.clone(),
                params: ResourceParams::Repository {
                    private: ctx.request().private,
                },
            };
            aborted = absorb(self.provision(&mut ctx, Stage::Repository, spec), &mut errors);
        }

        // Stage 3: template materialization. An IO failure here is fatal:
        // nothing later can proceed without the project directory.
        if !aborted {
            aborted = absorb(self.materialize(&mut ctx, &handle), &mut errors);
        }

        // Once the files are on disk they are pushed to the remote created
        // in stage 2, so later stage failures still leave a published
        // initial commit. Push failures never abort the run.
        if !aborted && self.local_git {
            absorb(self.publish_local_git(&mut ctx), &mut errors);
        }

        // Stage 4: cloud resources, sequentially for deterministic logs.
        // Each failure stays isolated to its own resource.
        if !aborted {
            for (stage, spec) in resource_stages(ctx.request()) {
                if absorb(self.provision(&mut ctx, stage, spec), &mut errors) {
                    aborted = true;
                    break;
                }
            }
        }

        // Stage 5: CI variables, only when the repository exists and stage 4
        // produced resources that need them.
        if !aborted && self.should_inject_secrets(&ctx) {
            aborted = absorb(self.inject_secrets(&mut ctx), &mut errors);
        }

        // Stage 6: template hook. Failures are confined to this stage; the
        // context accumulated in stages 1-5 stays intact.
        if !aborted {
            absorb(self.hook(&mut ctx, &handle), &mut errors);
        }

        self.finish(ctx, errors, aborted)
    }

    /// Stage 1 body: request consistency plus template existence.
    fn validate(&self, ctx: &mut SetupContext) -> Result<TemplateHandle, String> {
        ctx.request().validate()?;
        let template = ctx.request().template.clone();
        self.templates
            .resolve(&template)
            .map_err(|e| e.to_string())
    }

    /// Shared body of stages 2 and 4: idempotent create-or-get of a single
    /// resource, with the at-most-one-creation-per-kind check.
    fn provision(&self, ctx: &mut SetupContext, stage: Stage, spec: ResourceSpec) -> StepOutcome {
        ctx.begin_stage(stage);
        let kind = spec.params.kind();

        if ctx.get_resource(kind).is_some() {
            let message = format!("{} '{}' already recorded; skipping creation", kind, spec.name);
            ctx.append_log(&message);
            return StepOutcome::Skipped(message);
        }

        let Some(provider) = self.providers.get(&kind) else {
            let message = format!("no provider registered for {}", kind);
            ctx.append_log(&message);
            return StepOutcome::failed(stage, ErrorClass::Transient, message);
        };

        match provider.create_or_get(&spec) {
            Ok(Provisioned {
                descriptor,
                already_existed,
            }) => {
                if already_existed {
                    ctx.append_log(format!(
                        "{} '{}' already exists; skipping creation",
                        kind, spec.name
                    ));
                } else {
                    ctx.append_log(format!("created {}", descriptor.summary()));
                }
                ctx.record_resource(descriptor);
                StepOutcome::Success
            }
            Err(ProviderFailure::AlreadyExists { kind, name }) => {
                // Idempotent convergence from a provider that cannot return
                // the existing descriptor itself.
                let message = format!("{} '{}' already exists; skipping creation", kind, name);
                ctx.append_log(&message);
                StepOutcome::Skipped(message)
            }
            Err(failure) => {
                let class = classify(&failure);
                ctx.append_log(format!("{} provisioning failed: {}", kind, failure));
                StepOutcome::failed(stage, class, ctx.mask(&failure.to_string()))
            }
        }
    }

    /// Stage 3 body.
    fn materialize(&self, ctx: &mut SetupContext, handle: &TemplateHandle) -> StepOutcome {
        ctx.begin_stage(Stage::Materialize);
        let target = ctx.target_dir().to_path_buf();
        match template::materialize(handle, &target) {
            Ok(()) => {
                ctx.append_log(format!(
                    "copied template '{}' into {}",
                    handle.id,
                    target.display()
                ));
                StepOutcome::Success
            }
            Err(e) => {
                ctx.append_log(format!("materialization failed: {}", e));
                StepOutcome::failed(Stage::Materialize, ErrorClass::Io, ctx.mask(&e.to_string()))
            }
        }
    }

    /// Turn the target directory into a git repository and push the initial
    /// commit to the remote recorded in stage 2. Accounted to the repository
    /// stage; requires no stage start of its own.
    fn publish_local_git(&self, ctx: &mut SetupContext) -> StepOutcome {
        let Some(ResourceDescriptor::Repository {
            clone_url,
            default_branch,
            ..
        }) = ctx.get_resource(ResourceKind::Repository)
        else {
            return StepOutcome::Skipped("no repository to push to".to_string());
        };
        let remote = local_git::authenticated_remote(clone_url, self.credentials.as_ref());
        let branch = default_branch.clone();
        let target = ctx.target_dir().to_path_buf();

        match local_git::publish(&target, &remote, &branch) {
            Ok(local_git::Publish::Pushed) => {
                ctx.append_log(format!("pushed initial commit to branch '{}'", branch));
                StepOutcome::Success
            }
            Ok(local_git::Publish::AlreadyInitialized) => {
                let message =
                    "target directory is already a git repository; skipping push".to_string();
                ctx.append_log(&message);
                StepOutcome::Skipped(message)
            }
            Err(failure @ local_git::GitError::MissingTool) => {
                let message = failure.to_string();
                ctx.append_log(format!("local repository publish failed: {}", message));
                StepOutcome::failed(Stage::Repository, ErrorClass::Config, message)
            }
            Err(failure) => {
                ctx.append_log(format!("local repository publish failed: {}", failure));
                StepOutcome::failed(
                    Stage::Repository,
                    ErrorClass::Transient,
                    ctx.mask(&failure.to_string()),
                )
            }
        }
    }

    fn should_inject_secrets(&self, ctx: &SetupContext) -> bool {
        ctx.request().ci_variables
            && ctx.get_resource(ResourceKind::Repository).is_some()
            && (ctx.get_resource(ResourceKind::Database).is_some()
                || ctx.get_resource(ResourceKind::Container).is_some()
                || ctx.get_resource(ResourceKind::Bucket).is_some())
    }

    /// Stage 5 body: build the variable map from recorded descriptors,
    /// resolving secrets through the credential store only here, at the
    /// point of use.
    fn inject_secrets(&self, ctx: &mut SetupContext) -> StepOutcome {
        ctx.begin_stage(Stage::Secrets);

        let Some(store) = &self.secret_store else {
            let message = "no CI variable store configured; skipping".to_string();
            ctx.append_log(&message);
            return StepOutcome::Skipped(message);
        };

        let variables = match self.ci_variables(ctx) {
            Ok(vars) => vars,
            Err(message) => {
                ctx.append_log(format!("CI variable resolution failed: {}", message));
                return StepOutcome::failed(Stage::Secrets, ErrorClass::Config, ctx.mask(&message));
            }
        };

        let repository = ctx.request().name.clone();
        match store.set_ci_variables(&repository, &variables) {
            Ok(()) => {
                let names: Vec<&str> = variables.keys().map(|k| k.as_str()).collect();
                ctx.append_log(format!("set CI variables: {}", names.join(", ")));
                StepOutcome::Success
            }
            Err(failure) => {
                let class = classify(&failure);
                ctx.append_log(format!("CI variable injection failed: {}", failure));
                StepOutcome::failed(Stage::Secrets, class, ctx.mask(&failure.to_string()))
            }
        }
    }

    fn ci_variables(&self, ctx: &SetupContext) -> Result<BTreeMap<String, String>, String> {
        let mut variables = BTreeMap::new();

        if let Some(ResourceDescriptor::Database {
            name,
            host,
            port,
            credentials_ref,
            ..
        }) = ctx.get_resource(ResourceKind::Database)
        {
            let username = self
                .credentials
                .require("DB_ADMIN_USERNAME")
                .map_err(|e| e.to_string())?;
            let password = self
                .credentials
                .require(credentials_ref)
                .map_err(|e| e.to_string())?;
            variables.insert(
                "DATABASE_URL".to_string(),
                format!("postgresql://{}:{}@{}:{}/{}", username, password, host, port, name),
            );
        }

        if let Some(ResourceDescriptor::Bucket { name, endpoint }) =
            ctx.get_resource(ResourceKind::Bucket)
        {
            variables.insert("BUCKET_NAME".to_string(), name.clone());
            variables.insert("STORAGE_ENDPOINT".to_string(), endpoint.clone());
        }

        if let Some(ResourceDescriptor::Container { name, .. }) =
            ctx.get_resource(ResourceKind::Container)
        {
            variables.insert("CONTAINER_NAME".to_string(), name.clone());
        }

        Ok(variables)
    }

    /// Stage 6 body. The hook is an arbitrary external collaborator; any
    /// error it returns becomes a Failed outcome for this stage only.
    fn hook(&self, ctx: &mut SetupContext, handle: &TemplateHandle) -> StepOutcome {
        let Some(hook) = handle.hook.clone() else {
            return StepOutcome::Skipped("template declares no post-setup hook".to_string());
        };

        ctx.begin_stage(Stage::Hook);
        match hook.run(ctx) {
            Ok(Some(database_name)) => {
                ctx.append_log(format!(
                    "post-setup finished; final database name '{}'",
                    database_name
                ));
                ctx.record_output("database_name", database_name);
                StepOutcome::Success
            }
            Ok(None) => {
                ctx.append_log("post-setup finished");
                StepOutcome::Success
            }
            Err(failure) => {
                ctx.append_log(format!("post-setup failed: {}", failure));
                StepOutcome::failed(Stage::Hook, ErrorClass::Hook, ctx.mask(&failure.to_string()))
            }
        }
    }

    /// Stage 7: summarize and assemble the report.
    fn finish(&self, mut ctx: SetupContext, errors: Vec<StepError>, aborted: bool) -> SetupReport {
        let created: Vec<String> = ctx.resources().map(|d| d.summary()).collect();

        let status = if aborted {
            SetupStatus::Failed
        } else if errors.is_empty() {
            SetupStatus::Success
        } else if !created.is_empty() {
            SetupStatus::PartialFailure
        } else {
            SetupStatus::Failed
        };

        match status {
            SetupStatus::Success => {
                ctx.append_log(format!(
                    "project '{}' is ready at {}",
                    ctx.request().name,
                    ctx.target_dir().display()
                ));
            }
            SetupStatus::PartialFailure => {
                ctx.append_log(format!(
                    "setup finished with {} failed step(s); created resources are left in place",
                    errors.len()
                ));
            }
            SetupStatus::Failed => {
                ctx.append_log("setup failed");
            }
        }
        for summary in &created {
            ctx.append_log(format!("  {}", summary));
        }

        let (log, resources, outputs) = ctx.into_parts();
        SetupReport {
            status,
            created_resources: resources.into_values().collect(),
            log,
            errors,
            outputs,
        }
    }
}

/// The stage 4 resources requested, in canonical order. The relative order
/// among them carries no dependency; it is fixed for deterministic logs.
fn resource_stages(request: &SetupRequest) -> Vec<(Stage, ResourceSpec)> {
    let mut stages = Vec::new();
    if let Some(engine) = &request.database {
        stages.push((
            Stage::Database,
            ResourceSpec {
                name: request.name.clone(),
                params: ResourceParams::Database {
                    engine: engine.clone(),
                },
            },
        ));
    }
    if let Some(image) = &request.container_image {
        stages.push((
            Stage::Container,
            ResourceSpec {
                name: request.name.clone(),
                params: ResourceParams::Container {
                    image: image.clone(),
                },
            },
        ));
    }
    if request.create_bucket {
        stages.push((
            Stage::Bucket,
            ResourceSpec {
                name: request.name.clone(),
                params: ResourceParams::Bucket {
                    max_size_bytes: DEFAULT_BUCKET_MAX_SIZE_BYTES,
                },
            },
        ));
    }
    stages
}

/// Record a failed outcome; returns whether it aborts the remaining pipeline.
fn absorb(outcome: StepOutcome, errors: &mut Vec<StepError>) -> bool {
    match outcome {
        StepOutcome::Success | StepOutcome::Skipped(_) => false,
        StepOutcome::Failed(error) => {
            let fatal = error.class.is_fatal();
            errors.push(error);
            fatal
        }
    }
}

fn classify(failure: &ProviderFailure) -> ErrorClass {
    match failure {
        ProviderFailure::Auth { .. } => ErrorClass::Auth,
        ProviderFailure::QuotaOrPermission { .. } => ErrorClass::QuotaOrPermission,
        ProviderFailure::AlreadyExists { .. } | ProviderFailure::Transient { .. } => {
            ErrorClass::Transient
        }
    }
}
