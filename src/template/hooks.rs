//! Built-in template post-setup hooks.
//!
//! Each hook finishes what file materialization alone cannot: local
//! virtualenvs, npm installs and a `.env` file with non-secret development
//! defaults. Hooks never receive or write secret values; anything secret
//! stays in the CI variable stage where it is resolved by reference.

use crate::provider::{ResourceDescriptor, ResourceKind};
use crate::setup::SetupContext;
use crate::template::environment::{
    setup_frontend_environment, setup_python_environment, write_env_vars,
};
use crate::template::{HookFailure, TemplateHook};
use std::collections::HashMap;

fn database_name(ctx: &SetupContext) -> Option<String> {
    match ctx.get_resource(ResourceKind::Database) {
        Some(ResourceDescriptor::Database { name, .. }) => Some(name.clone()),
        _ => None,
    }
}

fn local_dev_env() -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert(
        "SITE_URL".to_string(),
        "http://localhost:8000".to_string(),
    );
    vars.insert(
        "CORS_ALLOWED_ORIGINS".to_string(),
        "http://localhost:3000".to_string(),
    );
    vars
}

/// Post-setup for the `webapp` template: Python backend under `backend/`,
/// node frontend under `frontend/`.
pub struct WebappHook;

impl TemplateHook for WebappHook {
    fn run(&self, ctx: &mut SetupContext) -> Result<Option<String>, HookFailure> {
        let db_name = database_name(ctx);
        let backend = ctx.target_dir().join("backend");
        let frontend = ctx.target_dir().join("frontend");

        write_env_vars(&backend, &local_dev_env())?;
        setup_python_environment(ctx, &backend)?;
        setup_frontend_environment(ctx, &frontend)?;

        Ok(db_name)
    }
}

/// Post-setup for the `chatbot` template: a single Python project at the
/// project root.
pub struct ChatbotHook;

impl TemplateHook for ChatbotHook {
    fn run(&self, ctx: &mut SetupContext) -> Result<Option<String>, HookFailure> {
        let db_name = database_name(ctx);
        let root = ctx.target_dir().to_path_buf();

        write_env_vars(&root, &local_dev_env())?;
        setup_python_environment(ctx, &root)?;

        Ok(db_name)
    }
}

/// Post-setup for the `landing` template: static frontend only, no database.
pub struct LandingHook;

impl TemplateHook for LandingHook {
    fn run(&self, ctx: &mut SetupContext) -> Result<Option<String>, HookFailure> {
        let frontend = ctx.target_dir().join("frontend");
        setup_frontend_environment(ctx, &frontend)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::OutputMasker;
    use crate::setup::SetupRequest;

    fn context(target: std::path::PathBuf) -> SetupContext {
        let request = SetupRequest::builder("demo1", "webapp").no_repo().build();
        SetupContext::new(request, target, OutputMasker::new(), None)
    }

    #[test]
    fn landing_hook_is_noop_without_frontend_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut ctx = context(temp.path().to_path_buf());

        // No frontend/package.json, so nothing to install.
        let result = LandingHook.run(&mut ctx).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn chatbot_hook_reports_database_name() {
        let temp = tempfile::TempDir::new().unwrap();
        // An existing venv makes python setup a no-op; only .env is written.
        std::fs::create_dir_all(temp.path().join(".venv")).unwrap();
        let mut ctx = context(temp.path().to_path_buf());
        ctx.record_resource(ResourceDescriptor::Database {
            name: "demo1".to_string(),
            engine: "postgres".to_string(),
            host: "c-x.rw.mdb.yandexcloud.net".to_string(),
            port: 6432,
            credentials_ref: "DB_ADMIN_PASSWORD".to_string(),
        });

        let result = ChatbotHook.run(&mut ctx).unwrap();

        assert_eq!(result.as_deref(), Some("demo1"));
        assert!(temp.path().join(".env").exists());
    }

    #[test]
    fn webapp_hook_writes_backend_env() {
        let temp = tempfile::TempDir::new().unwrap();
        let backend = temp.path().join("backend");
        std::fs::create_dir_all(backend.join(".venv")).unwrap();
        let mut ctx = context(temp.path().to_path_buf());

        WebappHook.run(&mut ctx).unwrap();

        let env = std::fs::read_to_string(backend.join(".env")).unwrap();
        assert!(env.contains("SITE_URL=http://localhost:8000"));
    }
}
