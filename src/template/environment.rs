//! Local development environment helpers shared by template hooks.
//!
//! Everything here operates on directories inside the freshly materialized
//! project and shells out to the developer's locally installed tools. These
//! helpers are deliberately forgiving about already-done work (an existing
//! virtualenv, an already populated node_modules) so re-running setup over an
//! existing project converges instead of failing.

use crate::config::EnvFileParser;
use crate::setup::SetupContext;
use crate::shell::{self, CommandOptions};
use crate::template::HookFailure;
use std::collections::HashMap;
use std::path::Path;

/// Virtual environment directory name inside a Python project.
pub const VENV_DIR: &str = ".venv";

/// Create a Python virtual environment in `dir` and install dependencies
/// from `requirements.txt` when present.
///
/// Skips creation when `.venv` already exists.
pub fn setup_python_environment(ctx: &mut SetupContext, dir: &Path) -> Result<(), HookFailure> {
    let venv = dir.join(VENV_DIR);
    if venv.exists() {
        ctx.append_log(format!(
            "virtual environment already exists at {}; skipping",
            venv.display()
        ));
        return Ok(());
    }

    if !shell::tool_available("python3") {
        return Err(HookFailure::MissingTool {
            tool: "python3".to_string(),
        });
    }

    ctx.append_log(format!("creating virtual environment in {}", dir.display()));
    run_in(dir, "python3", &["-m", "venv", VENV_DIR])?;

    let requirements = dir.join("requirements.txt");
    if requirements.exists() {
        ctx.append_log("installing Python dependencies from requirements.txt");
        let pip = venv.join("bin").join("pip");
        run_in(
            dir,
            &pip.to_string_lossy(),
            &["install", "-r", "requirements.txt"],
        )?;
    } else {
        ctx.append_log("no requirements.txt found; skipping dependency installation");
    }

    Ok(())
}

/// Install frontend dependencies with `npm install` when `dir` holds a node
/// project (that is, when `package.json` exists).
pub fn setup_frontend_environment(ctx: &mut SetupContext, dir: &Path) -> Result<(), HookFailure> {
    if !dir.join("package.json").exists() {
        ctx.append_log(format!(
            "no package.json in {}; skipping frontend setup",
            dir.display()
        ));
        return Ok(());
    }

    if !shell::tool_available("npm") {
        return Err(HookFailure::MissingTool {
            tool: "npm".to_string(),
        });
    }

    ctx.append_log(format!("installing npm dependencies in {}", dir.display()));
    run_in(dir, "npm", &["install"])?;

    Ok(())
}

/// Merge variables into the `.env` file of `dir`, creating it if missing.
///
/// Existing keys keep their values unless overwritten by `vars`; unrelated
/// keys are preserved. Values are written unquoted, one `KEY=VALUE` per line
/// in sorted key order.
pub fn write_env_vars(dir: &Path, vars: &HashMap<String, String>) -> Result<(), HookFailure> {
    let path = dir.join(".env");
    let mut merged = EnvFileParser::load_optional(&path)
        .map_err(|e| HookFailure::Command {
            command: format!("parse {}", path.display()),
            message: e.to_string(),
        })?;
    merged.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut keys: Vec<&String> = merged.keys().collect();
    keys.sort();
    let mut content = String::new();
    for key in keys {
        content.push_str(key);
        content.push('=');
        content.push_str(&merged[key]);
        content.push('\n');
    }

    std::fs::write(&path, content)?;
    Ok(())
}

fn run_in(dir: &Path, program: &str, args: &[&str]) -> Result<(), HookFailure> {
    let options = CommandOptions {
        cwd: Some(dir.to_path_buf()),
        ..Default::default()
    };
    let result = shell::execute(program, args, &options).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HookFailure::MissingTool {
                tool: program.to_string(),
            }
        } else {
            HookFailure::Io(e)
        }
    })?;

    if result.success {
        Ok(())
    } else {
        Err(HookFailure::Command {
            command: format!("{} {}", program, args.join(" ")),
            message: result.error_line(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_env_vars_creates_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut vars = HashMap::new();
        vars.insert("SITE_URL".to_string(), "http://localhost:8000".to_string());

        write_env_vars(temp.path(), &vars).unwrap();

        let content = std::fs::read_to_string(temp.path().join(".env")).unwrap();
        assert_eq!(content, "SITE_URL=http://localhost:8000\n");
    }

    #[test]
    fn write_env_vars_preserves_unrelated_keys() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(".env"), "EXISTING=kept\nSITE_URL=old\n").unwrap();

        let mut vars = HashMap::new();
        vars.insert("SITE_URL".to_string(), "new".to_string());
        write_env_vars(temp.path(), &vars).unwrap();

        let parsed = EnvFileParser::load(&temp.path().join(".env")).unwrap();
        assert_eq!(parsed.get("EXISTING").map(String::as_str), Some("kept"));
        assert_eq!(parsed.get("SITE_URL").map(String::as_str), Some("new"));
    }

    #[test]
    fn run_in_reports_failing_command() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = run_in(temp.path(), "sh", &["-c", "echo broken >&2; exit 3"]).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn run_in_missing_program_is_missing_tool() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = run_in(temp.path(), "definitely-not-a-real-binary", &[]).unwrap_err();
        assert!(matches!(err, HookFailure::MissingTool { .. }));
    }
}
