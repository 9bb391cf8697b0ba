//! Shell command execution.
//!
//! Cloud providers and template hooks shell out to external tools (`yc`,
//! `python`, `npm`, `git`). Every call here is blocking and captured; the
//! caller decides what ends up in the setup log.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// First non-empty line of stderr, or a generic message.
    pub fn error_line(&self) -> String {
        self.stderr
            .lines()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("command failed")
            .to_string()
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,
}

/// Hide credential material embedded in a command argument before it is
/// logged. `yc` takes the admin password inline as `password=...`, so the
/// value between that marker and the next comma is replaced.
fn redact_arg(arg: &str) -> String {
    const MARKER: &str = "password=";

    let Some(pos) = arg.find(MARKER) else {
        return arg.to_string();
    };

    let value_start = pos + MARKER.len();
    let value_end = arg[value_start..]
        .find(',')
        .map(|i| value_start + i)
        .unwrap_or(arg.len());

    format!("{}***{}", &arg[..value_start], &arg[value_end..])
}

/// Execute a program with arguments, capturing output.
pub fn execute(program: &str, args: &[&str], options: &CommandOptions) -> io::Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let shown: Vec<String> = args.iter().map(|a| redact_arg(a)).collect();
    tracing::debug!("running: {} {}", program, shown.join(" "));

    let output = cmd.output()?;
    let duration = start.elapsed();

    Ok(CommandResult {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration,
        success: output.status.success(),
    })
}

/// Execute a program and return whether it exited successfully.
pub fn execute_check(program: &str, args: &[&str], cwd: Option<&Path>) -> bool {
    let options = CommandOptions {
        cwd: cwd.map(|p| p.to_path_buf()),
        ..Default::default()
    };

    execute(program, args, &options)
        .map(|r| r.success)
        .unwrap_or(false)
}

/// Check whether a command-line tool is available on PATH.
pub fn tool_available(program: &str) -> bool {
    let probe = if cfg!(target_os = "windows") {
        ("where", vec![program])
    } else {
        ("which", vec![program])
    };
    execute_check(probe.0, &probe.1, None)
}
