//! Terminal output and prompts.

use crate::error::Result;
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Show all output including step log entries.
    Verbose,
    /// Show progress and status only.
    #[default]
    Normal,
    /// Show minimal output (final status).
    Quiet,
    /// Show nothing except errors.
    Silent,
}

impl OutputMode {
    /// Whether this mode shows per-entry setup log output.
    pub fn shows_log_entries(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Whether this mode shows progress spinners.
    pub fn shows_spinners(&self) -> bool {
        matches!(self, Self::Normal | Self::Quiet)
    }

    /// Whether this mode shows status messages.
    pub fn shows_status(&self) -> bool {
        !matches!(self, Self::Silent)
    }
}

/// Output writer that respects output mode.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Write a line if the mode allows status messages.
    pub fn println(&self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    /// Write a success line with a green check mark.
    pub fn success(&self, msg: &str) {
        if self.mode.shows_status() {
            println!("{} {}", style("✓").green(), msg);
        }
    }

    /// Write a warning line.
    pub fn warn(&self, msg: &str) {
        if self.mode.shows_status() {
            println!("{} {}", style("!").yellow(), msg);
        }
    }

    /// Write an error line to stderr. Shown in every mode.
    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", style("✗").red(), msg);
    }

    /// Write a setup log entry line in verbose mode.
    pub fn log_entry(&self, msg: &str) {
        if self.mode.shows_log_entries() {
            println!("  {}", style(msg).dim());
        }
    }

    /// Start a spinner for a pipeline stage, if the mode shows them.
    pub fn stage_spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.mode.shows_spinners() {
            if self.mode.shows_log_entries() {
                println!("{}", style(message).bold());
            }
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }
}

/// Ask a yes/no question, defaulting when the terminal is non-interactive.
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    let answer = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact_opt()
        .map_err(|e| crate::error::GroundworkError::config(e.to_string()))?;
    Ok(answer.unwrap_or(default))
}
