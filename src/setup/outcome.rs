//! Pipeline stages and step outcomes.

use serde::{Deserialize, Serialize};

/// A pipeline stage, in canonical order. Stages may be skipped by request
/// flags but are never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validate,
    Repository,
    Materialize,
    Database,
    Container,
    Bucket,
    Secrets,
    Hook,
}

impl Stage {
    /// Human description used for stage-start log entries.
    pub fn description(&self) -> &'static str {
        match self {
            Stage::Validate => "Validating request",
            Stage::Repository => "Creating source-control repository",
            Stage::Materialize => "Materializing template files",
            Stage::Database => "Provisioning database",
            Stage::Container => "Provisioning container",
            Stage::Bucket => "Provisioning bucket",
            Stage::Secrets => "Injecting CI variables",
            Stage::Hook => "Running template post-setup",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Validate => "validate",
            Stage::Repository => "repository",
            Stage::Materialize => "materialize",
            Stage::Database => "database",
            Stage::Container => "container",
            Stage::Bucket => "bucket",
            Stage::Secrets => "secrets",
            Stage::Hook => "hook",
        };
        write!(f, "{}", s)
    }
}

/// Classification of a step failure in the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Malformed request; fails before any external call.
    Validation,
    /// Authentication/authorization failure; aborts the remaining pipeline.
    Auth,
    /// Retryable provider failure, isolated to one resource.
    Transient,
    /// Quota or permission failure, isolated to one resource.
    QuotaOrPermission,
    /// Filesystem failure during materialization; aborts the run.
    Io,
    /// Missing credential or configuration key at point of use.
    Config,
    /// Template post-setup hook failure; confined to the hook stage.
    Hook,
}

impl ErrorClass {
    /// Whether this failure class invalidates the rest of the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorClass::Validation | ErrorClass::Auth | ErrorClass::Io)
    }
}

/// A failed step as it appears in the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub stage: Stage,
    pub class: ErrorClass,
    pub message: String,
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} step failed: {}", self.stage, self.message)
    }
}

/// Result of one pipeline step.
///
/// Steps never raise across the stage boundary; the orchestrator normalizes
/// everything into one of these.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// The step did its work (or confirmed it was already done).
    Success,
    /// The step did not apply and was skipped.
    Skipped(String),
    /// The step failed; the error is recorded in the report.
    Failed(StepError),
}

impl StepOutcome {
    /// Shorthand for a failed outcome.
    pub fn failed(stage: Stage, class: ErrorClass, message: impl Into<String>) -> Self {
        StepOutcome::Failed(StepError {
            stage,
            class,
            message: message.into(),
        })
    }

    /// Whether this outcome aborts the remaining pipeline.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StepOutcome::Failed(e) if e.class.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_order_matches_pipeline() {
        assert!(Stage::Validate < Stage::Repository);
        assert!(Stage::Repository < Stage::Materialize);
        assert!(Stage::Materialize < Stage::Database);
        assert!(Stage::Database < Stage::Container);
        assert!(Stage::Container < Stage::Bucket);
        assert!(Stage::Bucket < Stage::Secrets);
        assert!(Stage::Secrets < Stage::Hook);
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::Validate.to_string(), "validate");
        assert_eq!(Stage::Secrets.to_string(), "secrets");
    }

    #[test]
    fn fatal_classes() {
        assert!(ErrorClass::Validation.is_fatal());
        assert!(ErrorClass::Auth.is_fatal());
        assert!(ErrorClass::Io.is_fatal());
        assert!(!ErrorClass::Transient.is_fatal());
        assert!(!ErrorClass::QuotaOrPermission.is_fatal());
        assert!(!ErrorClass::Hook.is_fatal());
        assert!(!ErrorClass::Config.is_fatal());
    }

    #[test]
    fn outcome_fatality_follows_class() {
        let fatal = StepOutcome::failed(Stage::Materialize, ErrorClass::Io, "disk full");
        let isolated = StepOutcome::failed(Stage::Database, ErrorClass::Transient, "timeout");
        assert!(fatal.is_fatal());
        assert!(!isolated.is_fatal());
        assert!(!StepOutcome::Success.is_fatal());
    }

    #[test]
    fn step_error_display_names_stage() {
        let err = StepError {
            stage: Stage::Database,
            class: ErrorClass::Transient,
            message: "connection reset".into(),
        };
        let s = err.to_string();
        assert!(s.contains("database"));
        assert!(s.contains("connection reset"));
    }

    #[test]
    fn stage_serializes_lowercase() {
        let json = serde_json::to_value(Stage::Materialize).unwrap();
        assert_eq!(json, "materialize");
    }
}
