//! The final setup report handed back to the front end.

use crate::provider::ResourceDescriptor;
use crate::setup::context::LogEntry;
use crate::setup::outcome::StepError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Terminal status of one setup run.
///
/// `PartialFailure` is a first-class, expected terminal state: some resources
/// now exist and need attention, as opposed to nothing having been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStatus {
    Success,
    PartialFailure,
    Failed,
}

impl std::fmt::Display for SetupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SetupStatus::Success => "success",
            SetupStatus::PartialFailure => "partial failure",
            SetupStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Everything the front end needs to render the outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupReport {
    pub status: SetupStatus,

    /// Descriptors of every resource that exists after the run, in canonical
    /// kind order — including resources created before a later failure.
    pub created_resources: Vec<ResourceDescriptor>,

    /// The complete, ordered setup log.
    pub log: Vec<LogEntry>,

    /// Every step failure, in pipeline order.
    pub errors: Vec<StepError>,

    /// Template-specific outputs (e.g. the final database name).
    pub outputs: BTreeMap<String, String>,
}

impl SetupReport {
    /// Whether the run finished without any step failure.
    pub fn is_success(&self) -> bool {
        self.status == SetupStatus::Success
    }

    /// The first failure, if any. Convenient for front ends that show a
    /// single error line.
    pub fn error(&self) -> Option<&StepError> {
        self.errors.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::outcome::{ErrorClass, Stage};

    #[test]
    fn status_display() {
        assert_eq!(SetupStatus::Success.to_string(), "success");
        assert_eq!(SetupStatus::PartialFailure.to_string(), "partial failure");
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_value(SetupStatus::PartialFailure).unwrap();
        assert_eq!(json, "partial_failure");
    }

    #[test]
    fn error_returns_first_failure() {
        let report = SetupReport {
            status: SetupStatus::PartialFailure,
            created_resources: vec![],
            log: vec![],
            errors: vec![
                StepError {
                    stage: Stage::Database,
                    class: ErrorClass::Transient,
                    message: "first".into(),
                },
                StepError {
                    stage: Stage::Hook,
                    class: ErrorClass::Hook,
                    message: "second".into(),
                },
            ],
            outputs: BTreeMap::new(),
        };

        assert_eq!(report.error().unwrap().stage, Stage::Database);
        assert!(!report.is_success());
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = SetupReport {
            status: SetupStatus::Success,
            created_resources: vec![ResourceDescriptor::Bucket {
                name: "demo1".into(),
                endpoint: "storage.example".into(),
            }],
            log: vec![],
            errors: vec![],
            outputs: [("database_name".to_string(), "demo1".to_string())]
                .into_iter()
                .collect(),
        };

        let json = serde_json::to_string(&report).unwrap();
        let parsed: SetupReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, SetupStatus::Success);
        assert_eq!(parsed.created_resources.len(), 1);
        assert_eq!(parsed.outputs.get("database_name").unwrap(), "demo1");
    }
}
