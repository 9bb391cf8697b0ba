//! The mutable setup context threaded through the pipeline.

use crate::provider::{ResourceDescriptor, ResourceKind};
use crate::secrets::OutputMasker;
use crate::setup::outcome::Stage;
use crate::setup::request::SetupRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Callback invoked once per appended log entry, for live progress display.
pub type LogSink = Box<dyn Fn(&LogEntry) + Send>;

/// One entry of the append-only setup log.
///
/// `seq` is the monotonic position within the run; timestamps come from the
/// wall clock and are informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    /// Set on stage-start entries, None on detail lines.
    pub stage: Option<Stage>,
    pub message: String,
}

/// Accumulates all state produced across one setup run.
///
/// Created once per run and owned by the orchestrator; each pipeline step
/// reads prior steps' results and appends its own. The log is append-only:
/// entries are never reordered or mutated after append. Nothing survives
/// across runs.
pub struct SetupContext {
    request: SetupRequest,
    target_dir: PathBuf,
    log: Vec<LogEntry>,
    resources: BTreeMap<ResourceKind, ResourceDescriptor>,
    outputs: BTreeMap<String, String>,
    masker: OutputMasker,
    sink: Option<LogSink>,
}

impl SetupContext {
    /// Create a fresh context for one run.
    pub fn new(
        request: SetupRequest,
        target_dir: PathBuf,
        masker: OutputMasker,
        sink: Option<LogSink>,
    ) -> Self {
        Self {
            request,
            target_dir,
            log: Vec::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
            masker,
            sink,
        }
    }

    /// The originating request.
    pub fn request(&self) -> &SetupRequest {
        &self.request
    }

    /// The resolved directory the project is materialized into.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Append a detail line to the log. Secret values are masked before the
    /// entry is stored or forwarded to the sink.
    pub fn append_log(&mut self, message: impl Into<String>) {
        self.push_entry(None, message.into());
    }

    /// Append a stage-start entry to the log.
    pub fn begin_stage(&mut self, stage: Stage) {
        self.push_entry(Some(stage), stage.description().to_string());
    }

    fn push_entry(&mut self, stage: Option<Stage>, message: String) {
        let entry = LogEntry {
            seq: self.log.len() as u64,
            timestamp: Utc::now(),
            stage,
            message: self.masker.mask(&message),
        };
        if let Some(sink) = &self.sink {
            sink(&entry);
        }
        self.log.push(entry);
    }

    /// Record (or refine) the descriptor for a resource kind.
    pub fn record_resource(&mut self, descriptor: ResourceDescriptor) {
        self.resources.insert(descriptor.kind(), descriptor);
    }

    /// Look up the descriptor recorded for a kind, if any.
    pub fn get_resource(&self, kind: ResourceKind) -> Option<&ResourceDescriptor> {
        self.resources.get(&kind)
    }

    /// All recorded resources, in canonical kind order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.values()
    }

    /// Record a template-specific key/value output.
    pub fn record_output(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.outputs.insert(key.into(), value.into());
    }

    /// Template-specific outputs accumulated so far.
    pub fn outputs(&self) -> &BTreeMap<String, String> {
        &self.outputs
    }

    /// The log accumulated so far.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Replace registered secret values in `input`. Error messages headed for
    /// the report go through here, not just log entries.
    pub fn mask(&self, input: &str) -> String {
        self.masker.mask(input)
    }

    /// Consume the context, returning its log, resources and outputs for the
    /// final report.
    pub fn into_parts(
        self,
    ) -> (
        Vec<LogEntry>,
        BTreeMap<ResourceKind, ResourceDescriptor>,
        BTreeMap<String, String>,
    ) {
        (self.log, self.resources, self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn context() -> SetupContext {
        let request = SetupRequest::builder("demo1", "webapp").build();
        SetupContext::new(
            request,
            PathBuf::from("/projects/demo1"),
            OutputMasker::new(),
            None,
        )
    }

    fn repository() -> ResourceDescriptor {
        ResourceDescriptor::Repository {
            name: "demo1".into(),
            url: "https://github.com/octocat/demo1".into(),
            clone_url: "https://github.com/octocat/demo1.git".into(),
            default_branch: "main".into(),
        }
    }

    #[test]
    fn log_is_append_only_and_ordered() {
        let mut ctx = context();
        ctx.append_log("first");
        ctx.begin_stage(Stage::Validate);
        ctx.append_log("third");

        let seqs: Vec<u64> = ctx.log().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(ctx.log()[1].stage, Some(Stage::Validate));
        assert_eq!(ctx.log()[2].message, "third");
    }

    #[test]
    fn sink_sees_every_entry_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink: LogSink = Box::new(move |entry| {
            seen_clone.lock().unwrap().push(entry.message.clone());
        });

        let request = SetupRequest::builder("demo1", "webapp").build();
        let mut ctx = SetupContext::new(
            request,
            PathBuf::from("/projects/demo1"),
            OutputMasker::new(),
            Some(sink),
        );
        ctx.append_log("one");
        ctx.append_log("two");

        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn record_resource_overwrites_same_kind() {
        let mut ctx = context();
        ctx.record_resource(repository());
        ctx.record_resource(ResourceDescriptor::Repository {
            name: "demo1".into(),
            url: "https://github.com/octocat/demo1".into(),
            clone_url: "https://github.com/octocat/demo1.git".into(),
            default_branch: "trunk".into(),
        });

        assert_eq!(ctx.resources().count(), 1);
        match ctx.get_resource(ResourceKind::Repository).unwrap() {
            ResourceDescriptor::Repository { default_branch, .. } => {
                assert_eq!(default_branch, "trunk")
            }
            other => panic!("unexpected descriptor {:?}", other),
        }
    }

    #[test]
    fn get_resource_returns_none_when_absent() {
        let ctx = context();
        assert!(ctx.get_resource(ResourceKind::Database).is_none());
    }

    #[test]
    fn resources_iterate_in_kind_order() {
        let mut ctx = context();
        ctx.record_resource(ResourceDescriptor::Bucket {
            name: "demo1".into(),
            endpoint: "storage.example".into(),
        });
        ctx.record_resource(repository());

        let kinds: Vec<ResourceKind> = ctx.resources().map(|d| d.kind()).collect();
        assert_eq!(kinds, vec![ResourceKind::Repository, ResourceKind::Bucket]);
    }

    #[test]
    fn outputs_round_trip() {
        let mut ctx = context();
        ctx.record_output("database_name", "demo1");
        assert_eq!(ctx.outputs().get("database_name").unwrap(), "demo1");
    }

    #[test]
    fn log_entries_are_masked() {
        let mut masker = OutputMasker::new();
        masker.add_secret("hunter2");
        let request = SetupRequest::builder("demo1", "webapp").build();
        let mut ctx =
            SetupContext::new(request, PathBuf::from("/projects/demo1"), masker, None);

        ctx.append_log("password is hunter2");

        assert!(!ctx.log()[0].message.contains("hunter2"));
        assert!(ctx.log()[0].message.contains("[REDACTED]"));
    }
}
