//! The project setup pipeline.
//!
//! One setup run takes an immutable [`SetupRequest`], threads a single
//! mutable [`SetupContext`] through a fixed, ordered sequence of steps
//! (repository creation, template materialization, cloud provisioning,
//! CI-variable injection, template hook) and produces a [`SetupReport`].
//! Steps are individually skippable by request flags but never reordered.

pub mod context;
pub mod orchestrator;
pub mod outcome;
pub mod report;
pub mod request;

pub use context::{LogEntry, LogSink, SetupContext};
pub use orchestrator::Orchestrator;
pub use outcome::{ErrorClass, Stage, StepError, StepOutcome};
pub use report::{SetupReport, SetupStatus};
pub use request::{validate_name, SetupRequest, SetupRequestBuilder};
