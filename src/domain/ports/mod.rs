//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod command_runner;
pub mod pipeline_events;

pub use command_runner::{CommandOutput, CommandRunner, CommandSpec, RunResult, RunnerError};
pub use pipeline_events::{NoopEventSink, PipelineEvent, PipelineEventSink};
