//! Pipeline Event Port
//!
//! Observable interface for build and launch progress. Enables console
//! progress, NDJSON event streams for CI, and silent operation.

use std::path::PathBuf;

use crate::domain::services::StageId;

/// Event emitted while the pipeline runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Build started
    Started {
        project: PathBuf,
        image: PathBuf,
        waves: Vec<Vec<StageId>>,
    },

    /// A stage began
    StageStarted { stage: StageId },

    /// An external command is about to run
    CommandStarted { stage: StageId, command: String },

    /// A stage finished successfully
    StageCompleted { stage: StageId, summary: String },

    /// A stage failed
    StageFailed {
        stage: StageId,
        kind: String,
        error: String,
    },

    /// A stage was not run because an earlier wave failed
    StageSkipped { stage: StageId },

    /// Non-fatal observation
    Warning { message: String },

    /// Build finished
    Completed { success: bool, image: PathBuf },
}

/// Trait for receiving pipeline events
pub trait PipelineEventSink: Send + Sync {
    fn on_event(&self, event: PipelineEvent);
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl PipelineEventSink for NoopEventSink {
    fn on_event(&self, _event: PipelineEvent) {}
}
