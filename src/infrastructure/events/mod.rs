//! Event Sink Implementations
//!
//! Concrete implementations of PipelineEventSink:
//! - JsonEventSink: NDJSON output for CI/automation
//! - ConsoleEventSink lives in the presentation layer

mod json;

pub use json::JsonEventSink;
