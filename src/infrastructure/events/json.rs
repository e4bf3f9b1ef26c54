//! JSON Event Sink
//!
//! Outputs pipeline events as NDJSON for CI/automation consumption.

use crate::domain::ports::{PipelineEvent, PipelineEventSink};
use crate::domain::services::StageId;
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    /// Stage threads report concurrently; one line per event
    writer: Mutex<Box<dyn Write + Send>>,
    command: &'static str,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout(command: &'static str) -> Self {
        Self::with_writer(command, io::stdout())
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(command: &'static str, writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            command,
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

fn wave_names(waves: &[Vec<StageId>]) -> Vec<Vec<&'static str>> {
    waves
        .iter()
        .map(|wave| wave.iter().map(StageId::as_str).collect())
        .collect()
}

impl PipelineEventSink for JsonEventSink {
    fn on_event(&self, event: PipelineEvent) {
        let json = match event {
            PipelineEvent::Started {
                project,
                image,
                waves,
            } => serde_json::json!({
                "event": "start",
                "command": self.command,
                "project": project.display().to_string(),
                "image": image.display().to_string(),
                "waves": wave_names(&waves),
            }),

            PipelineEvent::StageStarted { stage } => serde_json::json!({
                "event": "stage_start",
                "command": self.command,
                "stage": stage.as_str(),
            }),

            PipelineEvent::CommandStarted { stage, command } => serde_json::json!({
                "event": "command",
                "command": self.command,
                "stage": stage.as_str(),
                "argv": command,
            }),

            PipelineEvent::StageCompleted { stage, summary } => serde_json::json!({
                "event": "stage_complete",
                "command": self.command,
                "stage": stage.as_str(),
                "summary": summary,
            }),

            PipelineEvent::StageFailed { stage, kind, error } => serde_json::json!({
                "event": "stage_error",
                "command": self.command,
                "stage": stage.as_str(),
                "kind": kind,
                "error": error,
            }),

            PipelineEvent::StageSkipped { stage } => serde_json::json!({
                "event": "stage_skipped",
                "command": self.command,
                "stage": stage.as_str(),
            }),

            PipelineEvent::Warning { message } => serde_json::json!({
                "event": "warning",
                "command": self.command,
                "message": message,
            }),

            PipelineEvent::Completed { success, image } => serde_json::json!({
                "event": "complete",
                "command": self.command,
                "status": if success { "success" } else { "failed" },
                "image": image.display().to_string(),
            }),
        };

        self.write_event(json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct TestWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl TestWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buffer = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    buffer: buffer.clone(),
                },
                buffer,
            )
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lines(buffer: &Arc<Mutex<Vec<u8>>>) -> Vec<serde_json::Value> {
        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn json_sink_outputs_start_event_with_waves() {
        let (writer, buffer) = TestWriter::new();
        let sink = JsonEventSink::with_writer("build", writer);

        sink.on_event(PipelineEvent::Started {
            project: PathBuf::from("/proj"),
            image: PathBuf::from("/proj/.stagehand/image"),
            waves: vec![vec![StageId::Frontend, StageId::Backend], vec![StageId::Assemble]],
        });

        let events = lines(&buffer);
        assert_eq!(events[0]["event"], "start");
        assert_eq!(events[0]["command"], "build");
        assert_eq!(events[0]["waves"][0][1], "backend");
    }

    #[test]
    fn json_sink_outputs_failure() {
        let (writer, buffer) = TestWriter::new();
        let sink = JsonEventSink::with_writer("build", writer);

        sink.on_event(PipelineEvent::StageFailed {
            stage: StageId::Backend,
            kind: "dependency".to_string(),
            error: "lock snapshot is out of date".to_string(),
        });
        sink.on_event(PipelineEvent::Completed {
            success: false,
            image: PathBuf::from("img"),
        });

        let events = lines(&buffer);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "stage_error");
        assert_eq!(events[0]["kind"], "dependency");
        assert_eq!(events[1]["status"], "failed");
    }
}
