//! Human-readable progress on stderr

use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::ports::{PipelineEvent, PipelineEventSink};

use super::theme::{bold, dim, Icon};

/// Prints one line per pipeline event
pub struct ConsoleEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
    color: bool,
    unicode: bool,
    verbose: u8,
}

impl ConsoleEventSink {
    pub fn stderr(color: bool, unicode: bool, verbose: u8) -> Self {
        Self::with_writer(Box::new(io::stderr()), color, unicode, verbose)
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, color: bool, unicode: bool, verbose: u8) -> Self {
        Self {
            writer: Mutex::new(writer),
            color,
            unicode,
            verbose,
        }
    }

    fn icon(&self, icon: Icon) -> String {
        icon.colored(self.color, self.unicode)
    }

    fn render(&self, event: &PipelineEvent) -> Option<String> {
        let line = match event {
            PipelineEvent::Started { project, image, waves } => {
                let plan = waves
                    .iter()
                    .map(|wave| {
                        wave.iter()
                            .map(|s| s.as_str())
                            .collect::<Vec<_>>()
                            .join(" + ")
                    })
                    .collect::<Vec<_>>()
                    .join(" -> ");
                format!(
                    "{} {}\n  Project: {}\n  Image:   {}\n  Stages:  {}\n",
                    self.icon(Icon::Progress),
                    bold("Stagehand Build", self.color),
                    project.display(),
                    image.display(),
                    plan
                )
            }
            PipelineEvent::StageStarted { stage } => {
                format!("{} {}", self.icon(Icon::Pending), stage.description())
            }
            PipelineEvent::CommandStarted { command, .. } => {
                if self.verbose == 0 {
                    return None;
                }
                format!("    {} {}", self.icon(Icon::Command), dim(command, self.color))
            }
            PipelineEvent::StageCompleted { stage, summary } => format!(
                "{} {} {}",
                self.icon(Icon::Success),
                stage,
                dim(&format!("({})", summary), self.color)
            ),
            PipelineEvent::StageFailed { stage, error, .. } => {
                let mut out = format!("{} {} failed", self.icon(Icon::Error), stage);
                for line in error.lines() {
                    out.push_str(&format!("\n    {} {}", self.icon(Icon::Arrow), line));
                }
                out
            }
            PipelineEvent::StageSkipped { stage } => format!(
                "{} {} {}",
                self.icon(Icon::Pending),
                stage,
                dim("(skipped)", self.color)
            ),
            PipelineEvent::Warning { message } => {
                format!("{} {}", self.icon(Icon::Warning), message)
            }
            PipelineEvent::Completed { success, image } => {
                if *success {
                    format!(
                        "\n{} {}\n  {}",
                        self.icon(Icon::Success),
                        bold("Image ready", self.color),
                        image.display()
                    )
                } else {
                    format!("\n{} {}", self.icon(Icon::Error), bold("Build FAILED", self.color))
                }
            }
        };
        Some(line)
    }
}

impl PipelineEventSink for ConsoleEventSink {
    fn on_event(&self, event: PipelineEvent) {
        let Some(line) = self.render(&event) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}
