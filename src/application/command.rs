//! External command execution for stages
//!
//! Turns configured argv vectors into `CommandSpec`s and maps runner failures
//! and non-zero exits onto `StagehandError::CommandFailed`.

use std::path::Path;

use crate::domain::ports::{
    CommandOutput, CommandRunner, CommandSpec, PipelineEvent, PipelineEventSink,
};
use crate::domain::services::StageId;
use crate::error::{StagehandError, StagehandResult};

/// Lines of stderr carried into a failure message
const STDERR_TAIL_LINES: usize = 20;

/// Build a spec from configured argv, rejecting an empty command
pub(crate) fn spec_for(stage: StageId, argv: &[String], cwd: &Path) -> StagehandResult<CommandSpec> {
    CommandSpec::from_argv(argv, cwd).map_err(|e| StagehandError::CommandFailed {
        stage: stage.as_str().to_string(),
        command: argv.join(" "),
        message: e.to_string(),
    })
}

/// Run to completion; anything but exit code 0 is a failure
pub(crate) fn run_checked(
    runner: &dyn CommandRunner,
    stage: StageId,
    spec: &CommandSpec,
    events: &dyn PipelineEventSink,
) -> StagehandResult<CommandOutput> {
    let command = spec.display();
    events.on_event(PipelineEvent::CommandStarted {
        stage,
        command: command.clone(),
    });
    tracing::info!(stage = stage.as_str(), %command, "running command");

    let output = runner
        .run(spec)
        .map_err(|e| StagehandError::CommandFailed {
            stage: stage.as_str().to_string(),
            command: command.clone(),
            message: e.to_string(),
        })?;

    if output.success() {
        return Ok(output);
    }

    let status = match output.code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    let tail = output.stderr_tail(STDERR_TAIL_LINES);
    let message = if tail.trim().is_empty() {
        status
    } else {
        format!("{}\n{}", status, tail)
    };
    Err(StagehandError::CommandFailed {
        stage: stage.as_str().to_string(),
        command,
        message,
    })
}
