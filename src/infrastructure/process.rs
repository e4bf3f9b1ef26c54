//! System process execution
//!
//! `SystemRunner` implements the CommandRunner port with `std::process`.
//! `spawn_server` starts the long-running backend process for the launcher.

use std::process::{Child, Command, ExitStatus, Stdio};

use crate::domain::ports::{CommandOutput, CommandRunner, CommandSpec, RunResult, RunnerError};

/// Runs commands on the host, capturing output
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

fn command_for(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).current_dir(&spec.cwd);
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }
    cmd
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> RunResult<CommandOutput> {
        tracing::debug!(command = %spec.display(), cwd = %spec.cwd.display(), "running");

        let output = command_for(spec)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunnerError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(command = %spec.display(), code = ?result.code, "finished");
        Ok(result)
    }
}

/// Handle to a started server process
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
}

impl ServerProcess {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Block until the server exits
    pub fn wait(mut self) -> std::io::Result<ExitStatus> {
        self.child.wait()
    }

    /// Non-blocking exit check
    pub fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    pub fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill()
    }
}

/// Start the server in the foreground: stdio is inherited so its logs reach
/// whatever supervises this process.
pub fn spawn_server(spec: &CommandSpec) -> RunResult<ServerProcess> {
    tracing::info!(command = %spec.display(), cwd = %spec.cwd.display(), "starting server");
    let child = command_for(spec)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| RunnerError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
    Ok(ServerProcess { child })
}

/// Replace this process with the server, keeping its pid. Signals sent to
/// the launcher (such as a container runtime's SIGTERM) then reach the
/// server directly. Only returns when the exec itself fails.
#[cfg(unix)]
pub fn exec_server(spec: &CommandSpec) -> RunnerError {
    use std::os::unix::process::CommandExt;

    tracing::info!(command = %spec.display(), cwd = %spec.cwd.display(), "exec server");
    let source = command_for(spec).exec();
    RunnerError::Spawn {
        program: spec.program.clone(),
        source,
    }
}
