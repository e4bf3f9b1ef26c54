//! CommandRunner port - abstraction over external build tools
//!
//! npm, pip and friends are invoked through this trait so stages can be
//! exercised in tests without the real tools or the network.

use std::path::{Path, PathBuf};

/// Result type for command execution
pub type RunResult<T> = Result<T, RunnerError>;

/// Command execution errors
#[derive(Debug)]
pub enum RunnerError {
    /// The program could not be started at all
    Spawn { program: String, source: std::io::Error },
    /// Empty argv
    EmptyCommand,
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::Spawn { program, source } => {
                write!(f, "could not start '{}': {}", program, source)
            }
            RunnerError::EmptyCommand => write!(f, "empty command"),
        }
    }
}

impl std::error::Error for RunnerError {}

/// A fully specified external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Build from an argv vector (`["npm", "run", "build"]`)
    pub fn from_argv(argv: &[String], cwd: &Path) -> RunResult<Self> {
        let (program, args) = argv.split_first().ok_or(RunnerError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering for logs and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{}'", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured outcome of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Last few stderr lines, for error messages
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.stderr.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Runs external commands to completion
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> RunResult<CommandOutput>;
}
