//! Error types for Stagehand
//!
//! Library code returns `StagehandResult`; the binary wraps these in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::value_objects::LayoutConvention;

/// Result type alias for Stagehand operations
pub type StagehandResult<T> = Result<T, StagehandError>;

/// Main error type for Stagehand operations
#[derive(Error, Debug)]
pub enum StagehandError {
    /// Dependency manifest could not be parsed
    #[error("invalid manifest {file}: {message}")]
    ManifestParse { file: PathBuf, message: String },

    /// Lock snapshot could not be parsed
    #[error("invalid lock snapshot {file}: {message}")]
    LockParse { file: PathBuf, message: String },

    /// Lock snapshot does not describe the manifest next to it
    #[error("lock snapshot {lock} is out of date with {manifest}: {details}")]
    LockMismatch {
        manifest: PathBuf,
        lock: PathBuf,
        details: String,
    },

    /// Installed packages differ from the pinned versions
    #[error("installed packages do not match {lock}: {details}")]
    LockDrift { lock: PathBuf, details: String },

    /// The authoritative manifest for the configured layout is missing
    #[error("no backend manifest at {expected} for layout '{convention}'{hint}")]
    LayoutMismatch {
        convention: LayoutConvention,
        expected: PathBuf,
        hint: String,
    },

    /// Both manifest placements exist and disagree
    #[error("conflicting backend manifests: {authoritative} and {stale} declare different dependencies")]
    AmbiguousManifest {
        authoritative: PathBuf,
        stale: PathBuf,
    },

    /// An external tool exited unsuccessfully or could not be spawned
    #[error("{stage}: command `{command}` failed: {message}")]
    CommandFailed {
        stage: String,
        command: String,
        message: String,
    },

    /// The frontend build produced nothing
    #[error("frontend build produced no files in {path}")]
    EmptyArtifact { path: PathBuf },

    /// Path escapes the image or project boundary
    #[error("path '{path}' escapes boundary '{root}'")]
    PathEscape { path: PathBuf, root: PathBuf },

    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// The image has not been fully assembled
    #[error("image at {image} is not ready: {reason}")]
    ImageNotReady { image: PathBuf, reason: String },

    /// The launcher's entry point does not exist in the image
    #[error("entry point '{entry}' not found: expected {file}")]
    MissingEntryPoint { entry: String, file: PathBuf },

    /// Port value could not be used
    #[error("invalid port '{value}': {reason}")]
    InvalidPort { value: String, reason: String },

    /// Server process could not be started
    #[error("failed to launch `{command}`: {message}")]
    LaunchFailed { command: String, message: String },

    /// Stage graph is not a valid DAG
    #[error("invalid stage graph: {0}")]
    StageGraph(String),

    /// Another build holds the pipeline lock
    #[error("pipeline lock {path} is held by another build")]
    PipelineLocked { path: PathBuf },

    /// Configuration file could not be parsed
    #[error("invalid config {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagehandError {
    /// Short category label used in events and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            StagehandError::ManifestParse { .. }
            | StagehandError::LockParse { .. }
            | StagehandError::LockMismatch { .. }
            | StagehandError::LockDrift { .. } => "dependency",
            StagehandError::LayoutMismatch { .. }
            | StagehandError::AmbiguousManifest { .. }
            | StagehandError::PathEscape { .. }
            | StagehandError::MissingEntryPoint { .. } => "layout",
            StagehandError::CommandFailed { .. } | StagehandError::EmptyArtifact { .. } => "build",
            StagehandError::ImageNotReady { .. }
            | StagehandError::InvalidPort { .. }
            | StagehandError::LaunchFailed { .. } => "launch",
            StagehandError::StageGraph(_)
            | StagehandError::PipelineLocked { .. }
            | StagehandError::InvalidConfig { .. } => "config",
            StagehandError::DirectoryNotFound { .. } | StagehandError::Io(_) => "io",
        }
    }
}
