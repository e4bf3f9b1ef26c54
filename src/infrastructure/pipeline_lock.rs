//! Exclusive pipeline lock
//!
//! Two builds writing the same work and image directories would interleave
//! their copies. The lock file lives in the work directory and is held for
//! the whole build.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{StagehandError, StagehandResult};

pub const LOCK_FILE: &str = "pipeline.lock";

/// Held for as long as the value lives
#[derive(Debug)]
pub struct PipelineLock {
    file: File,
    path: PathBuf,
}

impl PipelineLock {
    /// Acquire the lock in `work_dir`, failing fast if another build holds it
    pub fn acquire(work_dir: &Path) -> StagehandResult<Self> {
        fs::create_dir_all(work_dir)?;
        let path = work_dir.join(LOCK_FILE);
        let file = File::create(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| StagehandError::PipelineLocked { path: path.clone() })?;
        tracing::debug!(path = %path.display(), "pipeline lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PipelineLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
