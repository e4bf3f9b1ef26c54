//! Command handlers
//!
//! Each handler returns the process exit code; `main` turns errors into
//! a message (text) or an `error` event (JSON).

mod build;
mod check;
mod launch;
mod plan;
mod project_root;

pub use build::{cmd_build, cmd_up};
pub use check::cmd_check;
pub use launch::cmd_launch;
pub use plan::cmd_plan;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use serde_json::json;

use stagehand::config::{with_env_overrides, Config, ConfigWarning};
use stagehand::presentation::output::write_event;
use stagehand::presentation::theme::Icon;
use stagehand::presentation::{Cli, UiContext};

use project_root::discover_project_root;

/// Everything a command needs from the global flags
pub struct Session {
    pub project_root: PathBuf,
    pub config: Config,
    pub ui: UiContext,
}

impl Session {
    pub fn open(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot read the current directory")?;
        let project_root = match &cli.project {
            Some(dir) => absolute(&cwd, dir),
            None => discover_project_root(&cwd),
        };

        let (config, warnings) = match &cli.config {
            Some(file) => {
                let (config, warnings) = Config::load_with_warnings(&absolute(&cwd, file))?;
                (with_env_overrides(config)?, warnings)
            }
            None => Config::load_or_default(&project_root)?,
        };

        let ui = UiContext::new(cli.json, cli.verbose, cli.color);
        let session = Self {
            project_root,
            config,
            ui,
        };
        session.report_config_warnings(&warnings);
        tracing::debug!(project = %session.project_root.display(), "session opened");
        Ok(session)
    }

    fn report_config_warnings(&self, warnings: &[ConfigWarning]) {
        for warning in warnings {
            if self.ui.json {
                let mut out = std::io::stdout().lock();
                let _ = write_event(
                    &mut out,
                    &json!({
                        "event": "warning",
                        "kind": "config",
                        "message": warning.to_string(),
                    }),
                );
            } else {
                eprintln!(
                    "{} {}",
                    Icon::Warning.colored(self.ui.color, self.ui.unicode),
                    warning
                );
            }
        }
    }

    /// `--out`/`--image` relative to the invocation directory, else the configured image dir
    pub fn image_dir(&self, flag: Option<&Path>) -> Result<PathBuf> {
        match flag {
            Some(dir) => Ok(absolute(&std::env::current_dir()?, dir)),
            None => Ok(self.config.image_dir(&self.project_root)),
        }
    }
}

/// Exit code after Ctrl+C, as a shell would report SIGINT
pub(crate) const INTERRUPTED_EXIT: i32 = 130;

/// Process-wide Ctrl+C flag. The handler is installed on first use, since
/// `ctrlc` allows only one per process.
pub(crate) fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();
    if let Some(flag) = FLAG.get() {
        return Ok(Arc::clone(flag));
    }
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || handler_flag.store(true, std::sync::atomic::Ordering::SeqCst))
        .context("failed to install the interrupt handler")?;
    Ok(Arc::clone(FLAG.get_or_init(|| flag)))
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
