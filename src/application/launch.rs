//! Runtime Launcher
//!
//! Resolves the launch configuration of an assembled image and starts the
//! backend server. The port is the only runtime setting: it is read from the
//! environment here, never at build time.

#[cfg(unix)]
use std::convert::Infallible;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::RuntimeConfig;
use crate::domain::ports::CommandSpec;
use crate::domain::value_objects::{resolve_port, Port, ProjectLayout, PACKAGES_DIR};
use crate::error::{StagehandError, StagehandResult};
#[cfg(unix)]
use crate::infrastructure::process::exec_server;
use crate::infrastructure::process::{spawn_server, ServerProcess};
use crate::infrastructure::repositories::image_manifest::{self, MARKER_PATH};

/// Where the port came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSource {
    Env,
    Default,
}

/// Fully resolved server invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub image: PathBuf,
    pub entry_point: String,
    pub port: Port,
    pub port_source: PortSource,
    pub cwd: PathBuf,
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl LaunchPlan {
    pub fn command_spec(&self) -> StagehandResult<CommandSpec> {
        let spec =
            CommandSpec::from_argv(&self.argv, &self.cwd).map_err(|e| StagehandError::LaunchFailed {
                command: self.argv.join(" "),
                message: e.to_string(),
            })?;
        Ok(self
            .env
            .iter()
            .fold(spec, |spec, (key, value)| spec.env(key.as_str(), value.as_str())))
    }
}

/// Resolve the launch plan for `image`, reading variables through `lookup`
pub fn plan_launch<F>(
    image: &Path,
    layout: &ProjectLayout,
    runtime: &RuntimeConfig,
    lookup: F,
) -> StagehandResult<LaunchPlan>
where
    F: Fn(&str) -> Option<String>,
{
    let manifest = image_manifest::load(image)?.ok_or_else(|| StagehandError::ImageNotReady {
        image: image.to_path_buf(),
        reason: format!("{} is missing; run `stagehand build` first", MARKER_PATH),
    })?;

    if manifest.convention != layout.convention() {
        return Err(StagehandError::LayoutMismatch {
            convention: layout.convention(),
            expected: layout.launch_dir(image),
            hint: format!(
                " (image was assembled with layout '{}')",
                manifest.convention
            ),
        });
    }
    let entry_point = layout.entry_point();
    if manifest.entry_point != entry_point {
        return Err(StagehandError::ImageNotReady {
            image: image.to_path_buf(),
            reason: format!(
                "assembled for entry point '{}', configured '{}'",
                manifest.entry_point, entry_point
            ),
        });
    }

    let entry_file = layout.entry_file(image);
    if !entry_file.is_file() {
        return Err(StagehandError::MissingEntryPoint {
            entry: entry_point,
            file: entry_file,
        });
    }

    let override_value = lookup(&runtime.port_env);
    let port = resolve_port(override_value.as_deref(), manifest.default_port)?;
    let port_source = match override_value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => PortSource::Env,
        _ => PortSource::Default,
    };

    let mut argv = runtime.server.clone();
    argv.extend([
        entry_point.clone(),
        "--host".to_string(),
        runtime.host.clone(),
        "--port".to_string(),
        port.to_string(),
    ]);

    let packages = image.join(PACKAGES_DIR);
    let python_path = match lookup("PYTHONPATH").filter(|p| !p.is_empty()) {
        Some(existing) => {
            let mut paths = vec![packages];
            paths.extend(std::env::split_paths(&existing));
            std::env::join_paths(paths)
                .map(|joined| joined.to_string_lossy().into_owned())
                .map_err(|e| StagehandError::LaunchFailed {
                    command: argv.join(" "),
                    message: format!("cannot build PYTHONPATH: {}", e),
                })?
        }
        None => packages.to_string_lossy().into_owned(),
    };

    Ok(LaunchPlan {
        image: image.to_path_buf(),
        entry_point,
        port,
        port_source,
        cwd: layout.launch_dir(image),
        argv,
        env: vec![("PYTHONPATH".to_string(), python_path)],
    })
}

/// Run the server described by `plan` in place of this process
#[cfg(unix)]
pub fn exec(plan: &LaunchPlan) -> StagehandResult<Infallible> {
    let spec = plan.command_spec()?;
    let err = exec_server(&spec);
    Err(StagehandError::LaunchFailed {
        command: spec.display(),
        message: err.to_string(),
    })
}

/// Start the server described by `plan` as a child process
pub fn launch(plan: &LaunchPlan) -> StagehandResult<ServerProcess> {
    let spec = plan.command_spec()?;
    spawn_server(&spec).map_err(|e| StagehandError::LaunchFailed {
        command: spec.display(),
        message: e.to_string(),
    })
}
