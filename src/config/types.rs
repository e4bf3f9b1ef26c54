//! Configuration type definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{LayoutConvention, Port, ProjectLayout};
use crate::error::StagehandResult;

use super::loader::{self, ConfigWarning};

/// Config file name looked up at the project root
pub const CONFIG_FILE: &str = "stagehand.toml";

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Where things live in the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub convention: LayoutConvention,

    #[serde(default = "default_backend_dir")]
    pub backend_dir: PathBuf,

    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            convention: LayoutConvention::default(),
            backend_dir: default_backend_dir(),
            frontend_dir: default_frontend_dir(),
        }
    }
}

fn default_backend_dir() -> PathBuf {
    PathBuf::from("backend")
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend")
}

/// Frontend builder commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Install command when a lock snapshot is present
    #[serde(default = "default_frontend_install")]
    pub install: Vec<String>,

    /// Install command when no lock snapshot exists
    #[serde(default = "default_frontend_install_unlocked")]
    pub install_unlocked: Vec<String>,

    #[serde(default = "default_frontend_build")]
    pub build: Vec<String>,

    /// Build output, relative to the frontend dir
    #[serde(default = "default_frontend_output")]
    pub output_dir: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            install: default_frontend_install(),
            install_unlocked: default_frontend_install_unlocked(),
            build: default_frontend_build(),
            output_dir: default_frontend_output(),
        }
    }
}

fn default_frontend_install() -> Vec<String> {
    argv(&["npm", "ci"])
}

fn default_frontend_install_unlocked() -> Vec<String> {
    argv(&["npm", "install"])
}

fn default_frontend_build() -> Vec<String> {
    argv(&["npm", "run", "build"])
}

fn default_frontend_output() -> PathBuf {
    PathBuf::from("dist")
}

/// Backend resolver and application addressing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Installer argv; `--target`, `--no-deps` and `-r` are appended
    #[serde(default = "default_installer")]
    pub installer: Vec<String>,

    #[serde(default = "default_entry_module")]
    pub entry_module: String,

    #[serde(default = "default_app_object")]
    pub app_object: String,

    /// Directory the backend serves static files from, relative to the backend dir
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            installer: default_installer(),
            entry_module: default_entry_module(),
            app_object: default_app_object(),
            static_root: default_static_root(),
        }
    }
}

fn default_installer() -> Vec<String> {
    argv(&["python3", "-m", "pip", "install", "--disable-pip-version-check"])
}

fn default_entry_module() -> String {
    "main".to_string()
}

fn default_app_object() -> String {
    "app".to_string()
}

fn default_static_root() -> PathBuf {
    PathBuf::from("../frontend/dist")
}

/// Runtime launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Mutable state dirs, relative to the server's working directory
    #[serde(default = "default_data_dirs")]
    pub data_dirs: Vec<PathBuf>,

    /// Environment variable read at launch time
    #[serde(default = "default_port_env")]
    pub port_env: String,

    #[serde(default)]
    pub default_port: Port,

    #[serde(default = "default_host")]
    pub host: String,

    /// Server argv; entry point, `--host` and `--port` are appended
    #[serde(default = "default_server")]
    pub server: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dirs: default_data_dirs(),
            port_env: default_port_env(),
            default_port: Port::DEFAULT,
            host: default_host(),
            server: default_server(),
        }
    }
}

fn default_data_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("data/conversations")]
}

fn default_port_env() -> String {
    "PORT".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server() -> Vec<String> {
    argv(&["python3", "-m", "uvicorn"])
}

/// Pipeline execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stage workspaces and the pipeline lock, relative to the project root
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Assembled image, relative to the project root
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Run independent stages concurrently
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            image_dir: default_image_dir(),
            parallel: true,
        }
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".stagehand/work")
}

fn default_image_dir() -> PathBuf {
    PathBuf::from(".stagehand/image")
}

fn default_true() -> bool {
    true
}

/// Full Stagehand configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub frontend: FrontendConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> StagehandResult<Self> {
        loader::load_with_warnings(path).map(|(config, _)| config)
    }

    /// Load configuration and collect unknown-key warnings
    pub fn load_with_warnings(path: &Path) -> StagehandResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// `stagehand.toml` under `project_root` if present, defaults otherwise; env applied last
    pub fn load_or_default(project_root: &Path) -> StagehandResult<(Self, Vec<ConfigWarning>)> {
        loader::load_or_default(project_root)
    }

    /// The single layout value every stage receives
    pub fn project_layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.layout.convention)
            .with_backend_dir(&self.layout.backend_dir)
            .with_frontend_dir(&self.layout.frontend_dir)
            .with_frontend_output(&self.frontend.output_dir)
            .with_entry(&self.backend.entry_module, &self.backend.app_object)
            .with_static_root(&self.backend.static_root)
            .with_data_dirs(self.runtime.data_dirs.clone())
    }

    pub fn work_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.pipeline.work_dir)
    }

    pub fn image_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.pipeline.image_dir)
    }
}
