//! Project layout value object
//!
//! The one place that knows where backend manifests, backend source, static
//! assets and runtime state live. Every stage receives the same `ProjectLayout`
//! so resolver, assembler and launcher cannot disagree.
//!
//! Two conventions are supported:
//!
//! - `flat`: `backend/pyproject.toml` sits beside the backend source; the
//!   server is started from `backend/` and addressed as `main:app`.
//! - `root-manifest`: `pyproject.toml` sits at the project root with the backend
//!   as a `backend/` package; the server is started from the root and addressed
//!   as `backend.main:app`.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StagehandError, StagehandResult};

/// Python manifest file name
pub const PYPROJECT: &str = "pyproject.toml";
/// Python lock snapshot file name
pub const UV_LOCK: &str = "uv.lock";
/// Directory inside the runtime environment holding installed packages
pub const PACKAGES_DIR: &str = "packages";

/// Where the backend dependency manifest lives relative to the backend source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutConvention {
    /// Manifest colocated with the backend source
    #[default]
    Flat,
    /// Manifest at the project root, backend source in a subdirectory
    RootManifest,
}

impl LayoutConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutConvention::Flat => "flat",
            LayoutConvention::RootManifest => "root-manifest",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            LayoutConvention::Flat => LayoutConvention::RootManifest,
            LayoutConvention::RootManifest => LayoutConvention::Flat,
        }
    }

    /// Parse a user-supplied name (config file or environment)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Some(LayoutConvention::Flat),
            "root-manifest" | "root_manifest" | "root" => Some(LayoutConvention::RootManifest),
            _ => None,
        }
    }
}

impl fmt::Display for LayoutConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved project layout shared by every stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    convention: LayoutConvention,
    backend_dir: PathBuf,
    frontend_dir: PathBuf,
    frontend_output: PathBuf,
    entry_module: String,
    app_object: String,
    static_root: PathBuf,
    data_dirs: Vec<PathBuf>,
}

impl ProjectLayout {
    /// Layout with the defaults used by the reference project
    pub fn new(convention: LayoutConvention) -> Self {
        Self {
            convention,
            backend_dir: PathBuf::from("backend"),
            frontend_dir: PathBuf::from("frontend"),
            frontend_output: PathBuf::from("dist"),
            entry_module: "main".to_string(),
            app_object: "app".to_string(),
            static_root: PathBuf::from("../frontend/dist"),
            data_dirs: vec![PathBuf::from("data/conversations")],
        }
    }

    pub fn with_backend_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backend_dir = dir.into();
        self
    }

    pub fn with_frontend_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.frontend_dir = dir.into();
        self
    }

    pub fn with_frontend_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.frontend_output = dir.into();
        self
    }

    pub fn with_entry(mut self, module: impl Into<String>, app: impl Into<String>) -> Self {
        self.entry_module = module.into();
        self.app_object = app.into();
        self
    }

    /// Static root as the backend sees it, relative to the backend source dir
    pub fn with_static_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_root = path.into();
        self
    }

    /// Data dirs relative to the server's working directory
    pub fn with_data_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.data_dirs = dirs;
        self
    }

    pub fn convention(&self) -> LayoutConvention {
        self.convention
    }

    pub fn backend_dir(&self) -> &Path {
        &self.backend_dir
    }

    pub fn frontend_dir(&self) -> &Path {
        &self.frontend_dir
    }

    pub fn frontend_output(&self) -> &Path {
        &self.frontend_output
    }

    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    /// Directory holding the authoritative backend manifest under `root`
    pub fn backend_manifest_dir(&self, root: &Path) -> PathBuf {
        Self::manifest_dir_for(self.convention, root, &self.backend_dir)
    }

    /// The placement the other convention would use
    pub fn other_manifest_dir(&self, root: &Path) -> PathBuf {
        Self::manifest_dir_for(self.convention.other(), root, &self.backend_dir)
    }

    fn manifest_dir_for(convention: LayoutConvention, root: &Path, backend_dir: &Path) -> PathBuf {
        match convention {
            LayoutConvention::Flat => root.join(backend_dir),
            LayoutConvention::RootManifest => root.to_path_buf(),
        }
    }

    /// Working directory of the server process inside an image
    pub fn launch_dir(&self, image: &Path) -> PathBuf {
        self.backend_manifest_dir(image)
    }

    /// Module path of the backend application relative to `launch_dir`
    pub fn entry_module_path(&self) -> String {
        match self.convention {
            LayoutConvention::Flat => self.entry_module.clone(),
            LayoutConvention::RootManifest => {
                let mut parts: Vec<String> = self
                    .backend_dir
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect();
                parts.push(self.entry_module.clone());
                parts.join(".")
            }
        }
    }

    /// `module:object` address handed to the ASGI server
    pub fn entry_point(&self) -> String {
        format!("{}:{}", self.entry_module_path(), self.app_object)
    }

    /// Python file the entry point resolves to inside an image
    pub fn entry_file(&self, image: &Path) -> PathBuf {
        let module_file = self.entry_module.replace('.', "/") + ".py";
        image.join(&self.backend_dir).join(module_file)
    }

    /// Directory the backend serves static files from, inside an image
    pub fn static_root(&self, image: &Path) -> StagehandResult<PathBuf> {
        let raw = image.join(&self.backend_dir).join(&self.static_root);
        contained(image, &raw)
    }

    /// Where the frontend builder leaves its output, relative to the project root
    pub fn frontend_output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.frontend_dir).join(&self.frontend_output)
    }

    /// Persistent data directories inside an image
    pub fn data_dir_paths(&self, image: &Path) -> StagehandResult<Vec<PathBuf>> {
        let base = self.launch_dir(image);
        self.data_dirs
            .iter()
            .map(|d| contained(image, &base.join(d)))
            .collect()
    }

    /// Data directories that lie inside the backend tree, relative to it.
    /// Empty when the data dirs sit outside the backend (root-manifest layout).
    pub fn backend_data_dirs(&self, root: &Path) -> StagehandResult<Vec<PathBuf>> {
        let backend = normalize(&root.join(&self.backend_dir));
        Ok(self
            .data_dir_paths(root)?
            .iter()
            .filter_map(|d| d.strip_prefix(&backend).ok())
            .map(Path::to_path_buf)
            .collect())
    }

    /// Guess the convention from the manifests present under `root`
    pub fn detect(root: &Path, backend_dir: &Path) -> Option<LayoutConvention> {
        let flat = root.join(backend_dir).join(PYPROJECT).is_file();
        let rooted = root.join(PYPROJECT).is_file();
        match (flat, rooted) {
            (true, false) => Some(LayoutConvention::Flat),
            (false, true) => Some(LayoutConvention::RootManifest),
            _ => None,
        }
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self::new(LayoutConvention::default())
    }
}

/// Lexically normalize `path` and require it to stay under `root`.
pub fn contained(root: &Path, path: &Path) -> StagehandResult<PathBuf> {
    let normalized = normalize(path);
    let normalized_root = normalize(root);
    if normalized.starts_with(&normalized_root) {
        Ok(normalized)
    } else {
        Err(StagehandError::PathEscape {
            path: normalized,
            root: normalized_root,
        })
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
