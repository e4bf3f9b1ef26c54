//! Dependency manifest entity
//!
//! A parsed `package.json` or `pyproject.toml`. Only the declared dependency
//! set matters here; everything else in those files belongs to the package
//! managers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::value_objects::Requirement;
use crate::error::{StagehandError, StagehandResult};

/// Which package manager a manifest belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Npm,
    Python,
}

impl Ecosystem {
    pub fn manifest_file(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "package.json",
            Ecosystem::Python => "pyproject.toml",
        }
    }

    pub fn lock_file(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "package-lock.json",
            Ecosystem::Python => "uv.lock",
        }
    }
}

/// Declared dependencies of one source bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyManifest {
    ecosystem: Ecosystem,
    path: PathBuf,
    name: Option<String>,
    requirements: Vec<Requirement>,
}

#[derive(Deserialize)]
struct PyProject {
    #[serde(default)]
    project: Option<PyProjectTable>,
}

#[derive(Deserialize)]
struct PyProjectTable {
    name: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, String>,
}

impl DependencyManifest {
    pub fn new(
        ecosystem: Ecosystem,
        path: impl Into<PathBuf>,
        name: Option<String>,
        mut requirements: Vec<Requirement>,
    ) -> Self {
        requirements.sort_by_key(|r| r.fingerprint());
        Self {
            ecosystem,
            path: path.into(),
            name,
            requirements,
        }
    }

    /// Parse `pyproject.toml` content
    pub fn from_pyproject(path: &Path, content: &str) -> StagehandResult<Self> {
        let parsed: PyProject =
            toml::from_str(content).map_err(|e| StagehandError::ManifestParse {
                file: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let project = parsed.project.ok_or_else(|| StagehandError::ManifestParse {
            file: path.to_path_buf(),
            message: "missing [project] table".to_string(),
        })?;

        let mut requirements = Vec::with_capacity(project.dependencies.len());
        for raw in &project.dependencies {
            let req = Requirement::parse_pep508(raw).ok_or_else(|| {
                StagehandError::ManifestParse {
                    file: path.to_path_buf(),
                    message: format!("unreadable requirement '{}'", raw),
                }
            })?;
            requirements.push(req);
        }

        Ok(Self::new(Ecosystem::Python, path, project.name, requirements))
    }

    /// Parse `package.json` content
    pub fn from_package_json(path: &Path, content: &str) -> StagehandResult<Self> {
        let parsed: PackageJson =
            serde_json::from_str(content).map_err(|e| StagehandError::ManifestParse {
                file: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let requirements = parsed
            .dependencies
            .iter()
            .chain(parsed.dev_dependencies.iter())
            .chain(parsed.optional_dependencies.iter())
            .map(|(name, range)| Requirement::npm(name, range))
            .collect();
        Ok(Self::new(Ecosystem::Npm, path, parsed.name, requirements))
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Comparable form of the declared dependency set
    pub fn fingerprints(&self) -> BTreeSet<String> {
        self.requirements.iter().map(|r| r.fingerprint()).collect()
    }

    /// True when both manifests declare the same dependencies
    pub fn same_dependencies(&self, other: &DependencyManifest) -> bool {
        self.fingerprints() == other.fingerprints()
    }
}
