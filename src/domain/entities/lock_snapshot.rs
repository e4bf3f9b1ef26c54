//! Lock snapshot entity - pinned dependency versions
//!
//! A lock snapshot records (a) the dependency declarations it was resolved
//! from and (b) the exact versions chosen. The first half is compared against
//! the manifest to detect staleness; the second half is what gets installed.
//!
//! For `uv.lock` only the runtime dependency closure of the project is
//! pinned. Development groups are never walked, and a package reached only
//! through marker-guarded edges keeps those markers so the installer can
//! decide whether it applies to the target platform.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::manifest::{DependencyManifest, Ecosystem};
use crate::domain::value_objects::{ContentHash, PackageName, Requirement};
use crate::error::{StagehandError, StagehandResult};

/// Parsed `uv.lock` or `package-lock.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSnapshot {
    ecosystem: Ecosystem,
    path: PathBuf,
    declared: Vec<Requirement>,
    pins: BTreeMap<String, String>,
    /// Environment markers for pins that apply only on some platforms
    markers: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct UvLock {
    #[serde(default)]
    package: Vec<UvPackage>,
}

#[derive(Deserialize)]
struct UvPackage {
    name: String,
    version: Option<String>,
    #[serde(default)]
    source: BTreeMap<String, toml::Value>,
    #[serde(default)]
    dependencies: Vec<UvDependency>,
    #[serde(default, rename = "optional-dependencies")]
    optional_dependencies: BTreeMap<String, Vec<UvDependency>>,
    #[serde(default)]
    metadata: Option<UvMetadata>,
}

/// Edge of the resolved graph
#[derive(Deserialize)]
struct UvDependency {
    name: String,
    #[serde(default)]
    extra: Vec<String>,
    marker: Option<String>,
}

#[derive(Deserialize)]
struct UvMetadata {
    #[serde(default, rename = "requires-dist")]
    requires_dist: Vec<UvRequirement>,
}

#[derive(Deserialize)]
struct UvRequirement {
    name: String,
    #[serde(default)]
    extras: Vec<String>,
    specifier: Option<String>,
    marker: Option<String>,
}

impl UvPackage {
    /// The project itself is recorded with a local `.` source
    fn is_project_root(&self) -> bool {
        ["virtual", "editable"].iter().any(|key| {
            self.source
                .get(*key)
                .and_then(|v| v.as_str())
                .is_some_and(|p| p == ".")
        })
    }
}

/// Conditions under which a package is needed: a disjunction of conjunctions
/// of marker expressions. An empty conjunction means "always".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Reach(BTreeSet<BTreeSet<String>>);

impl Reach {
    fn always() -> Self {
        Self(BTreeSet::from([BTreeSet::new()]))
    }

    fn is_always(&self) -> bool {
        self.0.iter().any(BTreeSet::is_empty)
    }

    /// This reach narrowed by an edge marker
    fn through(&self, marker: Option<&str>) -> Self {
        let Some(marker) = marker.map(str::trim).filter(|m| !m.is_empty()) else {
            return self.clone();
        };
        Self(
            self.0
                .iter()
                .map(|conj| {
                    let mut conj = conj.clone();
                    conj.insert(marker.to_string());
                    conj
                })
                .collect(),
        )
    }

    /// Merge `other` in; true when anything new was added
    fn absorb(&mut self, other: Reach) -> bool {
        if self.is_always() {
            return false;
        }
        if other.is_always() {
            *self = Self::always();
            return true;
        }
        let before = self.0.len();
        self.0.extend(other.0);
        self.0.len() != before
    }

    /// PEP 508 marker text, or `None` when unconditional
    fn marker(&self) -> Option<String> {
        if self.is_always() || self.0.is_empty() {
            return None;
        }
        let conjunctions: Vec<String> = self
            .0
            .iter()
            .map(|conj| {
                if conj.len() == 1 {
                    conj.iter().cloned().collect()
                } else {
                    conj.iter()
                        .map(|m| format!("({})", m))
                        .collect::<Vec<_>>()
                        .join(" and ")
                }
            })
            .collect();
        if conjunctions.len() == 1 {
            return conjunctions.into_iter().next();
        }
        Some(
            conjunctions
                .iter()
                .map(|c| format!("({})", c))
                .collect::<Vec<_>>()
                .join(" or "),
        )
    }
}

/// Walk the runtime graph from `root`, skipping development groups
fn runtime_closure<'a>(
    root: &'a UvPackage,
    packages: &BTreeMap<String, &'a UvPackage>,
) -> BTreeMap<String, Reach> {
    let mut reach: BTreeMap<String, Reach> = BTreeMap::new();
    let mut extras: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut queue: VecDeque<(&UvDependency, Reach)> = root
        .dependencies
        .iter()
        .map(|edge| (edge, Reach::always()))
        .collect();

    while let Some((edge, parent)) = queue.pop_front() {
        let name = PackageName::python(&edge.name).as_str().to_string();
        let Some(&package) = packages.get(&name) else {
            continue;
        };
        let entry = reach.entry(name.clone()).or_default();
        let grew = entry.absorb(parent.through(edge.marker.as_deref()));
        let requested = extras.entry(name).or_default();
        let mut new_extras = false;
        for extra in &edge.extra {
            new_extras |= requested.insert(extra.clone());
        }
        if !grew && !new_extras {
            continue;
        }

        let current = entry.clone();
        let optional = requested
            .iter()
            .filter_map(|x| package.optional_dependencies.get(x))
            .flatten();
        for next in package.dependencies.iter().chain(optional) {
            queue.push_back((next, current.clone()));
        }
    }
    reach
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageLock {
    lockfile_version: Option<u32>,
    #[serde(default)]
    packages: BTreeMap<String, PackageLockEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageLockEntry {
    version: Option<String>,
    #[serde(default)]
    link: bool,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, String>,
}

impl LockSnapshot {
    pub fn new(
        ecosystem: Ecosystem,
        path: impl Into<PathBuf>,
        mut declared: Vec<Requirement>,
        pins: BTreeMap<String, String>,
    ) -> Self {
        declared.sort_by_key(|r| r.fingerprint());
        Self {
            ecosystem,
            path: path.into(),
            declared,
            pins,
            markers: BTreeMap::new(),
        }
    }

    /// Attach environment markers to some of the pins
    pub fn with_markers(mut self, markers: BTreeMap<String, String>) -> Self {
        self.markers = markers;
        self
    }

    /// Parse `uv.lock` content
    pub fn from_uv_lock(path: &Path, content: &str) -> StagehandResult<Self> {
        let parse_err = |message: String| StagehandError::LockParse {
            file: path.to_path_buf(),
            message,
        };
        let lock: UvLock = toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;

        let root = lock
            .package
            .iter()
            .find(|p| p.is_project_root())
            .ok_or_else(|| parse_err("no project entry with source '.'".to_string()))?;

        let declared = root
            .metadata
            .as_ref()
            .map(|m| {
                m.requires_dist
                    .iter()
                    .map(|r| {
                        Requirement::from_parts(
                            &r.name,
                            r.extras.clone(),
                            r.specifier.as_deref(),
                            r.marker.as_deref(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut packages: BTreeMap<String, &UvPackage> = BTreeMap::new();
        for package in lock.package.iter().filter(|p| !p.is_project_root()) {
            if package.version.is_none() {
                continue;
            }
            let name = PackageName::python(&package.name).as_str().to_string();
            if let Some(previous) = packages.insert(name.clone(), package) {
                if previous.version != package.version {
                    return Err(parse_err(format!(
                        "package '{}' is pinned to both {} and {}; forked resolutions are not supported",
                        name,
                        previous.version.as_deref().unwrap_or_default(),
                        package.version.as_deref().unwrap_or_default()
                    )));
                }
            }
        }

        let mut pins = BTreeMap::new();
        let mut markers = BTreeMap::new();
        for (name, reach) in runtime_closure(root, &packages) {
            let Some(version) = packages.get(&name).and_then(|p| p.version.clone()) else {
                continue;
            };
            if let Some(marker) = reach.marker() {
                markers.insert(name.clone(), marker);
            }
            pins.insert(name, version);
        }

        Ok(Self::new(Ecosystem::Python, path, declared, pins).with_markers(markers))
    }

    /// Parse `package-lock.json` content (lockfile version 2 or 3)
    pub fn from_package_lock(path: &Path, content: &str) -> StagehandResult<Self> {
        let parse_err = |message: String| StagehandError::LockParse {
            file: path.to_path_buf(),
            message,
        };
        let lock: PackageLock =
            serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?;

        match lock.lockfile_version {
            Some(v) if v >= 2 => {}
            other => {
                return Err(parse_err(format!(
                    "unsupported lockfileVersion {:?}; regenerate with npm 7 or newer",
                    other
                )))
            }
        }

        let root = lock
            .packages
            .get("")
            .ok_or_else(|| parse_err("missing root entry in \"packages\"".to_string()))?;
        let declared = root
            .dependencies
            .iter()
            .chain(root.dev_dependencies.iter())
            .chain(root.optional_dependencies.iter())
            .map(|(name, range)| Requirement::npm(name, range))
            .collect();

        let pins = lock
            .packages
            .iter()
            .filter(|(key, entry)| !key.is_empty() && !entry.link)
            .filter_map(|(key, entry)| entry.version.clone().map(|v| (key.clone(), v)))
            .collect();

        Ok(Self::new(Ecosystem::Npm, path, declared, pins))
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dependency declarations the snapshot was resolved from
    pub fn declared(&self) -> &[Requirement] {
        &self.declared
    }

    /// Pinned versions keyed by package (Python) or install path (npm)
    pub fn pins(&self) -> &BTreeMap<String, String> {
        &self.pins
    }

    /// Environment marker guarding `name`, if it is not needed everywhere
    pub fn marker(&self, name: &str) -> Option<&str> {
        self.markers.get(name).map(String::as_str)
    }

    /// Digest of the pinned set
    pub fn digest(&self) -> ContentHash {
        let lines = self.pinned_requirements();
        ContentHash::from_entries(
            self.pins
                .keys()
                .zip(lines.iter())
                .map(|(name, line)| (name.as_str(), line.as_bytes())),
        )
    }

    /// `name==version[ ; marker]` lines for a `--no-deps` install, sorted
    pub fn pinned_requirements(&self) -> Vec<String> {
        self.pins
            .iter()
            .map(|(name, version)| match self.markers.get(name) {
                Some(marker) => format!("{}=={} ; {}", name, version, marker),
                None => format!("{}=={}", name, version),
            })
            .collect()
    }

    /// Fail unless this snapshot was resolved from exactly `manifest`'s dependencies.
    pub fn verify_against(&self, manifest: &DependencyManifest) -> StagehandResult<()> {
        let diff = LockDiff::between(manifest.requirements(), &self.declared);
        if diff.is_empty() {
            return Ok(());
        }
        Err(StagehandError::LockMismatch {
            manifest: manifest.path().to_path_buf(),
            lock: self.path.clone(),
            details: diff.to_string(),
        })
    }
}

/// Difference between manifest declarations and lock declarations
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LockDiff {
    /// Declared in the manifest, absent from the lock
    pub added: BTreeSet<String>,
    /// Recorded in the lock, no longer declared
    pub removed: BTreeSet<String>,
    /// Same package, different constraint
    pub changed: BTreeSet<String>,
}

impl LockDiff {
    pub fn between(manifest: &[Requirement], lock: &[Requirement]) -> Self {
        let by_name = |reqs: &[Requirement]| -> BTreeMap<String, BTreeSet<String>> {
            let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
            for r in reqs {
                map.entry(r.name().as_str().to_string())
                    .or_default()
                    .insert(r.fingerprint());
            }
            map
        };
        let wanted = by_name(manifest);
        let locked = by_name(lock);

        let mut diff = LockDiff::default();
        for (name, prints) in &wanted {
            match locked.get(name) {
                None => {
                    diff.added.insert(name.clone());
                }
                Some(other) if other != prints => {
                    diff.changed.insert(name.clone());
                }
                Some(_) => {}
            }
        }
        for name in locked.keys() {
            if !wanted.contains_key(name) {
                diff.removed.insert(name.clone());
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl std::fmt::Display for LockDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        let sections = [
            ("added", &self.added),
            ("removed", &self.removed),
            ("changed", &self.changed),
        ];
        for (label, names) in sections {
            if !names.is_empty() {
                let list: Vec<&str> = names.iter().map(String::as_str).collect();
                parts.push(format!("{}: {}", label, list.join(", ")));
            }
        }
        write!(f, "{}", parts.join("; "))
    }
}
