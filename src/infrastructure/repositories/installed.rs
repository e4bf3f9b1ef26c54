//! Installed package discovery
//!
//! Reads the installed-version set of a `--target` install by scanning its
//! `*.dist-info` directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::domain::entities::InstalledSet;
use crate::domain::value_objects::PackageName;
use crate::error::StagehandResult;

/// Scan `packages_dir` for installed distributions. A missing dir is an empty set.
pub fn scan_installed(packages_dir: &Path) -> StagehandResult<InstalledSet> {
    let mut installed = BTreeMap::new();
    if !packages_dir.is_dir() {
        return Ok(InstalledSet::new(installed));
    }

    for entry in fs::read_dir(packages_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        let Some(stem) = file_name.strip_suffix(".dist-info") else {
            continue;
        };
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let from_metadata = read_metadata(&entry.path().join("METADATA"));
        let parsed = from_metadata.or_else(|| {
            stem.rsplit_once('-')
                .map(|(name, version)| (name.to_string(), version.to_string()))
        });
        if let Some((name, version)) = parsed {
            installed.insert(PackageName::python(&name).as_str().to_string(), version);
        }
    }

    Ok(InstalledSet::new(installed))
}

/// `Name:` and `Version:` headers of a core metadata file
fn read_metadata(path: &Path) -> Option<(String, String)> {
    let content = fs::read_to_string(path).ok()?;
    let mut name = None;
    let mut version = None;
    for line in content.lines() {
        if line.is_empty() {
            break;
        }
        if let Some(v) = line.strip_prefix("Name:") {
            name = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("Version:") {
            version = Some(v.trim().to_string());
        }
    }
    Some((name?, version?))
}
