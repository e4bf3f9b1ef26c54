//! Local file system operations
//!
//! Tree copies, atomic writes and content digests used by the stages.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tempfile::NamedTempFile;

use crate::domain::value_objects::{normalize, ContentHash};
use crate::error::{StagehandError, StagehandResult};

/// Directory names never copied out of a source tree
pub const ALWAYS_SKIPPED: &[&str] = &[".git", ".hg", ".svn", ".stagehand"];

/// Write `content` to `path` via a temp file in the same directory + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> StagehandResult<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StagehandError::Io(e.error))?;
    Ok(())
}

/// Copy the tree under `src` into `dst`.
///
/// Directories named in `skip_names` (plus VCS dirs) are skipped at any depth.
/// Entries in `skip_paths` are skipped only at that exact path relative to
/// `src`. Symlinks are not followed. Returns copied files, relative to `src`,
/// sorted.
pub fn copy_tree(
    src: &Path,
    dst: &Path,
    skip_names: &[&str],
    skip_paths: &[PathBuf],
) -> StagehandResult<Vec<PathBuf>> {
    if !src.is_dir() {
        return Err(StagehandError::DirectoryNotFound {
            path: src.to_path_buf(),
        });
    }
    fs::create_dir_all(dst)?;

    let names: Vec<String> = skip_names
        .iter()
        .chain(ALWAYS_SKIPPED.iter())
        .map(|s| s.to_string())
        .collect();
    let paths: Vec<PathBuf> = skip_paths.iter().map(|p| normalize(p)).collect();
    let root = src.to_path_buf();

    let walker = WalkBuilder::new(src)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if names.iter().any(|n| name == n.as_str()) {
                return false;
            }
            match entry.path().strip_prefix(&root) {
                Ok(relative) => !paths.iter().any(|p| p.as_path() == relative),
                Err(_) => true,
            }
        })
        .build();

    let mut copied = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| StagehandError::Io(std::io::Error::other(e.to_string())))?;
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(src) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dst.join(relative);
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &target)?;
            copied.push(relative.to_path_buf());
        }
    }
    copied.sort();
    Ok(copied)
}

/// Replace `dst` with a copy of `src`. `dst` ends up containing exactly `src`'s files.
pub fn replace_tree(src: &Path, dst: &Path) -> StagehandResult<Vec<PathBuf>> {
    remove_dir_if_exists(dst)?;
    copy_tree(src, dst, &[], &[])
}

/// Make `dst` hold `src`'s files, deleting other files except those under a
/// `keep` path (relative to `dst`). Kept subtrees are neither deleted nor
/// copied over from `src`.
pub fn mirror_tree(src: &Path, dst: &Path, keep: &[PathBuf]) -> StagehandResult<Vec<PathBuf>> {
    if !src.is_dir() {
        return Err(StagehandError::DirectoryNotFound {
            path: src.to_path_buf(),
        });
    }
    if dst.is_dir() {
        let wanted = list_files(src)?;
        for existing in list_files(dst)? {
            if keep.iter().any(|k| existing.starts_with(k)) || wanted.contains(&existing) {
                continue;
            }
            fs::remove_file(dst.join(&existing))?;
        }
    }
    copy_tree(src, dst, &[], keep)
}

/// Remove a directory tree; absent is fine.
pub fn remove_dir_if_exists(path: &Path) -> StagehandResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Regular files under `dir`, relative and sorted
pub fn list_files(dir: &Path) -> StagehandResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .follow_links(false)
        .build();
    for entry in walker {
        let entry = entry.map_err(|e| StagehandError::Io(std::io::Error::other(e.to_string())))?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            if let Ok(relative) = entry.path().strip_prefix(dir) {
                files.push(relative.to_path_buf());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Digest of every file's relative path and content under `dir`
pub fn hash_tree(dir: &Path, files: &[PathBuf]) -> StagehandResult<ContentHash> {
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let name = file.to_string_lossy().replace('\\', "/");
        let content = fs::read(dir.join(file))?;
        entries.push((name, content));
    }
    Ok(ContentHash::from_entries(
        entries.iter().map(|(n, c)| (n.as_str(), c.as_slice())),
    ))
}

/// True when `dir` exists and contains at least one regular file
pub fn has_files(dir: &Path) -> bool {
    dir.is_dir() && list_files(dir).map(|f| !f.is_empty()).unwrap_or(false)
}
