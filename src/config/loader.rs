//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::value_objects::LayoutConvention;
use crate::error::{StagehandError, StagehandResult};

use super::types::{Config, CONFIG_FILE};

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> StagehandResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| StagehandError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load `stagehand.toml` from the project root, or defaults when it is absent.
///
/// A file that exists but does not parse is an error, never a silent fallback.
pub fn load_or_default(project_root: &Path) -> StagehandResult<(Config, Vec<ConfigWarning>)> {
    let path = project_root.join(CONFIG_FILE);
    let (config, warnings) = if path.is_file() {
        load_with_warnings(&path)?
    } else {
        (Config::default(), Vec::new())
    };
    Ok((with_env_overrides(config)?, warnings))
}

/// Apply environment variable overrides (STAGEHAND_* prefix)
pub fn with_env_overrides(config: Config) -> StagehandResult<Config> {
    with_overrides_from(config, |key| std::env::var(key).ok())
}

/// Same as `with_env_overrides` with an injectable lookup (for testing)
pub fn with_overrides_from<F>(mut config: Config, lookup: F) -> StagehandResult<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // STAGEHAND_LAYOUT
    if let Some(layout) = lookup("STAGEHAND_LAYOUT") {
        config.layout.convention =
            LayoutConvention::parse(&layout).ok_or_else(|| StagehandError::InvalidConfig {
                file: PathBuf::from("$STAGEHAND_LAYOUT"),
                message: format!(
                    "unknown layout '{}', expected 'flat' or 'root-manifest'",
                    layout
                ),
            })?;
    }

    // STAGEHAND_PARALLEL
    if let Some(val) = lookup("STAGEHAND_PARALLEL") {
        config.pipeline.parallel = val.to_lowercase() != "false" && val != "0";
    }

    // STAGEHAND_WORK_DIR
    if let Some(dir) = lookup("STAGEHAND_WORK_DIR").filter(|d| !d.trim().is_empty()) {
        config.pipeline.work_dir = PathBuf::from(dir);
    }

    Ok(config)
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "layout",
        "convention",
        "backend_dir",
        "frontend_dir",
        "frontend",
        "install",
        "install_unlocked",
        "build",
        "output_dir",
        "backend",
        "installer",
        "entry_module",
        "app_object",
        "static_root",
        "runtime",
        "data_dirs",
        "port_env",
        "default_port",
        "host",
        "server",
        "pipeline",
        "work_dir",
        "image_dir",
        "parallel",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
