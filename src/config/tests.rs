//! Tests for the config module

use super::*;
use crate::domain::value_objects::{LayoutConvention, Port};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.layout.convention, LayoutConvention::Flat);
    assert_eq!(config.frontend.install, ["npm", "ci"]);
    assert_eq!(config.runtime.port_env, "PORT");
    assert_eq!(config.runtime.default_port, Port::DEFAULT);
    assert!(config.pipeline.parallel);
}

#[test]
fn test_config_parse_toml() {
    let toml = r#"
[layout]
convention = "root-manifest"

[frontend]
build = ["pnpm", "build"]

[runtime]
default_port = 8001
data_dirs = ["data/conversations", "data/uploads"]

[pipeline]
parallel = false
"#;

    let config: Config = toml::from_str(toml).unwrap();

    assert_eq!(config.layout.convention, LayoutConvention::RootManifest);
    assert_eq!(config.frontend.build, ["pnpm", "build"]);
    assert_eq!(config.frontend.install, ["npm", "ci"]);
    assert_eq!(config.runtime.default_port.get(), 8001);
    assert_eq!(config.runtime.data_dirs.len(), 2);
    assert!(!config.pipeline.parallel);
}

#[test]
fn test_project_layout_carries_every_setting() {
    let toml = r#"
[layout]
convention = "root-manifest"
backend_dir = "server"

[backend]
entry_module = "app"
app_object = "api"
static_root = "../web/build"

[frontend]
output_dir = "build"
"#;
    let config: Config = toml::from_str(toml).unwrap();
    let layout = config.project_layout();

    assert_eq!(layout.entry_point(), "server.app:api");
    assert_eq!(layout.frontend_output(), PathBuf::from("build"));
    assert_eq!(
        layout.static_root(std::path::Path::new("/img")).unwrap(),
        PathBuf::from("/img/web/build")
    );
}

#[test]
fn test_invalid_layout_value_is_rejected() {
    let err = toml::from_str::<Config>("[layout]\nconvention = \"nested\"\n");
    assert!(err.is_err());
}

#[test]
fn test_load_with_warnings_reports_unknown_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    fs::write(&path, "[runtime]\ndefualt_port = 9000\n").unwrap();

    let (config, warnings) = Config::load_with_warnings(&path).unwrap();

    assert_eq!(config.runtime.default_port, Port::DEFAULT);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].key, "defualt_port");
    assert_eq!(warnings[0].line, Some(2));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("default_port"));
    assert!(warnings[0].to_string().contains("did you mean 'default_port'"));
}

#[test]
fn test_load_or_default_without_file() {
    let dir = tempdir().unwrap();
    let (config, warnings) = Config::load_or_default(dir.path()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(config.layout.backend_dir, PathBuf::from("backend"));
}

#[test]
fn test_load_or_default_surfaces_parse_errors() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE), "[layout\n").unwrap();
    let err = Config::load_or_default(dir.path()).unwrap_err();
    assert!(err.to_string().contains("invalid config"));
}

#[test]
fn test_env_overrides() {
    let config = with_overrides_from(Config::default(), |key| match key {
        "STAGEHAND_LAYOUT" => Some("root-manifest".to_string()),
        "STAGEHAND_PARALLEL" => Some("0".to_string()),
        "STAGEHAND_WORK_DIR" => Some("/tmp/sh-work".to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.layout.convention, LayoutConvention::RootManifest);
    assert!(!config.pipeline.parallel);
    assert_eq!(config.pipeline.work_dir, PathBuf::from("/tmp/sh-work"));
}

#[test]
fn test_env_override_with_bad_layout_fails() {
    let err = with_overrides_from(Config::default(), |key| {
        (key == "STAGEHAND_LAYOUT").then(|| "sideways".to_string())
    })
    .unwrap_err();
    assert!(err.to_string().contains("sideways"));
}

#[test]
fn test_work_and_image_dirs_are_project_relative() {
    let config = Config::default();
    let root = std::path::Path::new("/proj");
    assert_eq!(config.work_dir(root), PathBuf::from("/proj/.stagehand/work"));
    assert_eq!(config.image_dir(root), PathBuf::from("/proj/.stagehand/image"));
}
