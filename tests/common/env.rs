//! Test environment builder for isolated Stagehand testing.
//!
//! `TestEnv` holds a two-tier project in a temp directory and a second temp
//! directory with npm/pip stand-ins, wired in through `stagehand.toml`.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use tempfile::TempDir;

use super::fixtures::{FAKE_NPM, FAKE_PIP, MAIN_PY, PACKAGE_JSON, PACKAGE_LOCK, PYPROJECT};

/// Variables that would leak the host's settings into a run
const SCRUBBED_ENV: &[&str] = &[
    "PORT",
    "PYTHONPATH",
    "RUST_LOG",
    "STAGEHAND_LAYOUT",
    "STAGEHAND_PARALLEL",
    "STAGEHAND_WORK_DIR",
];

/// Result of running a Stagehand CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Parse stdout as NDJSON
    pub fn events(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON ({}): {}", e, l))
            })
            .collect()
    }

    pub fn last_event(&self) -> serde_json::Value {
        self.events()
            .pop()
            .unwrap_or_else(|| panic!("no events in stdout:\n{}", self.combined_output()))
    }
}

pub struct TestEnv {
    pub project_root: TempDir,
    tools_dir: TempDir,
    convention: &'static str,
    runtime: String,
    stagehand_bin: PathBuf,
}

impl TestEnv {
    /// Manifest and lock inside `backend/`
    pub fn flat() -> Self {
        let env = Self::common("flat");
        env.write_project_file("backend/pyproject.toml", PYPROJECT);
        env.write_config();
        env
    }

    /// Manifest at the project root; the backend is the `backend` package
    pub fn root_manifest() -> Self {
        let env = Self::common("root-manifest");
        env.write_project_file("pyproject.toml", PYPROJECT);
        env.write_project_file("backend/__init__.py", "");
        env.write_config();
        env
    }

    fn common(convention: &'static str) -> Self {
        let env = Self {
            project_root: tempfile::tempdir().expect("Failed to create project dir"),
            tools_dir: tempfile::tempdir().expect("Failed to create tools dir"),
            convention,
            runtime: String::new(),
            stagehand_bin: PathBuf::from(env!("CARGO_BIN_EXE_stagehand")),
        };
        std::fs::write(env.tool("fake-npm.sh"), FAKE_NPM).expect("Failed to write fake npm");
        std::fs::write(env.tool("fake-pip.sh"), FAKE_PIP).expect("Failed to write fake pip");

        env.write_project_file("frontend/package.json", PACKAGE_JSON);
        env.write_project_file("frontend/package-lock.json", PACKAGE_LOCK);
        env.write_project_file("frontend/src/main.jsx", "export default null;\n");
        env.write_project_file("backend/main.py", MAIN_PY);
        env
    }

    /// Replace the `[runtime]` table; rewrites `stagehand.toml`
    pub fn with_runtime(mut self, runtime: &str) -> Self {
        self.runtime = runtime.to_string();
        self.write_config();
        self
    }

    fn tool(&self, name: &str) -> PathBuf {
        self.tools_dir.path().join(name)
    }

    fn write_config(&self) {
        let npm = self.tool("fake-npm.sh").display().to_string();
        let pip = self.tool("fake-pip.sh").display().to_string();
        let config = format!(
            r#"[layout]
convention = "{convention}"

[frontend]
install = ["sh", "{npm}", "ci"]
install_unlocked = ["sh", "{npm}", "install"]
build = ["sh", "{npm}", "run", "build"]

[backend]
installer = ["sh", "{pip}", "install"]

[runtime]
{runtime}
"#,
            convention = self.convention,
            npm = npm,
            pip = pip,
            runtime = self.runtime,
        );
        self.write_project_file("stagehand.toml", &config);
    }

    pub fn project_path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    /// Path inside the default image directory
    pub fn image_path(&self, relative: &str) -> PathBuf {
        self.project_path(".stagehand/image").join(relative)
    }

    pub fn write_project_file(&self, relative_path: &str, content: &str) {
        let full_path = self.project_path(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
    }

    /// Run stagehand from the project root
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        self.run_from_with_env(self.project_root.path(), args, env_vars)
    }

    pub fn run_from_with_env(
        &self,
        cwd: &Path,
        args: &[&str],
        env_vars: &[(&str, &str)],
    ) -> TestResult {
        let output = self
            .command(cwd, args, env_vars)
            .output()
            .expect("Failed to execute stagehand");
        output_to_result(output)
    }

    /// Start stagehand from the project root without waiting for it
    pub fn spawn(&self, args: &[&str]) -> Child {
        self.command(self.project_root.path(), args, &[])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to start stagehand")
    }

    fn command(&self, cwd: &Path, args: &[&str], env_vars: &[(&str, &str)]) -> Command {
        let mut cmd = Command::new(&self.stagehand_bin);
        cmd.current_dir(cwd).args(args).env("NO_COLOR", "1");
        for key in SCRUBBED_ENV {
            cmd.env_remove(key);
        }
        for (key, value) in env_vars {
            cmd.env(key, value);
        }
        cmd
    }
}

fn output_to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}
