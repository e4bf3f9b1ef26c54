//! Test doubles for the command runner
//!
//! `FakeRunner` stands in for npm and pip: install commands succeed, a build
//! command writes a small bundle into `dist/`, and a `--target` install creates
//! one `*.dist-info` directory per requirement line.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::domain::ports::{CommandOutput, CommandRunner, CommandSpec, RunResult};

/// Version chosen for requirements that carry no `==` pin
pub const FRESH_VERSION: &str = "1.0.0";

#[derive(Clone, Default)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    fail_on: Option<String>,
    empty_build: bool,
    /// Extra distribution installed alongside the requested ones
    extra_dist: Option<(String, String)>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any command whose rendering contains `needle`
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    /// Build commands succeed but write nothing
    pub fn with_empty_build(mut self) -> Self {
        self.empty_build = true;
        self
    }

    pub fn with_extra_dist(mut self, name: &str, version: &str) -> Self {
        self.extra_dist = Some((name.to_string(), version.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display).collect()
    }

    fn simulate(&self, spec: &CommandSpec) -> std::io::Result<()> {
        if let Some(target) = flag_value(&spec.args, "--target") {
            let target = spec.cwd.join(target);
            fs::create_dir_all(&target)?;
            if let Some(requirements) = flag_value(&spec.args, "-r") {
                let content = fs::read_to_string(spec.cwd.join(requirements))?;
                // Marker-guarded lines are treated as not applying here
                for line in content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.contains(';'))
                {
                    let (name, version) = split_requirement(line);
                    write_dist_info(&target, &name, &version)?;
                }
            }
            if let Some((name, version)) = &self.extra_dist {
                write_dist_info(&target, name, version)?;
            }
        } else if spec.args.iter().any(|a| a == "build") {
            if !self.empty_build {
                let dist = spec.cwd.join("dist");
                fs::create_dir_all(dist.join("assets"))?;
                fs::write(dist.join("index.html"), "<div id=\"root\"></div>")?;
                fs::write(dist.join("assets/app.js"), "console.log('app')")?;
            }
        } else {
            fs::create_dir_all(spec.cwd.join("node_modules"))?;
        }
        Ok(())
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn split_requirement(line: &str) -> (String, String) {
    if let Some((name, version)) = line.split_once("==") {
        return (name.trim().to_string(), version.trim().to_string());
    }
    let name: String = line
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    (name, FRESH_VERSION.to_string())
}

fn write_dist_info(target: &Path, name: &str, version: &str) -> std::io::Result<()> {
    let dir: PathBuf = target.join(format!("{}-{}.dist-info", name.replace('-', "_"), version));
    fs::create_dir_all(&dir)?;
    fs::write(
        dir.join("METADATA"),
        format!("Metadata-Version: 2.1\nName: {}\nVersion: {}\n", name, version),
    )
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> RunResult<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        if let Some(needle) = &self.fail_on {
            if spec.display().contains(needle.as_str()) {
                return Ok(CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "simulated failure".to_string(),
                });
            }
        }

        let code = match self.simulate(spec) {
            Ok(()) => 0,
            Err(_) => 2,
        };
        Ok(CommandOutput {
            code: Some(code),
            ..CommandOutput::default()
        })
    }
}

pub const PYPROJECT: &str = r#"[project]
name = "chat-backend"
version = "0.1.0"
requires-python = ">=3.11"
dependencies = ["fastapi>=0.110", "uvicorn[standard]>=0.29"]
"#;

pub const UV_LOCK: &str = r#"version = 1
requires-python = ">=3.11"

[[package]]
name = "chat-backend"
version = "0.1.0"
source = { virtual = "." }
dependencies = [
    { name = "fastapi" },
    { name = "uvicorn", extra = ["standard"] },
]

[package.metadata]
requires-dist = [
    { name = "fastapi", specifier = ">=0.110" },
    { name = "uvicorn", extras = ["standard"], specifier = ">=0.29" },
]

[[package]]
name = "fastapi"
version = "0.115.6"
source = { registry = "https://pypi.org/simple" }

[[package]]
name = "uvicorn"
version = "0.32.1"
source = { registry = "https://pypi.org/simple" }
"#;

/// Lock resolved from an older manifest that only declared fastapi
pub const STALE_UV_LOCK: &str = r#"version = 1

[[package]]
name = "chat-backend"
version = "0.1.0"
source = { virtual = "." }

[package.metadata]
requires-dist = [{ name = "fastapi", specifier = ">=0.110" }]

[[package]]
name = "fastapi"
version = "0.115.6"
source = { registry = "https://pypi.org/simple" }
"#;

pub const PACKAGE_JSON: &str = r#"{
  "name": "chat-frontend",
  "private": true,
  "scripts": { "build": "vite build" },
  "dependencies": { "react": "^18.3.1" },
  "devDependencies": { "vite": "^5.4.0" }
}"#;

pub const PACKAGE_LOCK: &str = r#"{
  "name": "chat-frontend",
  "lockfileVersion": 3,
  "packages": {
    "": {
      "name": "chat-frontend",
      "dependencies": { "react": "^18.3.1" },
      "devDependencies": { "vite": "^5.4.0" }
    },
    "node_modules/react": { "version": "18.3.1" },
    "node_modules/vite": { "version": "5.4.11", "dev": true }
  }
}"#;

/// A two-tier project on disk
pub struct ProjectFixture {
    dir: tempfile::TempDir,
}

impl ProjectFixture {
    /// Manifest inside `backend/`
    pub fn flat() -> Self {
        let fixture = Self::common();
        fixture.write("backend/pyproject.toml", PYPROJECT);
        fixture
    }

    /// Manifest at the project root, backend imported as a package
    pub fn root_manifest() -> Self {
        let fixture = Self::common();
        fixture.write("pyproject.toml", PYPROJECT);
        fixture.write("backend/__init__.py", "");
        fixture
    }

    fn common() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fixture.write("frontend/package.json", PACKAGE_JSON);
        fixture.write("frontend/src/main.jsx", "export default null;\n");
        fixture.write("frontend/node_modules/react/index.js", "module.exports = {};\n");
        fixture.write(
            "backend/main.py",
            "from fastapi import FastAPI\n\napp = FastAPI()\n",
        );
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }
}

/// Run the three build stages against `fixture` with a `FakeRunner`,
/// assembling into `<fixture>/image`
pub fn assemble_fixture(
    fixture: &ProjectFixture,
    config: &crate::config::Config,
) -> crate::error::StagehandResult<crate::domain::entities::RuntimeImage> {
    use crate::application::assemble::ImageAssembler;
    use crate::application::backend::BackendResolver;
    use crate::application::frontend::FrontendBuilder;
    use crate::domain::ports::NoopEventSink;

    let runner = FakeRunner::new();
    let layout = config.project_layout();
    let frontend = FrontendBuilder::new(&runner, &config.frontend, &layout);
    let source = frontend.source(fixture.root())?;
    let artifact = frontend.build(&source, &fixture.path("work/frontend"), &NoopEventSink)?;
    let env = BackendResolver::new(&runner, &config.backend, &layout).resolve(
        fixture.root(),
        &fixture.path("work/backend"),
        &NoopEventSink,
    )?;
    ImageAssembler::new(&layout, config.runtime.default_port).assemble(
        &artifact,
        &env,
        &fixture.path("image"),
    )
}
