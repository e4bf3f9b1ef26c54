//! Frontend Builder
//!
//! Copies the frontend source into its own workspace, installs its
//! dependencies, runs the build command and collects the output directory
//! as a `BuildArtifact`.
//!
//! A `package-lock.json` that disagrees with `package.json` is rejected before
//! anything is copied or installed.

use std::path::{Path, PathBuf};

use crate::config::FrontendConfig;
use crate::domain::entities::{BuildArtifact, Ecosystem, SourceBundle, SourceKind};
use crate::domain::ports::{CommandRunner, PipelineEventSink};
use crate::domain::services::StageId;
use crate::domain::value_objects::ProjectLayout;
use crate::error::{StagehandError, StagehandResult};
use crate::infrastructure::fs::{copy_tree, hash_tree, list_files, remove_dir_if_exists};
use crate::infrastructure::repositories::{load_verified, manifest::manifest_path, VerifiedDependencies};

use super::command::{run_checked, spec_for};

/// Never copied into the build workspace
const SKIPPED_SOURCE_DIRS: &[&str] = &["node_modules"];

pub struct FrontendBuilder<'a> {
    runner: &'a dyn CommandRunner,
    commands: &'a FrontendConfig,
    layout: &'a ProjectLayout,
}

impl<'a> FrontendBuilder<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        commands: &'a FrontendConfig,
        layout: &'a ProjectLayout,
    ) -> Self {
        Self {
            runner,
            commands,
            layout,
        }
    }

    /// Open the frontend source bundle under `project_root`
    pub fn source(&self, project_root: &Path) -> StagehandResult<SourceBundle> {
        SourceBundle::open(project_root.join(self.layout.frontend_dir()), SourceKind::Frontend)
    }

    /// Build into `workspace`. On failure the workspace is removed.
    pub fn build(
        &self,
        source: &SourceBundle,
        workspace: &Path,
        events: &dyn PipelineEventSink,
    ) -> StagehandResult<BuildArtifact> {
        let _span = tracing::info_span!("stage", stage = StageId::Frontend.as_str()).entered();

        let deps = load_verified(source.root(), Ecosystem::Npm)?.ok_or_else(|| {
            StagehandError::ManifestParse {
                file: manifest_path(source.root(), Ecosystem::Npm),
                message: "file not found".to_string(),
            }
        })?;

        remove_dir_if_exists(workspace)?;
        let result = self.build_in(source, workspace, &deps, events);
        if result.is_err() {
            if let Err(e) = remove_dir_if_exists(workspace) {
                tracing::warn!(workspace = %workspace.display(), error = %e, "failed to remove workspace");
            }
        }
        result
    }

    fn build_in(
        &self,
        source: &SourceBundle,
        workspace: &Path,
        deps: &VerifiedDependencies,
        events: &dyn PipelineEventSink,
    ) -> StagehandResult<BuildArtifact> {
        let output_dir = self.layout.frontend_output().to_path_buf();
        let copied = copy_tree(source.root(), workspace, SKIPPED_SOURCE_DIRS, &[output_dir])?;
        tracing::debug!(files = copied.len(), "copied frontend source");

        let install = if deps.lock.is_some() {
            &self.commands.install
        } else {
            &self.commands.install_unlocked
        };
        run_checked(
            self.runner,
            StageId::Frontend,
            &spec_for(StageId::Frontend, install, workspace)?,
            events,
        )?;
        run_checked(
            self.runner,
            StageId::Frontend,
            &spec_for(StageId::Frontend, &self.commands.build, workspace)?,
            events,
        )?;

        let output: PathBuf = workspace.join(self.layout.frontend_output());
        let files = if output.is_dir() {
            list_files(&output)?
        } else {
            Vec::new()
        };
        if files.is_empty() {
            return Err(StagehandError::EmptyArtifact { path: output });
        }
        let digest = hash_tree(&output, &files)?;
        tracing::info!(files = files.len(), digest = digest.short(), "frontend built");

        Ok(BuildArtifact::new(output, files, digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeRunner, ProjectFixture, PACKAGE_LOCK};
    use crate::config::Config;
    use crate::domain::ports::NoopEventSink;

    fn build(fixture: &ProjectFixture, runner: &FakeRunner) -> StagehandResult<BuildArtifact> {
        let config = Config::default();
        let layout = config.project_layout();
        let builder = FrontendBuilder::new(runner, &config.frontend, &layout);
        let source = builder.source(fixture.root())?;
        builder.build(&source, &fixture.path("work/frontend"), &NoopEventSink)
    }

    #[test]
    fn unlocked_build_uses_install_then_build() {
        let fixture = ProjectFixture::flat();
        let runner = FakeRunner::new();

        let artifact = build(&fixture, &runner).unwrap();

        assert_eq!(runner.rendered_calls(), ["npm install", "npm run build"]);
        assert!(artifact.files().contains(&PathBuf::from("index.html")));
        assert!(artifact.dir().join("index.html").is_file());
    }

    #[test]
    fn locked_build_uses_ci() {
        let fixture = ProjectFixture::flat();
        fixture.write("frontend/package-lock.json", PACKAGE_LOCK);
        let runner = FakeRunner::new();

        build(&fixture, &runner).unwrap();

        assert_eq!(runner.rendered_calls()[0], "npm ci");
    }

    #[test]
    fn source_tree_is_not_mutated() {
        let fixture = ProjectFixture::flat();
        build(&fixture, &FakeRunner::new()).unwrap();

        assert!(!fixture.path("frontend/dist").exists());
        assert!(!fixture.path("work/frontend/node_modules/react").exists());
    }

    #[test]
    fn nested_dirs_named_like_the_output_are_copied() {
        let fixture = ProjectFixture::flat();
        fixture.write("frontend/src/vendor/dist/lib.js", "export {}");
        fixture.write("frontend/dist/stale.js", "old");

        build(&fixture, &FakeRunner::new()).unwrap();

        assert!(fixture.path("work/frontend/src/vendor/dist/lib.js").is_file());
        assert!(!fixture.path("work/frontend/dist/stale.js").exists());
    }

    #[test]
    fn stale_lock_fails_before_any_command() {
        let fixture = ProjectFixture::flat();
        fixture.write(
            "frontend/package-lock.json",
            &PACKAGE_LOCK.replace("^18.3.1", "^17.0.2"),
        );
        let runner = FakeRunner::new();

        let err = build(&fixture, &runner).unwrap_err();

        assert!(matches!(err, StagehandError::LockMismatch { .. }));
        assert!(runner.calls().is_empty());
        assert!(!fixture.path("work/frontend").exists());
    }

    #[test]
    fn empty_output_is_an_error_and_leaves_no_workspace() {
        let fixture = ProjectFixture::flat();
        let runner = FakeRunner::new().with_empty_build();

        let err = build(&fixture, &runner).unwrap_err();

        assert!(matches!(err, StagehandError::EmptyArtifact { .. }));
        assert!(!fixture.path("work/frontend").exists());
    }

    #[test]
    fn failed_install_aborts_before_build() {
        let fixture = ProjectFixture::flat();
        let runner = FakeRunner::new().fail_on("install");

        let err = build(&fixture, &runner).unwrap_err();

        assert!(matches!(err, StagehandError::CommandFailed { .. }));
        assert_eq!(runner.calls().len(), 1);
        assert!(!fixture.path("work/frontend").exists());
    }

    #[test]
    fn missing_package_json_is_reported() {
        let fixture = ProjectFixture::flat();
        std::fs::remove_file(fixture.path("frontend/package.json")).unwrap();

        let err = build(&fixture, &FakeRunner::new()).unwrap_err();
        assert!(matches!(err, StagehandError::ManifestParse { .. }));
    }
}
