//! Build pipeline
//!
//! Runs the build stages of the stage graph wave by wave. Stages in one wave
//! share no inputs and may run on scoped threads. A failed wave stops the
//! pipeline: later stages are skipped and every stage workspace is removed.
//!
//! ## Flow
//!
//! 1. Acquire the pipeline lock in the work directory
//! 2. Frontend + backend (wave 1)
//! 3. Assemble (wave 2)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::domain::entities::{BuildArtifact, RuntimeEnvironment, RuntimeImage};
use crate::domain::ports::{CommandRunner, NoopEventSink, PipelineEvent, PipelineEventSink};
use crate::domain::services::{StageGraph, StageId};
use crate::domain::value_objects::ProjectLayout;
use crate::error::{StagehandError, StagehandResult};
use crate::infrastructure::fs::remove_dir_if_exists;
use crate::infrastructure::PipelineLock;

use super::assemble::ImageAssembler;
use super::backend::BackendResolver;
use super::frontend::FrontendBuilder;

/// Typed output of one stage
enum StageOutput {
    Frontend(BuildArtifact),
    Backend(RuntimeEnvironment),
    Image(RuntimeImage),
}

/// Outputs of completed waves, read by later stages
#[derive(Default)]
struct Produced {
    artifact: Option<BuildArtifact>,
    environment: Option<RuntimeEnvironment>,
    image: Option<RuntimeImage>,
}

impl Produced {
    fn store(&mut self, output: StageOutput) {
        match output {
            StageOutput::Frontend(a) => self.artifact = Some(a),
            StageOutput::Backend(e) => self.environment = Some(e),
            StageOutput::Image(i) => self.image = Some(i),
        }
    }
}

pub struct Pipeline<'a> {
    config: &'a Config,
    layout: ProjectLayout,
    runner: &'a dyn CommandRunner,
    events: Arc<dyn PipelineEventSink>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            layout: config.project_layout(),
            runner,
            events: Arc::new(NoopEventSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn PipelineEventSink>) -> Self {
        self.events = events;
        self
    }

    fn frontend_workspace(&self, project_root: &Path) -> PathBuf {
        self.config.work_dir(project_root).join(StageId::Frontend.as_str())
    }

    fn backend_workspace(&self, project_root: &Path) -> PathBuf {
        self.config.work_dir(project_root).join(StageId::Backend.as_str())
    }

    /// Build the image for `project_root`
    pub fn build(&self, project_root: &Path) -> StagehandResult<RuntimeImage> {
        let waves = StageGraph::standard().build_waves()?;
        let image_dir = self.config.image_dir(project_root);
        let _lock = PipelineLock::acquire(&self.config.work_dir(project_root))?;

        self.events.on_event(PipelineEvent::Started {
            project: project_root.to_path_buf(),
            image: image_dir.clone(),
            waves: waves.clone(),
        });
        tracing::info!(
            project = %project_root.display(),
            parallel = self.config.pipeline.parallel,
            "build started"
        );

        let result = self.run_waves(project_root, &image_dir, &waves);
        self.discard_workspaces(project_root);

        self.events.on_event(PipelineEvent::Completed {
            success: result.is_ok(),
            image: image_dir,
        });
        result
    }

    fn run_waves(
        &self,
        project_root: &Path,
        image_dir: &Path,
        waves: &[Vec<StageId>],
    ) -> StagehandResult<RuntimeImage> {
        let mut produced = Produced::default();

        for (index, wave) in waves.iter().enumerate() {
            let results = self.run_wave(wave, project_root, image_dir, &produced);
            let ran: Vec<StageId> = results.iter().map(|(stage, _)| *stage).collect();

            let mut first_error = None;
            let mut outputs = Vec::new();
            for (stage, result) in results {
                match result {
                    Ok(output) => outputs.push(output),
                    Err(err) => {
                        self.events.on_event(PipelineEvent::StageFailed {
                            stage,
                            kind: err.kind().to_string(),
                            error: err.to_string(),
                        });
                        tracing::error!(stage = stage.as_str(), error = %err, "stage failed");
                        first_error.get_or_insert(err);
                    }
                }
            }

            if let Some(err) = first_error {
                for stage in waves[index..].iter().flatten() {
                    if !ran.contains(stage) {
                        self.events.on_event(PipelineEvent::StageSkipped { stage: *stage });
                    }
                }
                return Err(err);
            }

            for output in outputs {
                produced.store(output);
            }
        }

        produced.image.ok_or_else(|| {
            StagehandError::StageGraph("build finished without assembling an image".to_string())
        })
    }

    fn runs_concurrently(&self, wave: &[StageId]) -> bool {
        self.config.pipeline.parallel && wave.len() > 1
    }

    fn run_wave(
        &self,
        wave: &[StageId],
        project_root: &Path,
        image_dir: &Path,
        produced: &Produced,
    ) -> Vec<(StageId, StagehandResult<StageOutput>)> {
        if self.runs_concurrently(wave) {
            return thread::scope(|scope| {
                let handles: Vec<_> = wave
                    .iter()
                    .map(|&stage| {
                        let handle = scope
                            .spawn(move || self.run_stage(stage, project_root, image_dir, produced));
                        (stage, handle)
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|(stage, handle)| {
                        let result = handle.join().unwrap_or_else(|_| {
                            Err(StagehandError::StageGraph(format!("stage '{}' panicked", stage)))
                        });
                        (stage, result)
                    })
                    .collect()
            });
        }

        let mut results = Vec::with_capacity(wave.len());
        for &stage in wave {
            let result = self.run_stage(stage, project_root, image_dir, produced);
            let failed = result.is_err();
            results.push((stage, result));
            if failed {
                break;
            }
        }
        results
    }

    fn run_stage(
        &self,
        stage: StageId,
        project_root: &Path,
        image_dir: &Path,
        produced: &Produced,
    ) -> StagehandResult<StageOutput> {
        self.events.on_event(PipelineEvent::StageStarted { stage });
        let events = self.events.as_ref();

        let (output, summary) = match stage {
            StageId::Frontend => {
                let builder =
                    FrontendBuilder::new(self.runner, &self.config.frontend, &self.layout);
                let source = builder.source(project_root)?;
                let artifact =
                    builder.build(&source, &self.frontend_workspace(project_root), events)?;
                let summary = format!(
                    "{} files, digest {}",
                    artifact.files().len(),
                    artifact.digest().short()
                );
                (StageOutput::Frontend(artifact), summary)
            }
            StageId::Backend => {
                let resolver =
                    BackendResolver::new(self.runner, &self.config.backend, &self.layout);
                let env =
                    resolver.resolve(project_root, &self.backend_workspace(project_root), events)?;
                let summary = format!(
                    "{} packages ({})",
                    env.installed().len(),
                    if env.is_locked() { "locked" } else { "fresh resolution" }
                );
                (StageOutput::Backend(env), summary)
            }
            StageId::Assemble => {
                let (Some(artifact), Some(env)) = (&produced.artifact, &produced.environment)
                else {
                    return Err(StagehandError::StageGraph(
                        "assemble scheduled before its inputs were produced".to_string(),
                    ));
                };
                let assembler =
                    ImageAssembler::new(&self.layout, self.config.runtime.default_port);
                let image = assembler.assemble(artifact, env, image_dir)?;
                let summary = format!("image at {}", image.root().display());
                (StageOutput::Image(image), summary)
            }
            StageId::Launch => {
                return Err(StagehandError::StageGraph(
                    "launch is not a build stage".to_string(),
                ))
            }
        };

        self.events
            .on_event(PipelineEvent::StageCompleted { stage, summary });
        Ok(output)
    }

    fn discard_workspaces(&self, project_root: &Path) {
        for workspace in [
            self.frontend_workspace(project_root),
            self.backend_workspace(project_root),
        ] {
            if let Err(e) = remove_dir_if_exists(&workspace) {
                tracing::warn!(workspace = %workspace.display(), error = %e, "failed to remove workspace");
            }
        }
    }
}

#[cfg(test)]
mod tests;
