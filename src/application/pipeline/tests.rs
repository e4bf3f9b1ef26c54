//! Tests for the build pipeline

use super::*;
use crate::application::testing::{FakeRunner, ProjectFixture, STALE_UV_LOCK};
use crate::domain::ports::pipeline_events::recording::RecordingEventSink;
use crate::infrastructure::repositories::image_manifest::marker_path;

fn run(
    fixture: &ProjectFixture,
    config: &Config,
    runner: &FakeRunner,
) -> (StagehandResult<RuntimeImage>, Vec<PipelineEvent>) {
    let sink = RecordingEventSink::default();
    let result = Pipeline::new(config, runner)
        .with_events(Arc::new(sink.clone()))
        .build(fixture.root());
    (result, sink.snapshot())
}

fn skipped(events: &[PipelineEvent]) -> Vec<StageId> {
    events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::StageSkipped { stage } => Some(*stage),
            _ => None,
        })
        .collect()
}

#[test]
fn parallel_build_produces_ready_image() {
    let fixture = ProjectFixture::flat();
    let config = Config::default();

    let (result, events) = run(&fixture, &config, &FakeRunner::new());

    let image = result.unwrap();
    assert_eq!(image.root(), fixture.path(".stagehand/image"));
    assert!(marker_path(image.root()).is_file());
    assert!(fixture.path(".stagehand/image/frontend/dist/index.html").is_file());
    assert!(!fixture.path(".stagehand/work/frontend").exists());
    assert!(!fixture.path(".stagehand/work/backend").exists());

    assert!(matches!(events.first(), Some(PipelineEvent::Started { .. })));
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::Completed { success: true, .. })
    ));
    let completed = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::StageCompleted { .. }))
        .count();
    assert_eq!(completed, 3);
}

#[test]
fn sequential_build_matches_parallel_build() {
    let fixture = ProjectFixture::flat();
    let mut config = Config::default();
    config.pipeline.parallel = false;

    let (result, _) = run(&fixture, &config, &FakeRunner::new());

    let image = result.unwrap();
    assert_eq!(image.manifest().installed.get("fastapi"), Some("1.0.0"));
}

#[test]
fn failed_leaf_stage_skips_assembly() {
    let fixture = ProjectFixture::flat();
    let config = Config::default();
    let runner = FakeRunner::new().fail_on("run build");

    let (result, events) = run(&fixture, &config, &runner);

    let err = result.unwrap_err();
    assert!(matches!(err, StagehandError::CommandFailed { .. }));
    assert_eq!(skipped(&events), [StageId::Assemble]);
    assert!(!marker_path(&fixture.path(".stagehand/image")).exists());
    assert!(!fixture.path(".stagehand/work/backend").exists());
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::Completed { success: false, .. })
    ));
}

#[test]
fn sequential_failure_skips_remaining_siblings() {
    let fixture = ProjectFixture::flat();
    let mut config = Config::default();
    config.pipeline.parallel = false;
    let runner = FakeRunner::new().fail_on("npm install");

    let (result, events) = run(&fixture, &config, &runner);

    assert!(result.is_err());
    assert_eq!(skipped(&events), [StageId::Backend, StageId::Assemble]);
    assert!(runner
        .rendered_calls()
        .iter()
        .all(|call| !call.contains("--target")));
}

#[test]
fn inconsistent_lock_installs_nothing() {
    let fixture = ProjectFixture::flat();
    fixture.write("backend/uv.lock", STALE_UV_LOCK);
    let config = Config::default();
    let runner = FakeRunner::new();

    let (result, events) = run(&fixture, &config, &runner);

    assert!(matches!(result, Err(StagehandError::LockMismatch { .. })));
    assert!(runner
        .rendered_calls()
        .iter()
        .all(|call| !call.contains("--target")));
    assert!(!fixture.path(".stagehand/image/packages").exists());
    assert!(events.iter().any(|e| matches!(
        e,
        PipelineEvent::StageFailed { stage: StageId::Backend, kind, .. } if kind == "dependency"
    )));
}

#[test]
fn concurrent_build_is_refused() {
    let fixture = ProjectFixture::flat();
    let config = Config::default();
    let _held = PipelineLock::acquire(&config.work_dir(fixture.root())).unwrap();

    let (result, events) = run(&fixture, &config, &FakeRunner::new());

    assert!(matches!(result, Err(StagehandError::PipelineLocked { .. })));
    assert!(events.is_empty());
}

#[test]
fn rebuild_keeps_conversations() {
    let fixture = ProjectFixture::flat();
    let config = Config::default();
    run(&fixture, &config, &FakeRunner::new()).0.unwrap();
    let saved = fixture.path(".stagehand/image/backend/data/conversations/c1.json");
    std::fs::write(&saved, "{}").unwrap();

    run(&fixture, &config, &FakeRunner::new()).0.unwrap();

    assert!(saved.is_file());
}
