use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;

use stagehand::application::Pipeline;
use stagehand::domain::entities::RuntimeImage;
use stagehand::domain::ports::PipelineEventSink;
use stagehand::infrastructure::{JsonEventSink, SystemRunner};
use stagehand::presentation::theme::Icon;
use stagehand::presentation::ConsoleEventSink;

use super::{interrupt_flag, Session, INTERRUPTED_EXIT};

pub fn cmd_build(session: &Session, out: Option<&Path>, sequential: bool) -> Result<i32> {
    match run_build(session, out, sequential, "build")? {
        Some(_) => Ok(0),
        None => Ok(INTERRUPTED_EXIT),
    }
}

/// Build, then launch the image that was just assembled
pub fn cmd_up(session: &Session, out: Option<&Path>, sequential: bool) -> Result<i32> {
    match run_build(session, out, sequential, "up")? {
        Some(image) => super::launch::launch_image(session, image.root()),
        None => Ok(INTERRUPTED_EXIT),
    }
}

/// Run the pipeline. `None` means the user interrupted it; the pipeline has
/// already removed its stage workspaces by then.
fn run_build(
    session: &Session,
    out: Option<&Path>,
    sequential: bool,
    command: &'static str,
) -> Result<Option<RuntimeImage>> {
    let mut config = session.config.clone();
    config.pipeline.image_dir = session.image_dir(out)?;
    if sequential {
        config.pipeline.parallel = false;
    }

    let events: Arc<dyn PipelineEventSink> = if session.ui.json {
        Arc::new(JsonEventSink::stdout(command))
    } else {
        Arc::new(ConsoleEventSink::stderr(
            session.ui.color,
            session.ui.unicode,
            session.ui.verbose,
        ))
    };

    // Children share the terminal's process group and receive Ctrl+C
    // themselves; the flag only keeps stagehand alive to clean up.
    let interrupted = interrupt_flag()?;
    let runner = SystemRunner::new();
    let result = Pipeline::new(&config, &runner)
        .with_events(events)
        .build(&session.project_root);

    if interrupted.load(Ordering::SeqCst) {
        tracing::warn!(succeeded = result.is_ok(), "build interrupted");
        if !session.ui.json {
            eprintln!(
                "{} Interrupted",
                Icon::Warning.colored(session.ui.color, session.ui.unicode)
            );
        }
        return Ok(None);
    }
    Ok(Some(result?))
}
