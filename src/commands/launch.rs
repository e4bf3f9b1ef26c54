use std::path::Path;

use anyhow::Result;

use stagehand::application::{plan_launch, LaunchPlan};
use stagehand::presentation::output::{launch_plan_json, render_launch_plan, write_event};

use super::Session;

pub fn cmd_launch(session: &Session, image: Option<&Path>, dry_run: bool) -> Result<i32> {
    let image = session.image_dir(image)?;
    if dry_run {
        let plan = resolve_plan(session, &image)?;
        print_plan(session, &plan, true)?;
        return Ok(0);
    }
    launch_image(session, &image)
}

/// Run the server for `image`. On unix the server replaces this process;
/// elsewhere it is supervised and its exit code returned.
pub(super) fn launch_image(session: &Session, image: &Path) -> Result<i32> {
    let plan = resolve_plan(session, image)?;
    print_plan(session, &plan, false)?;
    run_server(&plan)
}

#[cfg(unix)]
fn run_server(plan: &LaunchPlan) -> Result<i32> {
    use std::io::Write;

    std::io::stdout().flush()?;
    tracing::info!(port = %plan.port, "handing over to the server");
    match stagehand::application::exec(plan)? {}
}

#[cfg(not(unix))]
fn run_server(plan: &LaunchPlan) -> Result<i32> {
    let interrupted = super::interrupt_flag()?;
    let server = stagehand::application::launch(plan)?;
    tracing::info!(pid = server.id(), port = %plan.port, "server started");
    let status = supervisor::supervise(server, &interrupted)?;
    Ok(status.code().unwrap_or(1))
}

fn resolve_plan(session: &Session, image: &Path) -> Result<LaunchPlan> {
    let layout = session.config.project_layout();
    let plan = plan_launch(image, &layout, &session.config.runtime, |key| {
        std::env::var(key).ok()
    })?;
    Ok(plan)
}

fn print_plan(session: &Session, plan: &LaunchPlan, dry_run: bool) -> Result<()> {
    if session.ui.json {
        let mut out = std::io::stdout().lock();
        write_event(&mut out, &launch_plan_json(plan, dry_run))?;
    } else if dry_run {
        print!("{}", render_launch_plan(plan, session.ui.color, session.ui.unicode));
    } else {
        eprint!("{}", render_launch_plan(plan, session.ui.color, session.ui.unicode));
    }
    Ok(())
}

#[cfg(not(unix))]
mod supervisor {
    use std::process::ExitStatus;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use anyhow::Result;

    use stagehand::infrastructure::ServerProcess;

    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// How long the server gets to stop on its own after an interrupt
    const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

    /// Wait for the server. Ctrl+C reaches it through the console; if it is
    /// still running after the grace period it is killed.
    pub(super) fn supervise(mut server: ServerProcess, interrupted: &AtomicBool) -> Result<ExitStatus> {
        let mut deadline: Option<Instant> = None;
        loop {
            if let Some(status) = server.try_wait()? {
                return Ok(status);
            }
            if deadline.is_none() && interrupted.load(Ordering::SeqCst) {
                tracing::info!("interrupt received, waiting for the server to stop");
                deadline = Some(Instant::now() + SHUTDOWN_GRACE);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(pid = server.id(), "server did not stop, killing it");
                server.kill()?;
                return Ok(server.wait()?);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
