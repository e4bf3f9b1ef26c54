//! Stagehand CLI
//!
//! Usage: stagehand <COMMAND>
//!
//! Commands:
//!   build   Build the frontend, resolve backend dependencies, assemble the image
//!   launch  Start the backend server from an assembled image
//!   up      Build, then launch
//!   plan    Show the stage waves and the resolved layout
//!   check   Validate the project without building

mod commands;

use clap::Parser;
use serde_json::json;

use stagehand::presentation::output::write_event;
use stagehand::presentation::theme::Icon;
use stagehand::presentation::{Cli, Commands, UiContext};
use stagehand::StagehandError;

use commands::Session;

fn main() {
    let cli = Cli::parse();
    stagehand::logging::init(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&cli, &err);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let session = Session::open(cli)?;
    match &cli.command {
        Commands::Build { out, sequential } => {
            commands::cmd_build(&session, out.as_deref(), *sequential)
        }
        Commands::Launch { image, dry_run } => {
            commands::cmd_launch(&session, image.as_deref(), *dry_run)
        }
        Commands::Up { out, sequential } => commands::cmd_up(&session, out.as_deref(), *sequential),
        Commands::Plan => commands::cmd_plan(&session),
        Commands::Check { strict_warnings } => commands::cmd_check(&session, *strict_warnings),
    }
}

fn report_error(cli: &Cli, err: &anyhow::Error) {
    let kind = err
        .downcast_ref::<StagehandError>()
        .map(StagehandError::kind)
        .unwrap_or("internal");

    if cli.json {
        let mut out = std::io::stdout().lock();
        let _ = write_event(
            &mut out,
            &json!({
                "event": "error",
                "kind": kind,
                "message": format!("{:#}", err),
            }),
        );
        return;
    }

    let ui = UiContext::new(false, cli.verbose, cli.color);
    eprintln!("{} {:#}", Icon::Error.colored(ui.color, ui.unicode), err);
}
