//! CLI Argument Parsing
//!
//! Global flags (--json, --color, --verbose, --project, --config) are
//! inherited by all subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// Stagehand - build a frontend + Python backend into a runnable image and launch it
#[derive(Parser, Debug)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit NDJSON events / JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorWhen>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project root (defaults to the nearest directory with stagehand.toml)
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Config file (defaults to <project>/stagehand.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the frontend, resolve backend dependencies and assemble the image
    Build {
        /// Image directory (overrides pipeline.image_dir)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Run independent stages one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Start the backend server from an assembled image
    Launch {
        /// Image directory (overrides pipeline.image_dir)
        #[arg(long, value_name = "DIR")]
        image: Option<PathBuf>,

        /// Print the resolved launch plan without starting the server
        #[arg(long)]
        dry_run: bool,
    },

    /// Build, then launch
    Up {
        /// Image directory (overrides pipeline.image_dir)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Run independent stages one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Show the stage waves and the resolved layout
    Plan,

    /// Validate layout, manifests and lock snapshots without building
    Check {
        /// Fail on warnings too (CI mode)
        #[arg(long)]
        strict_warnings: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_accepts_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stagehand",
            "build",
            "--project",
            "/srv/app",
            "--out",
            "/srv/image",
            "--sequential",
            "--json",
            "-vv",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.project, Some(PathBuf::from("/srv/app")));
        match cli.command {
            Commands::Build { out, sequential } => {
                assert_eq!(out, Some(PathBuf::from("/srv/image")));
                assert!(sequential);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn launch_dry_run() {
        let cli = Cli::try_parse_from(["stagehand", "launch", "--image", "img", "--dry-run"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Launch { dry_run: true, image: Some(_) }
        ));
    }

    #[test]
    fn color_flag_parses_value_enum() {
        let cli = Cli::try_parse_from(["stagehand", "--color", "never", "plan"]).unwrap();
        assert_eq!(cli.color, Some(ColorWhen::Never));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["stagehand"]).is_err());
    }
}
