//! Presentation Layer
//!
//! - `cli` - argument parsing (clap)
//! - `context` - terminal capabilities and color/unicode decisions
//! - `console` - human-readable pipeline progress
//! - `output` - text/JSON renderings of check, plan and launch results
//! - `theme` - colors and icons

pub mod cli;
pub mod console;
pub mod context;
pub mod output;
pub mod theme;

pub use cli::{Cli, ColorWhen, Commands};
pub use console::ConsoleEventSink;
pub use context::UiContext;
