//! Stagehand - build-and-launch orchestrator for a two-tier web app
//!
//! Stagehand turns a project with a JavaScript frontend and a Python backend
//! into a self-contained runtime image: static assets are built once, backend
//! dependencies are installed from the lock snapshot, and everything is
//! placed where the server expects it. The only runtime setting is the port.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

// Re-exports for convenience
pub use application::{plan_launch, CheckUseCase, LaunchPlan, Pipeline};
pub use config::Config;
pub use domain::value_objects::{LayoutConvention, Port, ProjectLayout};
pub use error::{StagehandError, StagehandResult};
