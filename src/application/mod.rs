//! Application Layer
//!
//! Use cases that orchestrate the build and launch flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Stages
//!
//! - `FrontendBuilder` - frontend source to static assets
//! - `BackendResolver` - backend manifest and lock to installed packages
//! - `ImageAssembler` - both outputs into one image directory
//! - `plan_launch` / `launch` - start the server from an image
//!
//! ## Use Cases
//!
//! - `Pipeline` - runs the build stages in stage-graph order
//! - `CheckUseCase` - validates a project without building it

pub mod assemble;
pub mod backend;
pub mod check;
mod command;
pub mod frontend;
pub mod launch;
pub mod pipeline;
#[cfg(test)]
pub(crate) mod testing;

pub use assemble::ImageAssembler;
pub use backend::{locate_manifest, BackendResolver};
pub use check::{CheckItem, CheckResult, CheckStatus, CheckUseCase};
pub use frontend::FrontendBuilder;
#[cfg(unix)]
pub use launch::exec;
pub use launch::{launch, plan_launch, LaunchPlan, PortSource};
pub use pipeline::Pipeline;
