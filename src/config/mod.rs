//! Configuration module for Stagehand
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (STAGEHAND_*)
//! 3. Project config (`stagehand.toml`)
//! 4. Built-in defaults (lowest priority)
//!
//! The listening port is deliberately absent from this hierarchy: it is read
//! from the environment when the server is launched, not when the image is built.

mod loader;
#[cfg(test)]
mod tests;
mod types;

pub use loader::{with_env_overrides, with_overrides_from, ConfigWarning};
pub use types::{
    BackendConfig, Config, FrontendConfig, LayoutConfig, PipelineConfig, RuntimeConfig,
    CONFIG_FILE,
};
