//! Common test utilities for Stagehand CLI scenario tests.
//!
//! - `TestEnv`: a two-tier project in a temp directory plus stand-in tools
//! - Fixtures: manifests, lock snapshots and the npm/pip stand-in scripts

#![allow(dead_code)]

pub mod env;
pub mod fixtures;

pub use env::*;
pub use fixtures::*;
