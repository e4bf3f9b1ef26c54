//! Domain Layer
//!
//! The pipeline's vocabulary, without process spawning or disk writes.
//!
//! ## Structure
//!
//! - `entities/` - Manifests, lock snapshots and the typed stage artifacts
//! - `value_objects/` - Layout convention, port, requirement, digest
//! - `services/` - Stage graph ordering
//! - `ports/` - Interfaces for command execution and event reporting

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
