//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - Tree copies, atomic writes, digests
//! - `repositories/` - Manifests, lock snapshots, installed sets, image marker
//! - `events/` - Event sinks
//! - `process` - System command runner and server spawning
//! - `pipeline_lock` - Exclusive lock against concurrent builds

pub mod events;
pub mod fs;
pub mod pipeline_lock;
pub mod process;
pub mod repositories;

pub use events::JsonEventSink;
pub use pipeline_lock::PipelineLock;
pub use process::{spawn_server, ServerProcess, SystemRunner};
