//! Domain Entities
//!
//! - `SourceBundle` - read-only input tree of a leaf stage
//! - `DependencyManifest` - declared dependencies of a source bundle
//! - `LockSnapshot` - pinned versions plus the declarations they came from
//! - `BuildArtifact` / `RuntimeEnvironment` / `RuntimeImage` - stage outputs

mod artifact;
mod lock_snapshot;
mod manifest;
mod source;

pub use artifact::{BuildArtifact, ImageManifest, InstalledSet, RuntimeEnvironment, RuntimeImage};
pub use lock_snapshot::{LockDiff, LockSnapshot};
pub use manifest::{DependencyManifest, Ecosystem};
pub use source::{SourceBundle, SourceKind};
