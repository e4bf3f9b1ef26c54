//! Repository Implementations
//!
//! Loading and persisting the files stages read and write.

pub mod image_manifest;
pub mod installed;
pub mod manifest;

pub use installed::scan_installed;
pub use manifest::{load_lock, load_manifest, load_verified, VerifiedDependencies};
