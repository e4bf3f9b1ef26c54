//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod hash;
mod layout;
mod port;
mod requirement;

pub use hash::ContentHash;
pub use layout::{
    contained, normalize, LayoutConvention, ProjectLayout, PACKAGES_DIR, PYPROJECT, UV_LOCK,
};
pub use port::{resolve_port, Port};
pub use requirement::{PackageName, Requirement};
