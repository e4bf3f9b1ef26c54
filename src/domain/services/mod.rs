//! Domain Services
//!
//! Stateless logic over domain types.

mod stage_graph;

pub use stage_graph::{ArtifactKind, StageEdge, StageGraph, StageId};
