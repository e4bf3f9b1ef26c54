//! Stage graph - explicit ordering of pipeline stages
//!
//! Stages are nodes; each edge carries the artifact kind handed from producer to
//! consumer. `waves()` groups stages whose inputs are all satisfied by earlier
//! waves, so stages in one wave may run concurrently.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{StagehandError, StagehandResult};

/// Pipeline stage identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    Frontend,
    Backend,
    Assemble,
    Launch,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Frontend => "frontend",
            StageId::Backend => "backend",
            StageId::Assemble => "assemble",
            StageId::Launch => "launch",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StageId::Frontend => "build frontend static assets",
            StageId::Backend => "resolve backend dependencies",
            StageId::Assemble => "assemble runtime image",
            StageId::Launch => "launch backend server",
        }
    }

    /// Stages that run as part of `build`
    pub fn is_build_stage(&self) -> bool {
        !matches!(self, StageId::Launch)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What flows along an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    BuildArtifact,
    RuntimeEnvironment,
    RuntimeImage,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::BuildArtifact => "build-artifact",
            ArtifactKind::RuntimeEnvironment => "runtime-environment",
            ArtifactKind::RuntimeImage => "runtime-image",
        }
    }
}

/// Producer → consumer edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StageEdge {
    pub from: StageId,
    pub to: StageId,
    pub artifact: ArtifactKind,
}

/// Directed acyclic graph of stages
#[derive(Debug, Clone, Default)]
pub struct StageGraph {
    stages: BTreeSet<StageId>,
    edges: Vec<StageEdge>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// frontend ─┐
    ///           ├─▶ assemble ─▶ launch
    /// backend  ─┘
    pub fn standard() -> Self {
        let mut graph = Self::new();
        graph.add_stage(StageId::Frontend);
        graph.add_stage(StageId::Backend);
        graph.add_stage(StageId::Assemble);
        graph.add_stage(StageId::Launch);
        graph.add_edge(StageId::Frontend, StageId::Assemble, ArtifactKind::BuildArtifact);
        graph.add_edge(
            StageId::Backend,
            StageId::Assemble,
            ArtifactKind::RuntimeEnvironment,
        );
        graph.add_edge(StageId::Assemble, StageId::Launch, ArtifactKind::RuntimeImage);
        graph
    }

    pub fn add_stage(&mut self, stage: StageId) {
        self.stages.insert(stage);
    }

    pub fn add_edge(&mut self, from: StageId, to: StageId, artifact: ArtifactKind) {
        self.edges.push(StageEdge { from, to, artifact });
    }

    pub fn stages(&self) -> impl Iterator<Item = StageId> + '_ {
        self.stages.iter().copied()
    }

    pub fn edges(&self) -> &[StageEdge] {
        &self.edges
    }

    /// Direct predecessors of `stage`
    pub fn dependencies(&self, stage: StageId) -> Vec<StageId> {
        let mut deps: Vec<StageId> = self
            .edges
            .iter()
            .filter(|e| e.to == stage)
            .map(|e| e.from)
            .collect();
        deps.sort();
        deps.dedup();
        deps
    }

    /// Artifacts `stage` consumes
    pub fn inputs(&self, stage: StageId) -> Vec<ArtifactKind> {
        self.edges
            .iter()
            .filter(|e| e.to == stage)
            .map(|e| e.artifact)
            .collect()
    }

    /// Topological layers (Kahn's algorithm). Fails on unknown stages or cycles.
    pub fn waves(&self) -> StagehandResult<Vec<Vec<StageId>>> {
        for edge in &self.edges {
            for end in [edge.from, edge.to] {
                if !self.stages.contains(&end) {
                    return Err(StagehandError::StageGraph(format!(
                        "edge {} -> {} references unknown stage '{}'",
                        edge.from, edge.to, end
                    )));
                }
            }
            if edge.from == edge.to {
                return Err(StagehandError::StageGraph(format!(
                    "stage '{}' depends on itself",
                    edge.from
                )));
            }
        }

        let mut indegree: BTreeMap<StageId, usize> =
            self.stages.iter().map(|s| (*s, 0)).collect();
        for edge in &self.edges {
            *indegree.entry(edge.to).or_default() += 1;
        }

        let mut waves = Vec::new();
        let mut done = 0;
        loop {
            let ready: Vec<StageId> = indegree
                .iter()
                .filter(|(_, d)| **d == 0)
                .map(|(s, _)| *s)
                .collect();
            if ready.is_empty() {
                break;
            }
            for stage in &ready {
                indegree.remove(stage);
                for edge in self.edges.iter().filter(|e| e.from == *stage) {
                    if let Some(d) = indegree.get_mut(&edge.to) {
                        *d -= 1;
                    }
                }
            }
            done += ready.len();
            waves.push(ready);
        }

        if done != self.stages.len() {
            let stuck: Vec<&str> = indegree.keys().map(|s| s.as_str()).collect();
            return Err(StagehandError::StageGraph(format!(
                "cycle among stages: {}",
                stuck.join(", ")
            )));
        }
        Ok(waves)
    }

    /// Waves restricted to `build` stages
    pub fn build_waves(&self) -> StagehandResult<Vec<Vec<StageId>>> {
        Ok(self
            .waves()?
            .into_iter()
            .map(|wave| wave.into_iter().filter(StageId::is_build_stage).collect::<Vec<_>>())
            .filter(|wave| !wave.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn standard_graph_runs_leaves_together() {
        let waves = StageGraph::standard().waves().unwrap();
        assert_eq!(
            waves,
            vec![
                vec![StageId::Frontend, StageId::Backend],
                vec![StageId::Assemble],
                vec![StageId::Launch],
            ]
        );
    }

    #[test]
    fn build_waves_exclude_launch() {
        let waves = StageGraph::standard().build_waves().unwrap();
        assert_eq!(waves.len(), 2);
        assert!(!waves.iter().flatten().any(|s| *s == StageId::Launch));
    }

    #[test]
    fn assemble_consumes_both_artifacts() {
        let graph = StageGraph::standard();
        assert_eq!(
            graph.dependencies(StageId::Assemble),
            vec![StageId::Frontend, StageId::Backend]
        );
        let inputs = graph.inputs(StageId::Assemble);
        assert!(inputs.contains(&ArtifactKind::BuildArtifact));
        assert!(inputs.contains(&ArtifactKind::RuntimeEnvironment));
    }

    #[test]
    fn cycle_is_rejected() {
        let mut graph = StageGraph::standard();
        graph.add_edge(StageId::Launch, StageId::Frontend, ArtifactKind::RuntimeImage);
        let err = graph.waves().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let mut graph = StageGraph::new();
        graph.add_stage(StageId::Frontend);
        graph.add_edge(StageId::Frontend, StageId::Assemble, ArtifactKind::BuildArtifact);
        let err = graph.waves().unwrap_err();
        assert!(err.to_string().contains("unknown stage"));
    }

    #[test]
    fn self_edge_is_rejected() {
        let mut graph = StageGraph::new();
        graph.add_stage(StageId::Backend);
        graph.add_edge(StageId::Backend, StageId::Backend, ArtifactKind::RuntimeEnvironment);
        assert!(graph.waves().is_err());
    }

    const ALL: [StageId; 4] = [
        StageId::Frontend,
        StageId::Backend,
        StageId::Assemble,
        StageId::Launch,
    ];

    proptest! {
        // Forward-only edges over a fixed order always form a DAG, and every
        // edge must point from an earlier wave to a later one.
        #[test]
        fn waves_respect_every_edge(pairs in proptest::collection::vec((0usize..4, 0usize..4), 0..8)) {
            let mut graph = StageGraph::new();
            for s in ALL {
                graph.add_stage(s);
            }
            for (a, b) in pairs {
                if a < b {
                    graph.add_edge(ALL[a], ALL[b], ArtifactKind::BuildArtifact);
                }
            }
            let waves = graph.waves().unwrap();
            let position = |s: StageId| waves.iter().position(|w| w.contains(&s)).unwrap();
            for edge in graph.edges() {
                prop_assert!(position(edge.from) < position(edge.to));
            }
            prop_assert_eq!(waves.iter().map(Vec::len).sum::<usize>(), 4);
        }
    }
}
