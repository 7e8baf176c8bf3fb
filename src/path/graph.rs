//! # Path Graph
//!
//! The node arena used while a path is being built, and the immutable
//! [`BattlePath`] that is published once generation finishes.

use crate::{
    ChallengePath, Diagnostic, DiagnosticKind, IntegrityValidator, NodeId, PathNode,
    SpecialWaveSet, WavepathError, WavepathResult, LANE_COUNT,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Arena of path nodes indexed by id and by wave.
///
/// Edges are stored on both endpoints; [`PathGraph::connect`] keeps the two sides
/// in sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathGraph {
    nodes: BTreeMap<NodeId, PathNode>,
    waves: BTreeMap<u32, Vec<NodeId>>,
}

impl PathGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, rejecting lane clashes and out-of-range lanes.
    pub fn insert(&mut self, node: PathNode) -> WavepathResult<NodeId> {
        if node.lane >= LANE_COUNT {
            return Err(WavepathError::InvalidState(format!(
                "Lane {} of node {} is out of range",
                node.lane, node.id
            )));
        }
        if self.lane_taken(node.wave, node.lane) {
            return Err(WavepathError::InvalidState(format!(
                "Wave {} lane {} is already occupied",
                node.wave, node.lane
            )));
        }

        let id = node.id.clone();
        let wave = node.wave;
        self.nodes.insert(id.clone(), node);

        let nodes = &self.nodes;
        let wave_ids = self.waves.entry(wave).or_default();
        wave_ids.push(id.clone());
        wave_ids.sort_by_key(|candidate| nodes.get(candidate).map(|n| n.lane));
        Ok(id)
    }

    /// Adds the edge `from -> to` on both endpoints.
    ///
    /// Returns `Ok(false)` when the edge already existed.
    pub fn connect(&mut self, from: &NodeId, to: &NodeId) -> WavepathResult<bool> {
        if !self.nodes.contains_key(to) {
            return Err(WavepathError::InvalidState(format!("Unknown node {to}")));
        }
        let source = self
            .nodes
            .get_mut(from)
            .ok_or_else(|| WavepathError::InvalidState(format!("Unknown node {from}")))?;
        if source.connections.contains(to) {
            return Ok(false);
        }
        source.connections.push(to.clone());

        if let Some(target) = self.nodes.get_mut(to) {
            if !target.previous_connections.contains(from) {
                target.previous_connections.push(from.clone());
            }
        }
        Ok(true)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&PathNode> {
        self.nodes.get(id)
    }

    #[cfg(test)]
    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut PathNode> {
        self.nodes.get_mut(id)
    }

    /// All nodes keyed by id.
    pub fn node_map(&self) -> &BTreeMap<NodeId, PathNode> {
        &self.nodes
    }

    /// Node ids per wave, each list sorted by lane.
    pub fn wave_map(&self) -> &BTreeMap<u32, Vec<NodeId>> {
        &self.waves
    }

    /// Nodes of one wave, sorted by lane.
    pub fn nodes_at(&self, wave: u32) -> Vec<&PathNode> {
        self.waves
            .get(&wave)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    /// Whether `(wave, lane)` already holds a node.
    pub fn lane_taken(&self, wave: u32, lane: u8) -> bool {
        self.nodes_at(wave).iter().any(|node| node.lane == lane)
    }

    /// Lanes of `wave` that are still empty, ascending.
    pub fn free_lanes(&self, wave: u32) -> Vec<u8> {
        (0..LANE_COUNT)
            .filter(|&lane| !self.lane_taken(wave, lane))
            .collect()
    }

    /// Lowest wave holding a node.
    pub fn min_wave(&self) -> Option<u32> {
        self.waves.keys().next().copied()
    }

    /// Highest wave holding a node.
    pub fn max_wave(&self) -> Option<u32> {
        self.waves.keys().next_back().copied()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.connections.len()).sum()
    }

    /// Iterates nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.values()
    }
}

/// A band of waves that funnels back into a single convergence wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathLayer {
    pub layer_index: u32,
    pub start_wave: u32,
    pub end_wave: u32,
    pub convergence_wave: u32,
    /// Ids of the nodes owned by this layer
    pub nodes: Vec<NodeId>,
}

impl PathLayer {
    /// Creates an empty layer for `start_wave..=end_wave`.
    pub fn new(layer_index: u32, start_wave: u32, end_wave: u32) -> Self {
        Self {
            layer_index,
            start_wave,
            end_wave,
            convergence_wave: end_wave,
            nodes: Vec::new(),
        }
    }

    /// Whether `wave` falls inside this layer.
    pub fn contains(&self, wave: u32) -> bool {
        (self.start_wave..=self.end_wave).contains(&wave)
    }
}

/// The published result of a generation run.
///
/// There are no mutating methods: a new run produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattlePath {
    seed: String,
    total_waves: u32,
    start_wave: u32,
    layers: Vec<PathLayer>,
    convergence_points: Vec<u32>,
    graph: PathGraph,
    special_waves: SpecialWaveSet,
    challenge_paths: Vec<ChallengePath>,
    diagnostics: Vec<Diagnostic>,
}

impl BattlePath {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        seed: String,
        total_waves: u32,
        start_wave: u32,
        layers: Vec<PathLayer>,
        graph: PathGraph,
        special_waves: SpecialWaveSet,
        challenge_paths: Vec<ChallengePath>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let convergence_points = layers.iter().map(|layer| layer.convergence_wave).collect();
        Self {
            seed,
            total_waves,
            start_wave,
            layers,
            convergence_points,
            graph,
            special_waves,
            challenge_paths,
            diagnostics,
        }
    }

    /// Root seed the path was generated from.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Number of waves in the run.
    pub fn total_waves(&self) -> u32 {
        self.total_waves
    }

    /// First wave that holds nodes.
    pub fn start_wave(&self) -> u32 {
        self.start_wave
    }

    /// Layers in wave order.
    pub fn layers(&self) -> &[PathLayer] {
        &self.layers
    }

    /// Convergence wave of every layer.
    pub fn convergence_points(&self) -> &[u32] {
        &self.convergence_points
    }

    /// The underlying node arena.
    pub fn graph(&self) -> &PathGraph {
        &self.graph
    }

    /// All nodes keyed by id.
    pub fn node_map(&self) -> &BTreeMap<NodeId, PathNode> {
        self.graph.node_map()
    }

    /// Node ids per wave, sorted by lane.
    pub fn wave_to_node_map(&self) -> &BTreeMap<u32, Vec<NodeId>> {
        self.graph.wave_map()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&PathNode> {
        self.graph.node(id)
    }

    /// Nodes of one wave, sorted by lane.
    pub fn nodes_at_wave(&self, wave: u32) -> Vec<&PathNode> {
        self.graph.nodes_at(wave)
    }

    /// Special-wave placements the path was built from.
    pub fn special_waves(&self) -> &SpecialWaveSet {
        &self.special_waves
    }

    /// Challenge gauntlets embedded in the path.
    pub fn challenge_paths(&self) -> &[ChallengePath] {
        &self.challenge_paths
    }

    /// Integrity findings on the final graph; empty for a healthy path.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Serializes the path to JSON.
    pub fn to_json(&self) -> WavepathResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores a path from JSON, rejecting asymmetric edges.
    pub fn from_json(json: &str) -> WavepathResult<Self> {
        let path: BattlePath = serde_json::from_str(json)?;
        let report = IntegrityValidator::new().validate(&path.graph);
        if let Some(defect) = report.diagnostics().iter().find(|diagnostic| {
            matches!(
                diagnostic.kind,
                DiagnosticKind::AsymmetricEdge | DiagnosticKind::DanglingEdge
            )
        }) {
            return Err(WavepathError::InvalidState(format!(
                "Stored path is inconsistent: {}",
                defect.message
            )));
        }
        Ok(path)
    }

    /// Writes the path as JSON to `path`.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> WavepathResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads a path previously written by [`BattlePath::save_to_file`].
    pub fn load_from_file(path: impl AsRef<Path>) -> WavepathResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathNodeType;

    #[test]
    fn test_insert_rejects_lane_clash() {
        let mut graph = PathGraph::new();
        graph
            .insert(PathNode::new(5, 1, PathNodeType::WildBattle))
            .unwrap();
        assert!(graph
            .insert(PathNode::new(5, 1, PathNodeType::TrainerBattle))
            .is_err());
        assert!(graph
            .insert(PathNode::new(5, LANE_COUNT, PathNodeType::Money))
            .is_err());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_wave_lists_are_lane_sorted() {
        let mut graph = PathGraph::new();
        for lane in [3, 0, 2] {
            graph
                .insert(PathNode::new(7, lane, PathNodeType::WildBattle))
                .unwrap();
        }
        let lanes: Vec<u8> = graph.nodes_at(7).iter().map(|node| node.lane).collect();
        assert_eq!(lanes, vec![0, 2, 3]);
        assert_eq!(graph.free_lanes(7), vec![1]);
        assert_eq!(graph.free_lanes(8), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_connect_is_symmetric_and_idempotent() {
        let mut graph = PathGraph::new();
        let a = graph
            .insert(PathNode::new(1, 0, PathNodeType::WildBattle))
            .unwrap();
        let b = graph
            .insert(PathNode::new(2, 1, PathNodeType::Money))
            .unwrap();

        assert!(graph.connect(&a, &b).unwrap());
        assert!(!graph.connect(&a, &b).unwrap());
        assert_eq!(graph.node(&a).unwrap().connections, vec![b.clone()]);
        assert_eq!(graph.node(&b).unwrap().previous_connections, vec![a.clone()]);
        assert_eq!(graph.edge_count(), 1);

        let ghost = NodeId::new(3, 0, PathNodeType::WildBattle);
        assert!(graph.connect(&a, &ghost).is_err());
        assert!(graph.connect(&ghost, &a).is_err());
    }

    #[test]
    fn test_min_and_max_wave() {
        let mut graph = PathGraph::new();
        assert_eq!(graph.min_wave(), None);
        graph
            .insert(PathNode::new(4, 0, PathNodeType::WildBattle))
            .unwrap();
        graph
            .insert(PathNode::new(9, 0, PathNodeType::WildBattle))
            .unwrap();
        assert_eq!(graph.min_wave(), Some(4));
        assert_eq!(graph.max_wave(), Some(9));
    }

    #[test]
    fn test_layer_contains() {
        let layer = PathLayer::new(0, 1, 20);
        assert!(layer.contains(1));
        assert!(layer.contains(20));
        assert!(!layer.contains(21));
        assert_eq!(layer.convergence_wave, 20);
    }
}
