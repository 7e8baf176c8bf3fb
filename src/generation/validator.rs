//! # Integrity Validator
//!
//! Read-only structural checks over a [`PathGraph`]. Findings are returned as
//! [`Diagnostic`] values; the graph is never touched.

use crate::{NodeId, PathGraph, PathNode, LANE_COUNT};
use pathfinding::prelude::bfs_reach;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kinds of structural defects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Two nodes on the same wave and lane, or a lane outside the wave
    DuplicateLane,
    MissingOutbound,
    MissingInbound,
    /// An edge recorded on only one of its endpoints
    AsymmetricEdge,
    /// An edge skipping or reversing waves
    NonAdjacentEdge,
    /// An edge into a gauntlet from outside it, or out of a gauntlet battle
    ChainIntrusion,
    /// An edge to an id that is not in the graph
    DanglingEdge,
    Unreachable,
    /// A gap the connector could not repair
    ConnectivityDefect,
}

/// One structural finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub node: NodeId,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, node: &NodeId, message: impl Into<String>) -> Self {
        Self {
            kind,
            node: node.clone(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.kind, self.node, self.message)
    }
}

/// Findings of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Whether no defect was found.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of findings of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.kind == kind)
            .count()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Checks the structural invariants of a path graph.
#[derive(Debug, Clone, Default)]
pub struct IntegrityValidator;

impl IntegrityValidator {
    pub fn new() -> Self {
        Self
    }

    /// Runs every check and collects the findings.
    pub fn validate(&self, graph: &PathGraph) -> ValidationReport {
        let mut diagnostics = Vec::new();
        let (Some(min_wave), Some(max_wave)) = (graph.min_wave(), graph.max_wave()) else {
            return ValidationReport { diagnostics };
        };

        self.check_lanes(graph, &mut diagnostics);
        for node in graph.iter() {
            self.check_edges(graph, node, &mut diagnostics);

            if node.wave < max_wave && node.connections.is_empty() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingOutbound,
                    &node.id,
                    format!("no outbound edge on wave {}", node.wave),
                ));
            }
            let unchained_reward = node.is_challenge_reward() && node.chain().is_none();
            if node.wave > min_wave && node.previous_connections.is_empty() && !unchained_reward {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingInbound,
                    &node.id,
                    format!("no inbound edge on wave {}", node.wave),
                ));
            }
        }
        self.check_reachability(graph, min_wave, &mut diagnostics);

        ValidationReport { diagnostics }
    }

    fn check_lanes(&self, graph: &PathGraph, diagnostics: &mut Vec<Diagnostic>) {
        for (wave, ids) in graph.wave_map() {
            let mut seen: BTreeMap<u8, &NodeId> = BTreeMap::new();
            for id in ids {
                let Some(node) = graph.node(id) else {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DanglingEdge,
                        id,
                        format!("wave {wave} lists an unknown node"),
                    ));
                    continue;
                };
                if node.lane >= LANE_COUNT || node.wave != *wave {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DuplicateLane,
                        id,
                        format!("lane {} of wave {} is outside the grid", node.lane, node.wave),
                    ));
                } else if let Some(other) = seen.insert(node.lane, id) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DuplicateLane,
                        id,
                        format!("shares wave {wave} lane {} with {other}", node.lane),
                    ));
                }
            }
        }
    }

    fn check_edges(&self, graph: &PathGraph, node: &PathNode, diagnostics: &mut Vec<Diagnostic>) {
        for target_id in &node.connections {
            let Some(target) = graph.node(target_id) else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DanglingEdge,
                    &node.id,
                    format!("edge to unknown node {target_id}"),
                ));
                continue;
            };
            if !target.previous_connections.contains(&node.id) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::AsymmetricEdge,
                    &node.id,
                    format!("{target_id} does not list it as a predecessor"),
                ));
            }
            let reward_edge = node.is_challenge_reward() || target.is_challenge_reward();
            if target.wave != node.wave + 1 && !reward_edge {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::NonAdjacentEdge,
                    &node.id,
                    format!("edge from wave {} to wave {}", node.wave, target.wave),
                ));
            }
            if !target.accepts_inbound_from(node) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::ChainIntrusion,
                    &node.id,
                    format!("edge to {target_id} breaks a challenge chain"),
                ));
            }
        }

        for source_id in &node.previous_connections {
            match graph.node(source_id) {
                None => diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DanglingEdge,
                    &node.id,
                    format!("predecessor {source_id} is unknown"),
                )),
                Some(source) if !source.connections.contains(&node.id) => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::AsymmetricEdge,
                        &node.id,
                        format!("predecessor {source_id} has no edge to it"),
                    ))
                }
                Some(_) => {}
            }
        }
    }

    fn check_reachability(&self, graph: &PathGraph, min_wave: u32, diagnostics: &mut Vec<Diagnostic>) {
        let roots: Vec<NodeId> = graph
            .nodes_at(min_wave)
            .iter()
            .map(|node| node.id.clone())
            .collect();

        let reached: BTreeSet<NodeId> = bfs_reach(None, |current: &Option<NodeId>| match current {
            None => roots.iter().cloned().map(Some).collect::<Vec<_>>(),
            Some(id) => graph
                .node(id)
                .map(|node| {
                    node.connections
                        .iter()
                        .filter(|next| graph.node(next).is_some())
                        .cloned()
                        .map(Some)
                        .collect()
                })
                .unwrap_or_default(),
        })
        .flatten()
        .collect();

        for node in graph.iter() {
            if !reached.contains(&node.id) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Unreachable,
                    &node.id,
                    format!("not reachable from wave {min_wave}"),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChallengeArchetype, ChallengeLink, NodeMetadata, PathNodeType};

    fn line(waves: u32) -> (PathGraph, Vec<NodeId>) {
        let mut graph = PathGraph::new();
        let ids: Vec<NodeId> = (1..=waves)
            .map(|wave| {
                graph
                    .insert(PathNode::new(wave, 1, PathNodeType::WildBattle))
                    .unwrap()
            })
            .collect();
        for pair in ids.windows(2) {
            graph.connect(&pair[0], &pair[1]).unwrap();
        }
        (graph, ids)
    }

    #[test]
    fn test_clean_graph_has_no_findings() {
        let (graph, _) = line(5);
        let report = IntegrityValidator::new().validate(&graph);
        assert!(report.is_clean(), "{:?}", report.diagnostics());
    }

    #[test]
    fn test_empty_graph_is_clean() {
        assert!(IntegrityValidator::new().validate(&PathGraph::new()).is_clean());
    }

    #[test]
    fn test_detects_gaps_without_mutating() {
        let (mut graph, _) = line(3);
        let orphan = graph
            .insert(PathNode::new(2, 3, PathNodeType::Money))
            .unwrap();
        let before = graph.clone();

        let report = IntegrityValidator::new().validate(&graph);
        assert_eq!(graph, before);
        assert_eq!(report.count(DiagnosticKind::MissingInbound), 1);
        assert_eq!(report.count(DiagnosticKind::MissingOutbound), 1);
        assert_eq!(report.count(DiagnosticKind::Unreachable), 1);
        assert!(report
            .diagnostics()
            .iter()
            .all(|diagnostic| diagnostic.node == orphan));
    }

    #[test]
    fn test_detects_asymmetric_and_dangling_edges() {
        let (mut graph, ids) = line(3);
        let ghost = NodeId::new(4, 0, PathNodeType::WildBattle);
        if let Some(node) = graph.node_mut(&ids[2]) {
            node.connections.push(ghost);
        }
        if let Some(node) = graph.node_mut(&ids[1]) {
            node.previous_connections.clear();
        }

        let report = IntegrityValidator::new().validate(&graph);
        assert_eq!(report.count(DiagnosticKind::DanglingEdge), 1);
        assert_eq!(report.count(DiagnosticKind::AsymmetricEdge), 1);
    }

    #[test]
    fn test_detects_non_adjacent_edges() {
        let (mut graph, ids) = line(4);
        graph.connect(&ids[0], &ids[3]).unwrap();
        let report = IntegrityValidator::new().validate(&graph);
        assert_eq!(report.count(DiagnosticKind::NonAdjacentEdge), 1);
    }

    #[test]
    fn test_detects_chain_intrusion() {
        let (mut graph, ids) = line(3);
        let link = |index| NodeMetadata {
            challenge: Some(ChallengeLink {
                chain_id: 4,
                index,
                length: 3,
                archetype: ChallengeArchetype::Nightmare,
            }),
            ..NodeMetadata::default()
        };
        let locked = graph
            .insert(PathNode::new(3, 3, PathNodeType::ChallengeRival).with_metadata(link(1)))
            .unwrap();
        graph.connect(&ids[1], &locked).unwrap();

        let report = IntegrityValidator::new().validate(&graph);
        assert_eq!(report.count(DiagnosticKind::ChainIntrusion), 1);
    }

    #[test]
    fn test_diagnostic_display_names_node() {
        let id = NodeId::new(3, 1, PathNodeType::WildBattle);
        let diagnostic = Diagnostic::new(DiagnosticKind::MissingInbound, &id, "gap");
        assert_eq!(diagnostic.to_string(), "MissingInbound at w3_l1_wild_battle: gap");
    }
}
