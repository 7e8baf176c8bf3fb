//! # Path Connector
//!
//! Routes edges between consecutive waves so every node can be reached and every
//! route can continue, while keeping edges from crossing where possible.
//!
//! Each wave pair is wired in three passes: a biased greedy pass that gives every
//! source one or two nearby targets, an orphan pass that attaches targets nobody
//! picked, and finally a global repair pass over the whole graph. Gaps that survive
//! the repair pass are returned as diagnostics.

use crate::{
    Diagnostic, DiagnosticKind, NodeId, PathGraph, PathNode, SeedRng, SubseedRegistry,
    WavepathResult, LANE_COUNT,
};
use log::{debug, warn};

/// Maximum nearby targets a source tries in the greedy pass.
pub const MAX_TARGETS_PER_SOURCE: usize = 2;

/// Percent chance of a source getting a budget of two edges instead of one.
pub const SECOND_EDGE_CHANCE: u32 = 35;

/// Which sources the greedy pass serves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneBias {
    /// Low lanes first
    Left,
    /// High lanes first
    Right,
    /// Middle lanes first
    Center,
    /// Natural lane order
    Balanced,
}

impl LaneBias {
    /// Picks the bias that counteracts the outbound-edge histogram, perturbed by
    /// a seeded jitter.
    pub fn from_histogram(histogram: &[u32; LANE_COUNT as usize], rng: &mut SeedRng) -> Self {
        let total: u32 = histogram.iter().sum();
        let jitter = rng.rand_range(0, 21) as i64 - 10;
        if total == 0 {
            return LaneBias::Balanced;
        }

        let total = i64::from(total);
        let left = i64::from(histogram[0] + histogram[1]);
        let right = i64::from(histogram[2] + histogram[3]);
        let outer = i64::from(histogram[0] + histogram[3]);
        let skew = (left - right) * 100 / total + jitter;

        if skew > 20 {
            LaneBias::Right
        } else if skew < -20 {
            LaneBias::Left
        } else if outer * 100 / total + jitter > 60 {
            LaneBias::Center
        } else {
            LaneBias::Balanced
        }
    }

    /// Orders source lanes according to the bias.
    pub fn order(self, lanes: &mut [u8]) {
        match self {
            LaneBias::Left | LaneBias::Balanced => lanes.sort_unstable(),
            LaneBias::Right => lanes.sort_unstable_by(|a, b| b.cmp(a)),
            LaneBias::Center => lanes.sort_by_key(|&lane| ((i16::from(lane) * 2 - 3).abs(), lane)),
        }
    }
}

/// Edges chosen for one wave pair, indexed by position in the lane-sorted lists.
#[derive(Debug, Clone)]
pub struct CrossingMatrix {
    edges: Vec<Vec<bool>>,
}

impl CrossingMatrix {
    pub fn new(sources: usize, targets: usize) -> Self {
        Self {
            edges: vec![vec![false; targets]; sources],
        }
    }

    /// Records the edge `(source, target)`.
    pub fn mark(&mut self, source: usize, target: usize) {
        if let Some(cell) = self.edges.get_mut(source).and_then(|row| row.get_mut(target)) {
            *cell = true;
        }
    }

    /// Whether `(source, target)` would cross a recorded edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use wavepath::CrossingMatrix;
    ///
    /// let mut matrix = CrossingMatrix::new(2, 2);
    /// matrix.mark(0, 1);
    /// assert!(matrix.crosses(1, 0));
    /// assert!(!matrix.crosses(1, 1));
    /// ```
    pub fn crosses(&self, source: usize, target: usize) -> bool {
        self.edges.iter().enumerate().any(|(i, row)| {
            row.iter().enumerate().any(|(j, &marked)| {
                marked && ((i < source && j > target) || (i > source && j < target))
            })
        })
    }
}

/// Wires the nodes of a graph together.
#[derive(Debug, Clone)]
pub struct PathConnector {
    /// Percent chance of a source getting a second edge
    pub second_edge_chance: u32,
}

impl PathConnector {
    pub fn new() -> Self {
        Self {
            second_edge_chance: SECOND_EDGE_CHANCE,
        }
    }

    /// Connects every consecutive wave pair, then repairs remaining gaps.
    ///
    /// Returns one [`DiagnosticKind::ConnectivityDefect`] per gap that could not be
    /// repaired.
    pub fn connect(
        &self,
        graph: &mut PathGraph,
        rng: &mut SeedRng,
        registry: &mut SubseedRegistry,
    ) -> WavepathResult<Vec<Diagnostic>> {
        let waves: Vec<u32> = graph.wave_map().keys().copied().collect();
        let subseed = registry.derive_subseed("_connector");
        let mut scope = rng.enter(subseed);
        let mut histogram = [0u32; LANE_COUNT as usize];
        let mut edges = 0;

        for pair in waves.windows(2) {
            if pair[1] != pair[0] + 1 {
                continue;
            }
            edges += self.connect_waves(graph, &mut scope, pair[0], &mut histogram)?;
        }
        debug!("Connector routed {} edges between {} waves", edges, waves.len());

        let defects = self.repair(graph)?;
        for defect in &defects {
            warn!("Unrepaired connectivity gap: {}", defect);
        }
        Ok(defects)
    }

    fn connect_waves(
        &self,
        graph: &mut PathGraph,
        rng: &mut SeedRng,
        wave: u32,
        histogram: &mut [u32; LANE_COUNT as usize],
    ) -> WavepathResult<usize> {
        let sources: Vec<(u8, NodeId)> = graph
            .nodes_at(wave)
            .into_iter()
            .filter(|node| node.is_open_source())
            .map(|node| (node.lane, node.id.clone()))
            .collect();
        let targets: Vec<(u8, NodeId)> = graph
            .nodes_at(wave + 1)
            .into_iter()
            .filter(|node| node.is_open_target())
            .map(|node| (node.lane, node.id.clone()))
            .collect();
        if sources.is_empty() || targets.is_empty() {
            return Ok(0);
        }

        let bias = LaneBias::from_histogram(histogram, rng);
        let mut order: Vec<u8> = sources.iter().map(|(lane, _)| *lane).collect();
        bias.order(&mut order);

        let mut matrix = CrossingMatrix::new(sources.len(), targets.len());
        let mut added = 0;

        for lane in order {
            let Some(source_index) = sources.iter().position(|(l, _)| *l == lane) else {
                continue;
            };
            let budget = if rng.rand_chance(self.second_edge_chance) { 2 } else { 1 };
            let nearest = nearest_indices(lane, &targets);

            let mut chosen = 0;
            for &target_index in nearest.iter().take(MAX_TARGETS_PER_SOURCE) {
                if chosen == budget || matrix.crosses(source_index, target_index) {
                    continue;
                }
                if graph.connect(&sources[source_index].1, &targets[target_index].1)? {
                    matrix.mark(source_index, target_index);
                    histogram[usize::from(lane)] += 1;
                    chosen += 1;
                    added += 1;
                }
            }
            if chosen == 0 {
                if let Some(&target_index) = nearest.first() {
                    if graph.connect(&sources[source_index].1, &targets[target_index].1)? {
                        matrix.mark(source_index, target_index);
                        histogram[usize::from(lane)] += 1;
                        added += 1;
                    }
                }
            }
        }

        for (target_lane, target_id) in &targets {
            let orphaned = graph
                .node(target_id)
                .map(|node| node.previous_connections.is_empty())
                .unwrap_or(false);
            if !orphaned {
                continue;
            }

            let idle = nearest_indices(*target_lane, &sources)
                .into_iter()
                .find(|&index| self.outbound(graph, &sources[index].1) == 0);
            let chosen = idle.or_else(|| {
                (0..sources.len()).min_by_key(|&index| {
                    (
                        self.outbound(graph, &sources[index].1),
                        sources[index].0.abs_diff(*target_lane),
                        sources[index].0,
                    )
                })
            });
            if let Some(index) = chosen {
                if graph.connect(&sources[index].1, target_id)? {
                    histogram[usize::from(sources[index].0)] += 1;
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    fn outbound(&self, graph: &PathGraph, id: &NodeId) -> usize {
        graph.node(id).map(|node| node.connections.len()).unwrap_or(0)
    }

    /// Attaches every node still missing an inbound or outbound edge to its best
    /// neighbour, returning the gaps that have no legal candidate.
    pub fn repair(&self, graph: &mut PathGraph) -> WavepathResult<Vec<Diagnostic>> {
        let (Some(min_wave), Some(max_wave)) = (graph.min_wave(), graph.max_wave()) else {
            return Ok(Vec::new());
        };
        let mut defects = Vec::new();

        let missing_inbound: Vec<NodeId> = graph
            .iter()
            .filter(|node| node.wave > min_wave && node.previous_connections.is_empty())
            .filter(|node| !(node.is_challenge_reward() && node.chain().is_none()))
            .map(|node| node.id.clone())
            .collect();
        for id in missing_inbound {
            let Some(node) = graph.node(&id) else {
                continue;
            };
            let best = best_candidate(
                node,
                graph.nodes_at(node.wave - 1),
                |candidate| node.accepts_inbound_from(candidate),
                |candidate| candidate.connections.len(),
            );
            match best {
                Some(source) => {
                    debug!("Repaired inbound gap: {} -> {}", source, id);
                    graph.connect(&source, &id)?;
                }
                None => defects.push(Diagnostic::new(
                    DiagnosticKind::ConnectivityDefect,
                    &id,
                    "no legal predecessor on the previous wave",
                )),
            }
        }

        let missing_outbound: Vec<NodeId> = graph
            .iter()
            .filter(|node| node.wave < max_wave && node.connections.is_empty())
            .map(|node| node.id.clone())
            .collect();
        for id in missing_outbound {
            let Some(node) = graph.node(&id) else {
                continue;
            };
            let best = best_candidate(
                node,
                graph.nodes_at(node.wave + 1),
                |candidate| candidate.accepts_inbound_from(node),
                |candidate| candidate.previous_connections.len(),
            );
            match best {
                Some(target) => {
                    debug!("Repaired outbound gap: {} -> {}", id, target);
                    graph.connect(&id, &target)?;
                }
                None => defects.push(Diagnostic::new(
                    DiagnosticKind::ConnectivityDefect,
                    &id,
                    "no legal successor on the next wave",
                )),
            }
        }
        Ok(defects)
    }
}

impl Default for PathConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// Indices of `nodes` ordered by lane distance from `lane`, lower lanes first on ties.
fn nearest_indices(lane: u8, nodes: &[(u8, NodeId)]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..nodes.len()).collect();
    indices.sort_by_key(|&index| (nodes[index].0.abs_diff(lane), nodes[index].0));
    indices
}

/// Highest scoring legal neighbour, scored `-10 * lane distance - 3 * load`.
fn best_candidate<'g>(
    node: &PathNode,
    candidates: Vec<&'g PathNode>,
    legal: impl Fn(&PathNode) -> bool,
    load: impl Fn(&PathNode) -> usize,
) -> Option<NodeId> {
    candidates
        .into_iter()
        .filter(|candidate| legal(candidate))
        .max_by_key(|candidate| {
            let distance = i64::from(candidate.lane.abs_diff(node.lane));
            let score = -10 * distance - 3 * load(candidate) as i64;
            (score, std::cmp::Reverse(candidate.lane))
        })
        .map(|candidate| candidate.id.clone())
}
