//! # Generation Context
//!
//! Caller-owned handle on a generated path and the player's position in it.

use crate::{BattlePath, NodeId, PathNode};

/// Owns a published [`BattlePath`] together with the currently occupied node.
///
/// This is the only place where run progress is tracked; the path itself stays
/// immutable.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    path: BattlePath,
    current: Option<NodeId>,
}

impl GenerationContext {
    /// Wraps a freshly generated path; no node is occupied yet.
    pub fn new(path: BattlePath) -> Self {
        Self {
            path,
            current: None,
        }
    }

    /// The path being played.
    pub fn battle_path(&self) -> &BattlePath {
        &self.path
    }

    /// The occupied node, if a node has been selected.
    pub fn current_node(&self) -> Option<&PathNode> {
        self.current.as_ref().and_then(|id| self.path.node(id))
    }

    /// Nodes the player may pick at `wave`.
    ///
    /// Before any selection this is the whole first wave. Afterwards it is the
    /// occupied node's outgoing edges that land on `wave`.
    pub fn available_paths_from(&self, wave: u32) -> Vec<&PathNode> {
        match self.current_node() {
            None if wave == self.path.start_wave() => self.path.nodes_at_wave(wave),
            None => Vec::new(),
            Some(current) => current
                .connections
                .iter()
                .filter_map(|id| self.path.node(id))
                .filter(|node| node.wave == wave)
                .collect(),
        }
    }

    /// Moves to `node_id` if it is reachable from the occupied node.
    ///
    /// Returns `false`, leaving the position unchanged, for unknown or unreachable
    /// nodes.
    pub fn select_path(&mut self, node_id: &NodeId) -> bool {
        let Some(target) = self.path.node(node_id) else {
            return false;
        };
        let reachable = match self.current_node() {
            None => target.wave == self.path.start_wave(),
            Some(current) => current.connections.contains(node_id),
        };
        if reachable {
            self.current = Some(node_id.clone());
        }
        reachable
    }

    /// Forgets the occupied node.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Releases the path, consuming the context.
    pub fn into_path(self) -> BattlePath {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;

    #[test]
    fn test_first_selection_is_limited_to_start_wave() {
        let path = generate("CTX", 60).unwrap();
        let mut context = GenerationContext::new(path);

        let first_wave = context.available_paths_from(1);
        assert!(!first_wave.is_empty());
        assert!(context.available_paths_from(2).is_empty());
        let first = first_wave[0].id.clone();

        let later = context.battle_path().nodes_at_wave(2)[0].id.clone();
        assert!(!context.select_path(&later));
        assert!(context.current_node().is_none());

        assert!(context.select_path(&first));
        assert_eq!(context.current_node().map(|node| &node.id), Some(&first));
    }

    #[test]
    fn test_walk_follows_connections_to_the_end() {
        let path = generate("WALK", 60).unwrap();
        let total = path.total_waves();
        let mut context = GenerationContext::new(path);

        let start = context.available_paths_from(1)[0].id.clone();
        assert!(context.select_path(&start));

        let mut wave = 1;
        loop {
            let Some(current) = context.current_node() else {
                panic!("lost position at wave {wave}");
            };
            if current.connections.is_empty() {
                break;
            }
            let next_wave = context
                .battle_path()
                .node(&current.connections[0])
                .map(|node| node.wave)
                .unwrap();
            let options: Vec<NodeId> = context
                .available_paths_from(next_wave)
                .iter()
                .map(|node| node.id.clone())
                .collect();
            assert!(!options.is_empty());
            assert!(context.select_path(&options[options.len() - 1]));
            wave = next_wave;
        }
        assert_eq!(wave, total);
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let path = generate("UNKNOWN", 40).unwrap();
        let mut context = GenerationContext::new(path);
        let ghost = NodeId::new(999, 0, crate::PathNodeType::WildBattle);
        assert!(!context.select_path(&ghost));
        context.reset();
        assert!(context.current_node().is_none());
    }
}
