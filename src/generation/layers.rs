//! # Layer Builder
//!
//! Turns a special-wave schedule into the node arena: special and convergence
//! nodes first, then challenge gauntlets, then filler nodes on every wave that
//! still has room. Edges other than the gauntlet links are left to the connector.

use crate::generation::utils::layer_bounds;
use crate::{
    challenge_windows, plan_challenge, BattleFactory, ChallengePath, ChallengePlacer,
    DynamicMode, EvilTeamRole, GenerationConfig, NodeMetadata, PathGraph, PathLayer, PathNode,
    PathNodeType, SeedRng, SpecialCategory, SpecialWaveSet, SubseedRegistry, WavepathResult,
    SPECIAL_LANE,
};
use log::{debug, info};
use std::collections::BTreeSet;

/// Relative odds of a wave holding 1, 2, 3 or 4 filler nodes.
pub const NODE_COUNT_WEIGHTS: [u32; 4] = [10, 30, 35, 25];

/// Lane orderings filler nodes are assigned in, selected by wave number.
pub const LANE_PATTERNS: [[u8; 4]; 5] = [
    [0, 1, 2, 3],
    [1, 2, 0, 3],
    [2, 1, 3, 0],
    [3, 2, 1, 0],
    [1, 3, 0, 2],
];

/// Filler node odds.
pub const FILLER_WEIGHTS: [(PathNodeType, u32); 28] = [
    (PathNodeType::WildBattle, 40),
    (PathNodeType::TrainerBattle, 30),
    (PathNodeType::RecoveryBoss, 2),
    (PathNodeType::ItemGeneral, 2),
    (PathNodeType::ItemBerry, 2),
    (PathNodeType::ItemTm, 1),
    (PathNodeType::AnyTms, 1),
    (PathNodeType::Money, 2),
    (PathNodeType::PermaMoney, 1),
    (PathNodeType::Mints, 1),
    (PathNodeType::AbilitySwitchers, 1),
    (PathNodeType::StatSwitchers, 1),
    (PathNodeType::TypeSwitcher, 1),
    (PathNodeType::PassiveAbility, 1),
    (PathNodeType::ExpShare, 1),
    (PathNodeType::PpMax, 1),
    (PathNodeType::DnaSplicers, 1),
    (PathNodeType::GoldenPokeball, 1),
    (PathNodeType::RogueBallItems, 1),
    (PathNodeType::MasterBallItems, 1),
    (PathNodeType::EggVoucher, 1),
    (PathNodeType::AddPokemon, 1),
    (PathNodeType::ReleaseItems, 1),
    (PathNodeType::GlitchPiece, 1),
    (PathNodeType::PermaItems, 1),
    (PathNodeType::RandPermaItem, 1),
    (PathNodeType::CollectedType, 1),
    (PathNodeType::MysteryNode, 1),
];

/// Filler battles after this wave may carry a dynamic mode.
pub const DYNAMIC_MODE_START_WAVE: u32 = 50;

/// Percent chance of a filler battle carrying a dynamic mode.
pub const DYNAMIC_MODE_CHANCE: u32 = 8;

/// Nodes, layers and gauntlets produced by [`LayerBuilder::build`].
#[derive(Debug, Clone)]
pub struct LayerOutcome {
    pub graph: PathGraph,
    pub layers: Vec<PathLayer>,
    pub challenge_paths: Vec<ChallengePath>,
}

/// Builds the node arena of a run.
#[derive(Debug)]
pub struct LayerBuilder<'a> {
    factory: &'a dyn BattleFactory,
}

impl<'a> LayerBuilder<'a> {
    pub fn new(factory: &'a dyn BattleFactory) -> Self {
        Self { factory }
    }

    /// Creates every node of the run.
    ///
    /// Waves that hold a convergence node or a required special hold nothing else;
    /// every other wave gets at least one filler node.
    pub fn build(
        &self,
        config: &GenerationConfig,
        rng: &mut SeedRng,
        registry: &mut SubseedRegistry,
        specials: &SpecialWaveSet,
    ) -> WavepathResult<LayerOutcome> {
        let bounds = layer_bounds(config.start_wave, config.total_waves, config.layer_size);
        let convergence: BTreeSet<u32> = bounds.iter().map(|&(_, end)| end).collect();
        let mut graph = PathGraph::new();

        let mut single_node_waves = convergence.clone();
        for wave in config.start_wave..=config.total_waves {
            let Some(category) = specials.category_at(wave) else {
                continue;
            };
            let funnel = convergence.contains(&wave);
            let mut node = self.special_node(specials, category, wave);
            if funnel || category.is_required() {
                node = node.required();
                single_node_waves.insert(wave);
            }
            graph.insert(node)?;
        }
        for &wave in &convergence {
            if !graph.lane_taken(wave, SPECIAL_LANE) {
                graph.insert(PathNode::new(wave, SPECIAL_LANE, PathNodeType::ConvergencePoint).required())?;
            }
        }

        let challenge_paths = self.place_challenges(config, rng, registry, &mut graph, &single_node_waves)?;

        for wave in config.start_wave..=config.total_waves {
            if single_node_waves.contains(&wave) {
                continue;
            }
            let subseed = registry.derive_subseed(&format!("_wave{wave}"));
            let mut scope = rng.enter(subseed);
            self.fill_wave(&mut scope, &mut graph, wave)?;
        }

        let layers: Vec<PathLayer> = bounds
            .iter()
            .enumerate()
            .map(|(index, &(start, end))| {
                let mut layer = PathLayer::new(index as u32, start, end);
                layer.nodes = graph
                    .wave_map()
                    .range(start..=end)
                    .flat_map(|(_, ids)| ids.iter().cloned())
                    .collect();
                debug!(
                    "Layer {} (waves {}..={}) holds {} nodes",
                    index,
                    start,
                    end,
                    layer.nodes.len()
                );
                layer
            })
            .collect();

        info!(
            "Built {} layers with {} nodes and {} challenge paths",
            layers.len(),
            graph.len(),
            challenge_paths.len()
        );
        Ok(LayerOutcome {
            graph,
            layers,
            challenge_paths,
        })
    }

    fn special_node(&self, specials: &SpecialWaveSet, category: SpecialCategory, wave: u32) -> PathNode {
        let factory = self.factory;
        match category {
            SpecialCategory::Rival => {
                let info = specials.rival_info.get(&wave).copied();
                let stage = info.map(|info| info.stage).unwrap_or(1);
                let rival_id = info.map(|info| info.rival_id).unwrap_or(0);
                let corrupted = info.map(|info| info.corrupted).unwrap_or(false);
                PathNode::new(wave, SPECIAL_LANE, PathNodeType::RivalBattle)
                    .with_metadata(NodeMetadata {
                        rival_stage: Some(stage),
                        rival_id: Some(rival_id),
                        corrupted,
                        ..NodeMetadata::default()
                    })
                    .with_battle(factory.make_rival_battle(stage, rival_id, corrupted))
            }
            SpecialCategory::MajorBoss => PathNode::new(wave, SPECIAL_LANE, PathNodeType::MajorBossBattle)
                .with_battle(factory.make_boss_battle(PathNodeType::MajorBossBattle, wave)),
            SpecialCategory::RecoveryBoss => PathNode::new(wave, SPECIAL_LANE, PathNodeType::RecoveryBoss)
                .with_battle(factory.make_boss_battle(PathNodeType::RecoveryBoss, wave)),
            SpecialCategory::EliteFour => {
                let slot = specials.elite_four_slots.get(&wave).copied().unwrap_or(1);
                PathNode::new(wave, SPECIAL_LANE, PathNodeType::EliteFour)
                    .with_metadata(NodeMetadata {
                        elite_four_slot: Some(slot),
                        ..NodeMetadata::default()
                    })
                    .with_battle(factory.make_elite_four_battle(slot, wave))
            }
            SpecialCategory::Champion => {
                let set_index = specials.champion_sets.get(&wave).copied().unwrap_or(0);
                PathNode::new(wave, SPECIAL_LANE, PathNodeType::Champion)
                    .with_battle(factory.make_champion_battle(set_index, wave))
            }
            SpecialCategory::Milestone => PathNode::new(wave, SPECIAL_LANE, PathNodeType::MilestoneBattle)
                .with_battle(factory.make_milestone_battle(wave)),
            SpecialCategory::EvilGrunt => self.evil_node(wave, EvilTeamRole::Grunt),
            SpecialCategory::EvilAdmin => self.evil_node(wave, EvilTeamRole::Admin),
            SpecialCategory::EvilBoss => self.evil_node(wave, EvilTeamRole::Boss),
        }
    }

    fn evil_node(&self, wave: u32, role: EvilTeamRole) -> PathNode {
        let node_type = match role {
            EvilTeamRole::Grunt => PathNodeType::EvilGruntBattle,
            EvilTeamRole::Admin => PathNodeType::EvilAdminBattle,
            EvilTeamRole::Boss => PathNodeType::EvilBossBattle,
        };
        PathNode::new(wave, SPECIAL_LANE, node_type)
            .with_metadata(NodeMetadata {
                evil_team_role: Some(role),
                ..NodeMetadata::default()
            })
            .with_battle(self.factory.make_evil_team_battle(role, wave))
    }

    fn place_challenges(
        &self,
        config: &GenerationConfig,
        rng: &mut SeedRng,
        registry: &mut SubseedRegistry,
        graph: &mut PathGraph,
        blocked: &BTreeSet<u32>,
    ) -> WavepathResult<Vec<ChallengePath>> {
        let placer = ChallengePlacer::new(self.factory);
        let bounds = (config.start_wave, config.total_waves);
        let mut placed = Vec::new();

        for (index, window) in challenge_windows(config.total_waves).into_iter().enumerate() {
            let subseed = registry.derive_subseed(&format!("_challenge{index}"));
            let plan = rng.with_seed(subseed, |scoped| plan_challenge(index, scoped));
            match placer.place(graph, &plan, window, blocked, bounds)? {
                Some(path) => {
                    debug!(
                        "Challenge {} ({:?}, {} battles) starts at wave {}",
                        path.chain_id, path.archetype, path.node_count, path.start_wave
                    );
                    placed.push(path);
                }
                None => debug!(
                    "No room for challenge {} of {} battles in waves {:?}",
                    index, plan.length, window
                ),
            }
        }
        Ok(placed)
    }

    fn fill_wave(&self, rng: &mut SeedRng, graph: &mut PathGraph, wave: u32) -> WavepathResult<()> {
        let free = graph.free_lanes(wave).len();
        let count = (rng.rand_weighted(&NODE_COUNT_WEIGHTS) + 1).min(free);
        let pattern = LANE_PATTERNS[wave as usize % LANE_PATTERNS.len()];
        let weights: Vec<u32> = FILLER_WEIGHTS.iter().map(|&(_, weight)| weight).collect();

        for &preferred in pattern.iter().take(count) {
            let lane = if graph.lane_taken(wave, preferred) {
                match graph.free_lanes(wave).first() {
                    Some(&lane) => lane,
                    None => break,
                }
            } else {
                preferred
            };

            let node_type = FILLER_WEIGHTS[rng.rand_weighted(&weights)].0;
            let mut node = PathNode::new(wave, lane, node_type);
            match node_type {
                PathNodeType::WildBattle | PathNodeType::TrainerBattle => {
                    if wave > DYNAMIC_MODE_START_WAVE && rng.rand_chance(DYNAMIC_MODE_CHANCE) {
                        if let Some(&mode) = rng.rand_item(&DynamicMode::STACKABLE) {
                            node = node.with_modes([mode]);
                        }
                    }
                    node = node.with_battle(self.factory.make_regular_battle(node_type, wave));
                }
                PathNodeType::RecoveryBoss => {
                    node = node.with_battle(self.factory.make_boss_battle(node_type, wave));
                }
                _ => {}
            }
            graph.insert(node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils;
    use crate::{SpecialWaveScheduler, StandardBattleFactory};

    fn build(seed: &str, total_waves: u32) -> (SpecialWaveSet, LayerOutcome) {
        let config = GenerationConfig::new(seed, total_waves);
        let mut rng = utils::create_rng(&config);
        let mut registry = SubseedRegistry::new(seed);
        let specials = SpecialWaveScheduler::new()
            .schedule(&config, &mut rng, &mut registry)
            .unwrap();
        let factory = StandardBattleFactory::new();
        let outcome = LayerBuilder::new(&factory)
            .build(&config, &mut rng, &mut registry, &specials)
            .unwrap();
        (specials, outcome)
    }

    #[test]
    fn test_filler_moves_clashing_nodes_to_lowest_free_lane() {
        let factory = StandardBattleFactory::new();
        let builder = LayerBuilder::new(&factory);
        // Wave 10 prefers lanes 0 and 1 first.
        assert_eq!(LANE_PATTERNS[10 % LANE_PATTERNS.len()][..2], [0, 1]);

        for seed in 0..20u64 {
            let mut graph = PathGraph::new();
            graph.insert(PathNode::new(10, 0, PathNodeType::Money)).unwrap();
            graph.insert(PathNode::new(10, 1, PathNodeType::Money)).unwrap();
            let free = graph.free_lanes(10);
            assert_eq!(free, vec![2, 3]);

            let mut rng = SeedRng::new(seed);
            builder.fill_wave(&mut rng, &mut graph, 10).unwrap();

            let filled: Vec<u8> = graph
                .nodes_at(10)
                .iter()
                .map(|node| node.lane)
                .filter(|lane| free.contains(lane))
                .collect();
            assert!(!filled.is_empty());
            assert_eq!(filled, free[..filled.len()]);
        }
    }

    #[test]
    fn test_every_wave_has_an_open_node() {
        let (_, outcome) = build("LAYERS", 300);
        for wave in 1..=300 {
            let nodes = outcome.graph.nodes_at(wave);
            assert!(!nodes.is_empty(), "wave {wave} is empty");
            assert!(nodes.len() <= 4);
            assert!(nodes.iter().any(|node| node.chain().is_none()));
        }
    }

    #[test]
    fn test_convergence_waves_hold_one_required_node() {
        let (_, outcome) = build("FUNNEL", 200);
        assert_eq!(outcome.layers.len(), 10);
        for layer in &outcome.layers {
            let nodes = outcome.graph.nodes_at(layer.convergence_wave);
            assert_eq!(nodes.len(), 1);
            assert!(nodes[0].is_required);
            assert_eq!(nodes[0].lane, SPECIAL_LANE);
        }
    }

    #[test]
    fn test_required_specials_stand_alone() {
        let (specials, outcome) = build("ALONE", 500);
        for wave in specials.rival.iter().chain(&specials.major_boss) {
            let nodes = outcome.graph.nodes_at(*wave);
            assert_eq!(nodes.len(), 1, "wave {wave}");
            assert!(nodes[0].is_required);
            assert!(nodes[0].battle_config.is_some());
        }
    }

    #[test]
    fn test_rival_nodes_carry_stage_metadata() {
        let (specials, outcome) = build("META", 500);
        for (wave, info) in &specials.rival_info {
            let node = outcome.graph.nodes_at(*wave)[0];
            assert_eq!(node.node_type, PathNodeType::RivalBattle);
            assert_eq!(node.metadata.rival_stage, Some(info.stage));
            assert_eq!(node.metadata.rival_id, Some(info.rival_id));
        }
    }

    #[test]
    fn test_challenges_avoid_single_node_waves() {
        let (_, outcome) = build("CHAINS", 500);
        assert!(!outcome.challenge_paths.is_empty());
        for path in &outcome.challenge_paths {
            for wave in path.start_wave..=path.start_wave + u32::from(path.node_count) {
                assert!(outcome.graph.nodes_at(wave).len() > 1, "wave {wave}");
            }
        }
    }

    #[test]
    fn test_reward_nodes_have_no_battle() {
        let (_, outcome) = build("REWARDS", 300);
        for node in outcome.graph.iter() {
            if node.node_type.is_reward() || node.is_challenge_reward() {
                assert!(node.battle_config.is_none());
            }
            if node.node_type.is_battle() {
                assert!(node.battle_config.is_some(), "{} has no battle", node.id);
            }
        }
    }

    #[test]
    fn test_layers_cover_their_nodes() {
        let (_, outcome) = build("COVER", 120);
        let owned: usize = outcome.layers.iter().map(|layer| layer.nodes.len()).sum();
        assert_eq!(owned, outcome.graph.len());
    }

    #[test]
    fn test_filler_weights_cover_rewards() {
        for reward in PathNodeType::REWARDS {
            assert!(FILLER_WEIGHTS.iter().any(|&(kind, _)| kind == reward));
        }
    }
}
