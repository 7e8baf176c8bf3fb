//! # Challenge Gauntlets
//!
//! Short linear chains of hard battles ending in a reward node. A gauntlet is
//! entered through its first battle; every later node can only be reached from the
//! node before it.

use crate::{
    BattleFactory, ChallengeArchetype, ChallengeLink, DynamicMode, NodeId, NodeMetadata,
    PathGraph, PathNode, PathNodeType, SeedRng, WavepathResult, CHALLENGE_LANE, SPECIAL_LANE,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// First wave a challenge window may start on.
pub const CHALLENGE_START_WAVE: u32 = 50;

/// Sizes of consecutive challenge windows, repeated until the end of the run.
pub const CHALLENGE_WINDOW_SIZES: [u32; 3] = [50, 75, 75];

/// Shortest and longest gauntlet, in battles.
pub const MIN_CHAIN_LENGTH: u8 = 3;
pub const MAX_CHAIN_LENGTH: u8 = 5;

/// Battle kinds a gauntlet draws from before its closing champion.
const CHAIN_BATTLES: [PathNodeType; 3] = [
    PathNodeType::ChallengeBoss,
    PathNodeType::ChallengeRival,
    PathNodeType::ChallengeEvilBoss,
];

/// Summary of a gauntlet embedded in a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengePath {
    pub chain_id: u32,
    pub start_wave: u32,
    /// Number of battles, 3 to 5
    pub node_count: u8,
    pub archetype: ChallengeArchetype,
    /// Modifiers stacked on top of the archetype flag
    pub extra_modifiers: Vec<DynamicMode>,
    /// Battle node ids in order
    pub nodes: Vec<NodeId>,
    pub reward_node: NodeId,
}

/// A gauntlet drawn but not yet placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengePlan {
    pub chain_id: u32,
    pub length: u8,
    pub archetype: ChallengeArchetype,
    pub extra_modifiers: Vec<DynamicMode>,
    /// Node kind of every battle; the last one is always a challenge champion
    pub battles: Vec<PathNodeType>,
}

impl ChallengePlan {
    /// Flags every battle of the gauntlet carries.
    pub fn modes(&self) -> BTreeSet<DynamicMode> {
        std::iter::once(self.archetype.flag())
            .chain(self.extra_modifiers.iter().copied())
            .collect()
    }
}

/// Inclusive windows challenges are placed in, from wave 50 to the final wave.
///
/// # Examples
///
/// ```
/// use wavepath::challenge_windows;
///
/// assert_eq!(challenge_windows(260), vec![(50, 99), (100, 174), (175, 249), (250, 260)]);
/// assert!(challenge_windows(40).is_empty());
/// ```
pub fn challenge_windows(total_waves: u32) -> Vec<(u32, u32)> {
    let mut windows = Vec::new();
    let mut start = CHALLENGE_START_WAVE;
    for size in CHALLENGE_WINDOW_SIZES.iter().cycle() {
        if start > total_waves {
            break;
        }
        let end = (start + size - 1).min(total_waves);
        windows.push((start, end));
        start = end + 1;
    }
    windows
}

/// Archetype for a gauntlet of `length` battles.
///
/// Three battles are always a nightmare; four lean towards nuzlocke; five are an
/// even split between nuzlocke and nuzlight.
pub fn archetype_for_length(length: u8, rng: &mut SeedRng) -> ChallengeArchetype {
    match length {
        0..=3 => ChallengeArchetype::Nightmare,
        4 => {
            if rng.rand_chance(80) {
                ChallengeArchetype::Nuzlocke
            } else {
                ChallengeArchetype::Nuzlight
            }
        }
        _ => {
            if rng.rand_chance(50) {
                ChallengeArchetype::Nuzlocke
            } else {
                ChallengeArchetype::Nuzlight
            }
        }
    }
}

/// Draws `1 + index / 2` distinct stackable modifiers, keeping at most one move
/// restriction.
pub fn choose_modifiers(index: usize, rng: &mut SeedRng) -> Vec<DynamicMode> {
    let count = (1 + index / 2).min(DynamicMode::STACKABLE.len());
    let mut pool = DynamicMode::STACKABLE.to_vec();
    rng.shuffle(&mut pool);
    let mut chosen: Vec<DynamicMode> = pool[..count].to_vec();
    resolve_move_restrictions(&mut chosen, rng);
    chosen
}

/// Reduces conflicting move restrictions to one kept at random, replacing the rest
/// with unused non-conflicting flags.
pub fn resolve_move_restrictions(modifiers: &mut Vec<DynamicMode>, rng: &mut SeedRng) {
    let restrictions: Vec<usize> = modifiers
        .iter()
        .enumerate()
        .filter(|(_, mode)| mode.is_move_restriction())
        .map(|(index, _)| index)
        .collect();
    if restrictions.len() <= 1 {
        return;
    }

    let keep = restrictions[rng.rand_int(restrictions.len() as u32) as usize];
    let mut replacements: Vec<DynamicMode> = DynamicMode::STACKABLE
        .iter()
        .copied()
        .filter(|mode| !mode.is_move_restriction() && !modifiers.contains(mode))
        .collect();
    rng.shuffle(&mut replacements);

    let mut resolved = Vec::with_capacity(modifiers.len());
    for (index, &mode) in modifiers.iter().enumerate() {
        if !mode.is_move_restriction() || index == keep {
            resolved.push(mode);
        } else if let Some(replacement) = replacements.pop() {
            resolved.push(replacement);
        }
    }
    *modifiers = resolved;
}

/// Draws the shape of gauntlet number `index`.
pub fn plan_challenge(index: usize, rng: &mut SeedRng) -> ChallengePlan {
    let length = rng.rand_range(u32::from(MIN_CHAIN_LENGTH), u32::from(MAX_CHAIN_LENGTH) + 1) as u8;
    let archetype = archetype_for_length(length, rng);
    let extra_modifiers = choose_modifiers(index, rng);

    let mut battles = Vec::with_capacity(usize::from(length));
    for _ in 1..length {
        let kind = rng
            .rand_item(&CHAIN_BATTLES)
            .copied()
            .unwrap_or(PathNodeType::ChallengeBoss);
        battles.push(kind);
    }
    battles.push(PathNodeType::ChallengeChampion);

    ChallengePlan {
        chain_id: index as u32,
        length,
        archetype,
        extra_modifiers,
        battles,
    }
}

/// Places planned gauntlets into a graph.
#[derive(Debug)]
pub struct ChallengePlacer<'a> {
    factory: &'a dyn BattleFactory,
}

impl<'a> ChallengePlacer<'a> {
    pub fn new(factory: &'a dyn BattleFactory) -> Self {
        Self { factory }
    }

    /// Whether a gauntlet of `length` battles can start on `start`.
    ///
    /// The first battle needs the special lane, later battles and the reward need
    /// the challenge lane, and no wave of the gauntlet may be in `blocked`.
    pub fn fits(
        graph: &PathGraph,
        start: u32,
        length: u8,
        blocked: &BTreeSet<u32>,
        (first_wave, last_wave): (u32, u32),
    ) -> bool {
        let reward_wave = start + u32::from(length);
        if start < first_wave || reward_wave > last_wave {
            return false;
        }
        (start..=reward_wave).all(|wave| {
            let lane = if wave == start { SPECIAL_LANE } else { CHALLENGE_LANE };
            !blocked.contains(&wave) && !graph.lane_taken(wave, lane)
        })
    }

    /// Places `plan` at the first offset of `window` where it fits.
    ///
    /// `bounds` is the inclusive wave range of the run. Returns `None` when no
    /// offset fits.
    pub fn place(
        &self,
        graph: &mut PathGraph,
        plan: &ChallengePlan,
        window: (u32, u32),
        blocked: &BTreeSet<u32>,
        bounds: (u32, u32),
    ) -> WavepathResult<Option<ChallengePath>> {
        let Some(start) = (window.0..=window.1)
            .find(|&start| Self::fits(graph, start, plan.length, blocked, bounds))
        else {
            return Ok(None);
        };

        let modes = plan.modes();
        let mut nodes = Vec::with_capacity(plan.battles.len());
        for (index, &kind) in plan.battles.iter().enumerate() {
            let wave = start + index as u32;
            let lane = if index == 0 { SPECIAL_LANE } else { CHALLENGE_LANE };
            let node = PathNode::new(wave, lane, kind)
                .with_metadata(self.link(plan, index as u8))
                .with_modes(modes.iter().copied())
                .with_battle(self.factory.make_challenge_battle(kind, wave, plan.archetype));
            nodes.push(graph.insert(node)?);
        }

        let reward_wave = start + u32::from(plan.length);
        let reward = PathNode::new(reward_wave, CHALLENGE_LANE, PathNodeType::ChallengeReward)
            .with_metadata(self.link(plan, plan.length));
        let reward_node = graph.insert(reward)?;

        for pair in nodes.windows(2) {
            graph.connect(&pair[0], &pair[1])?;
        }
        if let Some(last) = nodes.last() {
            graph.connect(last, &reward_node)?;
        }

        Ok(Some(ChallengePath {
            chain_id: plan.chain_id,
            start_wave: start,
            node_count: plan.length,
            archetype: plan.archetype,
            extra_modifiers: plan.extra_modifiers.clone(),
            nodes,
            reward_node,
        }))
    }

    fn link(&self, plan: &ChallengePlan, index: u8) -> NodeMetadata {
        NodeMetadata {
            challenge: Some(ChallengeLink {
                chain_id: plan.chain_id,
                index,
                length: plan.length,
                archetype: plan.archetype,
            }),
            ..NodeMetadata::default()
        }
    }
}
