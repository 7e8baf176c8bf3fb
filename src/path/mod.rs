//! # Path Module
//!
//! Data model for generated battle paths.
//!
//! A battle path is a layered directed graph: every wave of a run holds up to four
//! nodes ("lanes") and edges only ever lead from one wave to the next. Nodes live in
//! a single arena keyed by [`NodeId`]; edges are stored as id references on both
//! endpoints, so the graph has no ownership cycles.

pub mod context;
pub mod graph;

pub use context::*;
pub use graph::*;

use crate::BattleDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Number of parallel lanes available at every wave.
pub const LANE_COUNT: u8 = 4;

/// Lane that special and convergence nodes are pinned to.
pub const SPECIAL_LANE: u8 = 2;

/// Lane used by challenge nodes after the first one, and by the challenge reward.
pub const CHALLENGE_LANE: u8 = 3;

/// Unique identifier of a node, derived from its wave, lane and type.
///
/// # Examples
///
/// ```
/// use wavepath::{NodeId, PathNodeType};
///
/// let id = NodeId::new(12, 3, PathNodeType::TrainerBattle);
/// assert_eq!(id.as_str(), "w12_l3_trainer_battle");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Builds the id of the node at `(wave, lane)` with the given type.
    pub fn new(wave: u32, lane: u8, node_type: PathNodeType) -> Self {
        Self(format!("w{}_l{}_{}", wave, lane, node_type.slug()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every kind of node a path can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathNodeType {
    WildBattle,
    TrainerBattle,
    RivalBattle,
    MajorBossBattle,
    RecoveryBoss,
    EvilGruntBattle,
    EvilAdminBattle,
    EvilBossBattle,
    EliteFour,
    Champion,
    MilestoneBattle,
    ConvergencePoint,
    ItemGeneral,
    ItemBerry,
    ItemTm,
    AnyTms,
    Money,
    PermaMoney,
    Mints,
    AbilitySwitchers,
    StatSwitchers,
    TypeSwitcher,
    PassiveAbility,
    ExpShare,
    PpMax,
    DnaSplicers,
    GoldenPokeball,
    RogueBallItems,
    MasterBallItems,
    EggVoucher,
    AddPokemon,
    ReleaseItems,
    GlitchPiece,
    PermaItems,
    RandPermaItem,
    CollectedType,
    MysteryNode,
    ChallengeBoss,
    ChallengeRival,
    ChallengeEvilBoss,
    ChallengeChampion,
    ChallengeReward,
}

impl PathNodeType {
    /// Reward and item node kinds that never carry a battle.
    pub const REWARDS: [PathNodeType; 25] = [
        PathNodeType::ItemGeneral,
        PathNodeType::ItemBerry,
        PathNodeType::ItemTm,
        PathNodeType::AnyTms,
        PathNodeType::Money,
        PathNodeType::PermaMoney,
        PathNodeType::Mints,
        PathNodeType::AbilitySwitchers,
        PathNodeType::StatSwitchers,
        PathNodeType::TypeSwitcher,
        PathNodeType::PassiveAbility,
        PathNodeType::ExpShare,
        PathNodeType::PpMax,
        PathNodeType::DnaSplicers,
        PathNodeType::GoldenPokeball,
        PathNodeType::RogueBallItems,
        PathNodeType::MasterBallItems,
        PathNodeType::EggVoucher,
        PathNodeType::AddPokemon,
        PathNodeType::ReleaseItems,
        PathNodeType::GlitchPiece,
        PathNodeType::PermaItems,
        PathNodeType::RandPermaItem,
        PathNodeType::CollectedType,
        PathNodeType::MysteryNode,
    ];

    /// Snake-case name used in node ids.
    pub fn slug(self) -> &'static str {
        match self {
            PathNodeType::WildBattle => "wild_battle",
            PathNodeType::TrainerBattle => "trainer_battle",
            PathNodeType::RivalBattle => "rival_battle",
            PathNodeType::MajorBossBattle => "major_boss",
            PathNodeType::RecoveryBoss => "recovery_boss",
            PathNodeType::EvilGruntBattle => "evil_grunt",
            PathNodeType::EvilAdminBattle => "evil_admin",
            PathNodeType::EvilBossBattle => "evil_boss",
            PathNodeType::EliteFour => "elite_four",
            PathNodeType::Champion => "champion",
            PathNodeType::MilestoneBattle => "milestone",
            PathNodeType::ConvergencePoint => "convergence",
            PathNodeType::ItemGeneral => "item_general",
            PathNodeType::ItemBerry => "item_berry",
            PathNodeType::ItemTm => "item_tm",
            PathNodeType::AnyTms => "any_tms",
            PathNodeType::Money => "money",
            PathNodeType::PermaMoney => "perma_money",
            PathNodeType::Mints => "mints",
            PathNodeType::AbilitySwitchers => "ability_switchers",
            PathNodeType::StatSwitchers => "stat_switchers",
            PathNodeType::TypeSwitcher => "type_switcher",
            PathNodeType::PassiveAbility => "passive_ability",
            PathNodeType::ExpShare => "exp_share",
            PathNodeType::PpMax => "pp_max",
            PathNodeType::DnaSplicers => "dna_splicers",
            PathNodeType::GoldenPokeball => "golden_pokeball",
            PathNodeType::RogueBallItems => "rogue_ball_items",
            PathNodeType::MasterBallItems => "master_ball_items",
            PathNodeType::EggVoucher => "egg_voucher",
            PathNodeType::AddPokemon => "add_pokemon",
            PathNodeType::ReleaseItems => "release_items",
            PathNodeType::GlitchPiece => "glitch_piece",
            PathNodeType::PermaItems => "perma_items",
            PathNodeType::RandPermaItem => "rand_perma_item",
            PathNodeType::CollectedType => "collected_type",
            PathNodeType::MysteryNode => "mystery",
            PathNodeType::ChallengeBoss => "challenge_boss",
            PathNodeType::ChallengeRival => "challenge_rival",
            PathNodeType::ChallengeEvilBoss => "challenge_evil_boss",
            PathNodeType::ChallengeChampion => "challenge_champion",
            PathNodeType::ChallengeReward => "challenge_reward",
        }
    }

    /// Whether entering this node starts a battle.
    pub fn is_battle(self) -> bool {
        !self.is_reward()
            && !matches!(
                self,
                PathNodeType::ConvergencePoint | PathNodeType::ChallengeReward
            )
    }

    /// Whether this is a pure reward or item node.
    pub fn is_reward(self) -> bool {
        Self::REWARDS.contains(&self)
    }

    /// Whether this is one of the four challenge battle kinds.
    pub fn is_challenge_battle(self) -> bool {
        matches!(
            self,
            PathNodeType::ChallengeBoss
                | PathNodeType::ChallengeRival
                | PathNodeType::ChallengeEvilBoss
                | PathNodeType::ChallengeChampion
        )
    }

    /// Whether this node belongs to a challenge gauntlet (battles or reward).
    pub fn is_challenge(self) -> bool {
        self.is_challenge_battle() || self == PathNodeType::ChallengeReward
    }
}

/// Named difficulty modifiers that can be attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DynamicMode {
    IsNuzlocke,
    IsNuzlight,
    IsNightmare,
    NoExpGain,
    NoCatch,
    HasPassiveAbility,
    InvertedTypes,
    BoostedTrainer,
    MultiLegendaries,
    MultiBoss,
    NoInitialSwitch,
    AutoPressured,
    NoStatBoosts,
    NoStatusMoves,
    NoPhysicalMoves,
    NoSpecialMoves,
    StatSwap,
    NoStab,
    TrickRoom,
    NoSwitch,
    NoResistances,
    NoHealingItems,
    AutoTorment,
    LegendaryNerf,
    TypeExtraDamage,
    PokemonNerf,
}

impl DynamicMode {
    /// Modifiers that may be stacked on top of a challenge archetype.
    pub const STACKABLE: [DynamicMode; 23] = [
        DynamicMode::NoExpGain,
        DynamicMode::NoCatch,
        DynamicMode::HasPassiveAbility,
        DynamicMode::InvertedTypes,
        DynamicMode::BoostedTrainer,
        DynamicMode::MultiLegendaries,
        DynamicMode::MultiBoss,
        DynamicMode::NoInitialSwitch,
        DynamicMode::AutoPressured,
        DynamicMode::NoStatBoosts,
        DynamicMode::NoStatusMoves,
        DynamicMode::NoPhysicalMoves,
        DynamicMode::NoSpecialMoves,
        DynamicMode::StatSwap,
        DynamicMode::NoStab,
        DynamicMode::TrickRoom,
        DynamicMode::NoSwitch,
        DynamicMode::NoResistances,
        DynamicMode::NoHealingItems,
        DynamicMode::AutoTorment,
        DynamicMode::LegendaryNerf,
        DynamicMode::TypeExtraDamage,
        DynamicMode::PokemonNerf,
    ];

    /// Move restrictions that cannot be active together.
    pub const MOVE_RESTRICTIONS: [DynamicMode; 3] = [
        DynamicMode::NoStatusMoves,
        DynamicMode::NoPhysicalMoves,
        DynamicMode::NoSpecialMoves,
    ];

    /// Whether this flag is one of the mutually exclusive move restrictions.
    pub fn is_move_restriction(self) -> bool {
        Self::MOVE_RESTRICTIONS.contains(&self)
    }

    /// Camel-case key used by presentation layers.
    pub fn key(self) -> &'static str {
        match self {
            DynamicMode::IsNuzlocke => "isNuzlocke",
            DynamicMode::IsNuzlight => "isNuzlight",
            DynamicMode::IsNightmare => "isNightmare",
            DynamicMode::NoExpGain => "noExpGain",
            DynamicMode::NoCatch => "noCatch",
            DynamicMode::HasPassiveAbility => "hasPassiveAbility",
            DynamicMode::InvertedTypes => "invertedTypes",
            DynamicMode::BoostedTrainer => "boostedTrainer",
            DynamicMode::MultiLegendaries => "multiLegendaries",
            DynamicMode::MultiBoss => "multiBoss",
            DynamicMode::NoInitialSwitch => "noInitialSwitch",
            DynamicMode::AutoPressured => "autoPressured",
            DynamicMode::NoStatBoosts => "noStatBoosts",
            DynamicMode::NoStatusMoves => "noStatusMoves",
            DynamicMode::NoPhysicalMoves => "noPhysicalMoves",
            DynamicMode::NoSpecialMoves => "noSpecialMoves",
            DynamicMode::StatSwap => "statSwap",
            DynamicMode::NoStab => "noSTAB",
            DynamicMode::TrickRoom => "trickRoom",
            DynamicMode::NoSwitch => "noSwitch",
            DynamicMode::NoResistances => "noResistances",
            DynamicMode::NoHealingItems => "noHealingItems",
            DynamicMode::AutoTorment => "autoTorment",
            DynamicMode::LegendaryNerf => "legendaryNerf",
            DynamicMode::TypeExtraDamage => "typeExtraDamage",
            DynamicMode::PokemonNerf => "pokemonNerf",
        }
    }
}

/// Difficulty flavour of a challenge gauntlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChallengeArchetype {
    Nightmare,
    Nuzlocke,
    Nuzlight,
}

impl ChallengeArchetype {
    /// The dynamic mode flag every node of the gauntlet carries.
    pub fn flag(self) -> DynamicMode {
        match self {
            ChallengeArchetype::Nightmare => DynamicMode::IsNightmare,
            ChallengeArchetype::Nuzlocke => DynamicMode::IsNuzlocke,
            ChallengeArchetype::Nuzlight => DynamicMode::IsNuzlight,
        }
    }
}

/// Role of an evil-team battle within its arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EvilTeamRole {
    Grunt,
    Admin,
    Boss,
}

/// Position of a node inside a challenge gauntlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeLink {
    /// Identifier of the gauntlet, unique within a path
    pub chain_id: u32,
    /// Zero-based position; the reward sits at `index == length`
    pub index: u8,
    /// Number of battle nodes in the gauntlet
    pub length: u8,
    /// Difficulty flavour shared by every node of the gauntlet
    pub archetype: ChallengeArchetype,
}

/// Variant-specific annotations on a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rival_stage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rival_id: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub corrupted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elite_four_slot: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evil_team_role: Option<EvilTeamRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<ChallengeLink>,
}

/// One encounter opportunity in the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub id: NodeId,
    pub wave: u32,
    pub lane: u8,
    pub node_type: PathNodeType,
    /// Outgoing edges, towards `wave + 1`
    pub connections: Vec<NodeId>,
    /// Incoming edges, from `wave - 1`
    pub previous_connections: Vec<NodeId>,
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dynamic_mode: BTreeSet<DynamicMode>,
    #[serde(default)]
    pub metadata: NodeMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battle_config: Option<BattleDescriptor>,
}

impl PathNode {
    /// Creates an unconnected node.
    pub fn new(wave: u32, lane: u8, node_type: PathNodeType) -> Self {
        Self {
            id: NodeId::new(wave, lane, node_type),
            wave,
            lane,
            node_type,
            connections: Vec::new(),
            previous_connections: Vec::new(),
            is_required: false,
            dynamic_mode: BTreeSet::new(),
            metadata: NodeMetadata::default(),
            battle_config: None,
        }
    }

    /// Marks the node as required.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Replaces the node's metadata.
    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches a battle descriptor.
    pub fn with_battle(mut self, battle: BattleDescriptor) -> Self {
        self.battle_config = Some(battle);
        self
    }

    /// Adds dynamic mode flags.
    pub fn with_modes(mut self, modes: impl IntoIterator<Item = DynamicMode>) -> Self {
        self.dynamic_mode.extend(modes);
        self
    }

    /// The gauntlet this node belongs to, if any.
    pub fn chain(&self) -> Option<ChallengeLink> {
        self.metadata.challenge
    }

    /// Whether this node is a challenge reward.
    pub fn is_challenge_reward(&self) -> bool {
        self.node_type == PathNodeType::ChallengeReward
    }

    /// Whether edges into this node are restricted to its own gauntlet.
    ///
    /// True for challenge battles after the first one and for rewards.
    pub fn is_chain_locked(&self) -> bool {
        self.is_challenge_reward()
            || (self.node_type.is_challenge_battle()
                && self.chain().map(|link| link.index > 0).unwrap_or(false))
    }

    /// Whether the connector may route edges out of this node.
    ///
    /// Challenge battles only ever lead to the next node of their gauntlet.
    pub fn is_open_source(&self) -> bool {
        !self.node_type.is_challenge_battle()
    }

    /// Whether the connector may route edges into this node.
    pub fn is_open_target(&self) -> bool {
        !self.is_chain_locked()
    }

    /// Whether an edge `source -> self` respects the gauntlet rules.
    pub fn accepts_inbound_from(&self, source: &PathNode) -> bool {
        if self.is_chain_locked() {
            return match (self.chain(), source.chain()) {
                (Some(own), Some(theirs)) => {
                    source.node_type.is_challenge_battle()
                        && own.chain_id == theirs.chain_id
                        && theirs.index + 1 == own.index
                }
                _ => false,
            };
        }
        source.is_open_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_node(wave: u32, lane: u8, node_type: PathNodeType, chain_id: u32, index: u8) -> PathNode {
        PathNode::new(wave, lane, node_type).with_metadata(NodeMetadata {
            challenge: Some(ChallengeLink {
                chain_id,
                index,
                length: 3,
                archetype: ChallengeArchetype::Nightmare,
            }),
            ..NodeMetadata::default()
        })
    }

    #[test]
    fn test_node_id_is_derived_from_position_and_type() {
        let node = PathNode::new(40, 2, PathNodeType::RivalBattle);
        assert_eq!(node.id.as_str(), "w40_l2_rival_battle");
        assert_eq!(node.id.to_string(), "w40_l2_rival_battle");
    }

    #[test]
    fn test_reward_table_has_twenty_five_kinds() {
        let unique: BTreeSet<_> = PathNodeType::REWARDS.iter().collect();
        assert_eq!(unique.len(), 25);
        assert!(PathNodeType::REWARDS.iter().all(|kind| !kind.is_battle()));
    }

    #[test]
    fn test_node_type_classification() {
        assert!(PathNodeType::WildBattle.is_battle());
        assert!(PathNodeType::ChallengeBoss.is_challenge_battle());
        assert!(PathNodeType::ChallengeReward.is_challenge());
        assert!(!PathNodeType::ChallengeReward.is_battle());
        assert!(!PathNodeType::ConvergencePoint.is_battle());
        assert!(PathNodeType::Money.is_reward());
    }

    #[test]
    fn test_stackable_modes_exclude_archetypes() {
        for archetype in [
            ChallengeArchetype::Nightmare,
            ChallengeArchetype::Nuzlocke,
            ChallengeArchetype::Nuzlight,
        ] {
            assert!(!DynamicMode::STACKABLE.contains(&archetype.flag()));
        }
        assert!(DynamicMode::MOVE_RESTRICTIONS
            .iter()
            .all(|mode| DynamicMode::STACKABLE.contains(mode)));
    }

    #[test]
    fn test_chain_rules() {
        let first = chain_node(10, 2, PathNodeType::ChallengeBoss, 0, 0);
        let second = chain_node(11, 3, PathNodeType::ChallengeRival, 0, 1);
        let reward = chain_node(13, 3, PathNodeType::ChallengeReward, 0, 3);
        let last = chain_node(12, 3, PathNodeType::ChallengeChampion, 0, 2);
        let other_chain = chain_node(12, 3, PathNodeType::ChallengeChampion, 1, 2);
        let filler = PathNode::new(9, 0, PathNodeType::WildBattle);

        assert!(first.is_open_target());
        assert!(!first.is_open_source());
        assert!(first.accepts_inbound_from(&filler));
        assert!(second.accepts_inbound_from(&first));
        assert!(!second.accepts_inbound_from(&filler));
        assert!(reward.accepts_inbound_from(&last));
        assert!(!reward.accepts_inbound_from(&other_chain));
        assert!(reward.is_open_source());
        assert!(!filler.accepts_inbound_from(&second));
    }
}
