//! # Battle Descriptors
//!
//! Opaque encounter descriptions attached to battle nodes, and the factory seam
//! through which the host game supplies them.
//!
//! The generator never looks inside a descriptor; it only decides which kind of
//! encounter a node holds and asks the [`BattleFactory`] for the matching value.

use crate::{ChallengeArchetype, EvilTeamRole, PathNodeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Broad category of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleKind {
    Wild,
    Trainer,
}

/// Opaque encounter description consumed by the battle launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleDescriptor {
    pub kind: BattleKind,
    /// Trainer pool or roster key understood by the host game
    pub roster: String,
    /// Offset the host applies to its own seed when building the roster
    pub seed_offset: u32,
    pub double_battle: bool,
    /// Free-form annotations for the host
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl BattleDescriptor {
    /// Creates a descriptor with no tags.
    pub fn new(kind: BattleKind, roster: impl Into<String>, seed_offset: u32) -> Self {
        Self {
            kind,
            roster: roster.into(),
            seed_offset,
            double_battle: false,
            tags: BTreeMap::new(),
        }
    }

    /// Adds an annotation.
    pub fn with_tag(mut self, key: &str, value: impl ToString) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }
}

/// Supplies battle descriptors for the nodes the generator creates.
///
/// Implementations must be deterministic: the same arguments always produce the
/// same descriptor, otherwise runs stop being reproducible from their seed.
pub trait BattleFactory: Debug {
    /// Rival encounter at the given rival stage.
    fn make_rival_battle(&self, stage: u8, rival_id: u32, corrupted: bool) -> BattleDescriptor;

    /// Elite-four member for slot 1 to 4.
    fn make_elite_four_battle(&self, slot: u8, wave: u32) -> BattleDescriptor;

    /// Champion closing the elite-four set.
    fn make_champion_battle(&self, set_index: u8, wave: u32) -> BattleDescriptor;

    /// Evil-team grunt, admin or boss.
    fn make_evil_team_battle(&self, role: EvilTeamRole, wave: u32) -> BattleDescriptor;

    /// Milestone encounter at a segment boundary.
    fn make_milestone_battle(&self, wave: u32) -> BattleDescriptor;

    /// Major or recovery boss.
    fn make_boss_battle(&self, node_type: PathNodeType, wave: u32) -> BattleDescriptor;

    /// Filler wild or trainer battle.
    fn make_regular_battle(&self, node_type: PathNodeType, wave: u32) -> BattleDescriptor;

    /// One battle of a challenge gauntlet.
    fn make_challenge_battle(
        &self,
        node_type: PathNodeType,
        wave: u32,
        archetype: ChallengeArchetype,
    ) -> BattleDescriptor;
}

/// Default factory producing roster keys for the stock trainer pools.
#[derive(Debug, Clone, Default)]
pub struct StandardBattleFactory;

impl StandardBattleFactory {
    /// Creates the default factory.
    pub fn new() -> Self {
        Self
    }
}

impl BattleFactory for StandardBattleFactory {
    fn make_rival_battle(&self, stage: u8, rival_id: u32, corrupted: bool) -> BattleDescriptor {
        BattleDescriptor::new(BattleKind::Trainer, "dynamic_rival", u32::from(stage) << 8)
            .with_tag("stage", stage)
            .with_tag("rival_id", rival_id)
            .with_tag("corrupted", corrupted)
    }

    fn make_elite_four_battle(&self, slot: u8, wave: u32) -> BattleDescriptor {
        BattleDescriptor::new(BattleKind::Trainer, format!("elite_four_{slot}"), wave << 8)
            .with_tag("slot", slot)
    }

    fn make_champion_battle(&self, set_index: u8, wave: u32) -> BattleDescriptor {
        BattleDescriptor::new(BattleKind::Trainer, "champion", wave << 8)
            .with_tag("set", set_index)
    }

    fn make_evil_team_battle(&self, role: EvilTeamRole, wave: u32) -> BattleDescriptor {
        let roster = match role {
            EvilTeamRole::Grunt => "evil_team_grunts",
            EvilTeamRole::Admin => "evil_team_admins",
            EvilTeamRole::Boss => "evil_team_bosses",
        };
        BattleDescriptor::new(BattleKind::Trainer, roster, 35 + wave)
    }

    fn make_milestone_battle(&self, wave: u32) -> BattleDescriptor {
        BattleDescriptor::new(BattleKind::Trainer, "milestone", wave << 8)
            .with_tag("boss", true)
    }

    fn make_boss_battle(&self, node_type: PathNodeType, wave: u32) -> BattleDescriptor {
        BattleDescriptor::new(BattleKind::Wild, node_type.slug(), wave << 3).with_tag("boss", true)
    }

    fn make_regular_battle(&self, node_type: PathNodeType, wave: u32) -> BattleDescriptor {
        let kind = if node_type == PathNodeType::TrainerBattle {
            BattleKind::Trainer
        } else {
            BattleKind::Wild
        };
        BattleDescriptor::new(kind, node_type.slug(), wave << 3)
    }

    fn make_challenge_battle(
        &self,
        node_type: PathNodeType,
        wave: u32,
        archetype: ChallengeArchetype,
    ) -> BattleDescriptor {
        BattleDescriptor::new(BattleKind::Trainer, node_type.slug(), wave << 8)
            .with_tag("archetype", archetype.flag().key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_factory_is_deterministic() {
        let factory = StandardBattleFactory::new();
        assert_eq!(
            factory.make_rival_battle(3, 2, true),
            factory.make_rival_battle(3, 2, true)
        );
        assert_ne!(
            factory.make_rival_battle(3, 2, true),
            factory.make_rival_battle(3, 2, false)
        );
    }

    #[test]
    fn test_double_battles_stay_disabled() {
        let factory = StandardBattleFactory::new();
        let battles = [
            factory.make_regular_battle(PathNodeType::TrainerBattle, 40),
            factory.make_elite_four_battle(1, 200),
            factory.make_champion_battle(0, 205),
            factory.make_evil_team_battle(EvilTeamRole::Admin, 70),
            factory.make_milestone_battle(1000),
        ];
        assert!(battles.iter().all(|battle| !battle.double_battle));
    }

    #[test]
    fn test_regular_battle_kind_follows_node_type() {
        let factory = StandardBattleFactory::new();
        assert_eq!(
            factory.make_regular_battle(PathNodeType::WildBattle, 3).kind,
            BattleKind::Wild
        );
        assert_eq!(
            factory.make_regular_battle(PathNodeType::TrainerBattle, 3).kind,
            BattleKind::Trainer
        );
    }
}
