//! Integration tests for the structural properties of generated battle paths.

use std::collections::BTreeSet;
use wavepath::{
    generate, major_boss_separation, rival_stage_window, BattlePath, PathNodeType, WavepathError,
    WavepathResult,
};

fn assert_structurally_sound(path: &BattlePath) {
    let min_wave = path.start_wave();
    for (wave, ids) in path.wave_to_node_map() {
        let lanes: BTreeSet<u8> = ids
            .iter()
            .filter_map(|id| path.node(id))
            .map(|node| node.lane)
            .collect();
        assert_eq!(lanes.len(), ids.len(), "duplicate lane on wave {wave}");
    }

    for node in path.node_map().values() {
        for next in &node.connections {
            let target = path.node(next).expect("edge target exists");
            assert!(target.previous_connections.contains(&node.id));
            assert_eq!(target.wave, node.wave + 1, "{} -> {}", node.id, next);
        }
        for previous in &node.previous_connections {
            let source = path.node(previous).expect("edge source exists");
            assert!(source.connections.contains(&node.id));
        }
        if node.wave > min_wave {
            assert!(
                !node.previous_connections.is_empty(),
                "{} has no inbound edge",
                node.id
            );
        }
        if node.wave < path.total_waves() {
            assert!(!node.connections.is_empty(), "{} is a dead end", node.id);
        }
    }
}

#[test]
fn test_standard_run_is_sound() -> WavepathResult<()> {
    let path = generate("ABC123", 500)?;
    assert_structurally_sound(&path);
    assert!(path.diagnostics().is_empty(), "{:?}", path.diagnostics());
    assert_eq!(path.graph().min_wave(), Some(1));
    assert_eq!(path.graph().max_wave(), Some(500));
    Ok(())
}

#[test]
fn test_extended_run_is_sound() -> WavepathResult<()> {
    let path = generate("EXTENDED", 1000)?;
    assert_structurally_sound(&path);
    assert!(path.diagnostics().is_empty(), "{:?}", path.diagnostics());
    Ok(())
}

#[test]
fn test_same_seed_same_path() -> WavepathResult<()> {
    let first = generate("ABC123", 500)?;
    let second = generate("ABC123", 500)?;
    assert_eq!(first.to_json()?, second.to_json()?);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_different_seeds_differ() -> WavepathResult<()> {
    let first = generate("ABC123", 500)?;
    let second = generate("XYZ999", 500)?;
    assert_ne!(
        first.special_waves().all_waves(),
        second.special_waves().all_waves()
    );
    Ok(())
}

#[test]
fn test_zero_waves_is_a_configuration_error() {
    assert!(matches!(
        generate("ABC123", 0),
        Err(WavepathError::Configuration(_))
    ));
}

#[test]
fn test_rivals_respect_stage_windows() -> WavepathResult<()> {
    let path = generate("TEST1", 500)?;
    let specials = path.special_waves();
    assert_eq!(specials.rival.len(), 5);

    let mut stages = Vec::new();
    for &wave in &specials.rival {
        let node = path.nodes_at_wave(wave)[0];
        assert_eq!(node.node_type, PathNodeType::RivalBattle);
        assert!(node.is_required);

        let stage = node.metadata.rival_stage.expect("rival stage is recorded");
        let (start, end) = rival_stage_window(1, 500, stage);
        assert!((start..=end).contains(&wave), "stage {stage} on wave {wave}");
        stages.push(stage);
    }
    assert_eq!(stages, vec![2, 3, 4, 5, 6]);
    Ok(())
}

#[test]
fn test_major_bosses_are_spread_out() -> WavepathResult<()> {
    let separation = major_boss_separation(500);
    assert_eq!(separation, 65);

    for seed in ["ABC123", "XYZ999", "BOSSES"] {
        let path = generate(seed, 1000)?;
        for segment in [1..=500, 501..=1000] {
            let bosses: Vec<u32> = path
                .special_waves()
                .major_boss
                .iter()
                .copied()
                .filter(|wave| segment.contains(wave))
                .collect();
            for pair in bosses.windows(2) {
                assert!(pair[1] - pair[0] >= separation, "{seed}: {pair:?}");
            }
            for wave in &bosses {
                let nodes = path.nodes_at_wave(*wave);
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].node_type, PathNodeType::MajorBossBattle);
            }
        }
    }
    Ok(())
}

#[test]
fn test_rewards_are_fed_by_their_chain() -> WavepathResult<()> {
    let path = generate("REWARD", 500)?;
    assert!(!path.challenge_paths().is_empty());

    for challenge in path.challenge_paths() {
        let reward = path.node(&challenge.reward_node).expect("reward exists");
        assert_eq!(reward.node_type, PathNodeType::ChallengeReward);
        assert_eq!(
            reward.previous_connections,
            vec![challenge.nodes[challenge.nodes.len() - 1].clone()]
        );

        for (index, id) in challenge.nodes.iter().enumerate() {
            let node = path.node(id).expect("chain node exists");
            assert!(node.node_type.is_challenge_battle());
            assert!(node.dynamic_mode.contains(&challenge.archetype.flag()));
            assert_eq!(node.connections.len(), 1);
            if index > 0 {
                assert_eq!(node.previous_connections, vec![challenge.nodes[index - 1].clone()]);
            }
        }
        let last = path.node(&challenge.nodes[challenge.nodes.len() - 1]);
        assert_eq!(
            last.map(|node| node.node_type),
            Some(PathNodeType::ChallengeChampion)
        );
    }
    Ok(())
}

#[test]
fn test_extended_run_ends_on_a_milestone() -> WavepathResult<()> {
    let path = generate("MILESTONE", 1000)?;
    let last = path.nodes_at_wave(1000);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].node_type, PathNodeType::MilestoneBattle);
    assert!(last[0].is_required);
    assert_eq!(path.special_waves().rival.len(), 10);

    let corrupted = path
        .special_waves()
        .rival_info
        .iter()
        .filter(|(_, info)| info.corrupted)
        .count();
    assert_eq!(corrupted, 5);
    Ok(())
}

#[test]
fn test_long_runs_keep_ten_distinct_rivals() -> WavepathResult<()> {
    let path = generate("TEST1", 1500)?;
    let specials = path.special_waves();
    assert_eq!(specials.rival.len(), 10);

    let mut ids = BTreeSet::new();
    for (&wave, info) in &specials.rival_info {
        let node = path.nodes_at_wave(wave)[0];
        assert_eq!(node.node_type, PathNodeType::RivalBattle);
        assert_eq!(node.metadata.rival_id, Some(info.rival_id));
        assert_eq!(info.corrupted, wave > 500);
        ids.insert(info.rival_id);
    }
    assert_eq!(ids.len(), 10);
    Ok(())
}

#[test]
fn test_convergence_waves_funnel_every_route() -> WavepathResult<()> {
    let path = generate("FUNNEL", 240)?;
    assert_eq!(path.layers().len(), 12);
    for layer in path.layers() {
        let nodes = path.nodes_at_wave(layer.convergence_wave);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_required);
        assert!(layer.nodes.contains(&nodes[0].id));
    }
    Ok(())
}

#[test]
fn test_node_ids_encode_position() -> WavepathResult<()> {
    let path = generate("IDS", 80)?;
    for (id, node) in path.node_map() {
        let expected = format!("w{}_l{}_", node.wave, node.lane);
        assert!(id.as_str().starts_with(&expected), "{id}");
    }
    Ok(())
}
