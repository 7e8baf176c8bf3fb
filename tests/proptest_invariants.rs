//! Property tests over random seeds and run lengths.

use proptest::prelude::*;
use std::collections::BTreeSet;
use wavepath::{generate, generate_with_config, GenerationConfig};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn generated_paths_have_no_diagnostics(seed in "[A-Z0-9]{1,10}", waves in 1u32..320) {
        let path = generate(&seed, waves).unwrap();
        prop_assert!(path.diagnostics().is_empty(), "{:?}", path.diagnostics());
        prop_assert_eq!(path.graph().max_wave(), Some(waves));
    }

    #[test]
    fn lanes_never_collide(seed in "[A-Z0-9]{1,10}", waves in 1u32..200) {
        let path = generate(&seed, waves).unwrap();
        for ids in path.wave_to_node_map().values() {
            let lanes: BTreeSet<u8> = ids
                .iter()
                .filter_map(|id| path.node(id))
                .map(|node| node.lane)
                .collect();
            prop_assert_eq!(lanes.len(), ids.len());
            prop_assert!(ids.len() <= 4);
        }
    }

    #[test]
    fn edges_are_symmetric(seed in "[A-Z0-9]{1,10}", waves in 2u32..200) {
        let path = generate(&seed, waves).unwrap();
        for node in path.node_map().values() {
            for next in &node.connections {
                let target = path.node(next).unwrap();
                prop_assert!(target.previous_connections.contains(&node.id));
            }
        }
    }

    #[test]
    fn generation_is_deterministic(seed in "[A-Za-z0-9]{1,12}", waves in 1u32..150) {
        let first = generate(&seed, waves).unwrap();
        let second = generate(&seed, waves).unwrap();
        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn late_starts_stay_connected(seed in "[A-Z]{1,8}", start in 1u32..60, extra in 0u32..120) {
        let config = GenerationConfig::new(seed, start + extra).with_start_wave(start);
        let path = generate_with_config(&config).unwrap();
        prop_assert!(path.diagnostics().is_empty(), "{:?}", path.diagnostics());
        prop_assert_eq!(path.graph().min_wave(), Some(start));
    }
}
