//! Round trips of generated paths through JSON and the file system.

use tempfile::tempdir;
use wavepath::{generate, BattlePath, GenerationContext, WavepathError, WavepathResult};

#[test]
fn test_json_round_trip() -> WavepathResult<()> {
    let path = generate("PERSIST", 200)?;
    let restored = BattlePath::from_json(&path.to_json()?)?;
    assert_eq!(restored, path);
    assert_eq!(restored.wave_to_node_map(), path.wave_to_node_map());
    Ok(())
}

#[test]
fn test_file_round_trip() -> WavepathResult<()> {
    let dir = tempdir()?;
    let file = dir.path().join("path.json");

    let path = generate("ON_DISK", 300)?;
    path.save_to_file(&file)?;
    let restored = BattlePath::load_from_file(&file)?;
    assert_eq!(restored, path);

    let mut context = GenerationContext::new(restored);
    assert!(!context.available_paths_from(1).is_empty());
    let first = context.available_paths_from(1)[0].id.clone();
    assert!(context.select_path(&first));
    Ok(())
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let result = BattlePath::load_from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(WavepathError::Io(_))));
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(matches!(
        BattlePath::from_json("{\"seed\": 4}"),
        Err(WavepathError::Serde(_))
    ));
}

#[test]
fn test_asymmetric_edges_are_rejected_on_load() -> WavepathResult<()> {
    let path = generate("TAMPER", 60)?;
    let json = path.to_json()?;

    let mut value: serde_json::Value = serde_json::from_str(&json)?;
    let nodes = value["graph"]["nodes"]
        .as_object_mut()
        .expect("nodes serialize as a map");
    let (_, node) = nodes
        .iter_mut()
        .find(|(_, node)| {
            node["previous_connections"]
                .as_array()
                .map(|edges| !edges.is_empty())
                .unwrap_or(false)
        })
        .expect("some node has a predecessor");
    node["previous_connections"] = serde_json::Value::Array(Vec::new());

    let tampered = serde_json::to_string(&value)?;
    assert!(matches!(
        BattlePath::from_json(&tampered),
        Err(WavepathError::InvalidState(_))
    ));
    Ok(())
}
