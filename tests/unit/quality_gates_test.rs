//! Unit tests for the quality gate engine: scoring, mutation rules and persistence.

use credvault::services::quality_gates::{builtin_gates, QualityGateEngine};
use credvault::types::errors::GateError;
use credvault::types::gate::QualityGate;
use rstest::rstest;

#[rstest]
#[case("", 0)]
#[case("abc", 1)]
#[case("password", 2)]
#[case("PASSWORD", 2)]
#[case("pass word", 3)]
#[case("Ab1!", 4)]
#[case("Password1!", 5)]
fn test_builtin_scores(#[case] password: &str, #[case] expected: usize) {
    let engine = QualityGateEngine::new();
    assert_eq!(engine.calculate_passed_quality_gates(password), expected);
}

#[test]
fn test_builtin_gates_are_not_editable() {
    let engine = QualityGateEngine::new();
    assert!(builtin_gates().iter().all(|g| !g.editable && g.enabled));

    let replacement = QualityGate::custom(".*", "anything");
    assert_eq!(
        engine.update_gate("builtin.length", replacement),
        Err(GateError::NotEditable("builtin.length".to_string()))
    );
    assert_eq!(
        engine.remove_gate("builtin.digit"),
        Err(GateError::NotEditable("builtin.digit".to_string()))
    );
    assert_eq!(engine.number_of_quality_gates(), 5);
}

#[test]
fn test_invalid_pattern_rejected() {
    let engine = QualityGateEngine::new();
    let result = engine.add_gate(QualityGate::custom("([a-z", "broken"));
    assert!(matches!(result, Err(GateError::InvalidPattern(_))));
    assert_eq!(engine.number_of_quality_gates(), 5);
}

#[test]
fn test_duplicate_id_rejected() {
    let engine = QualityGateEngine::new();
    let gate = QualityGate::custom(".{16,}", "very long").with_id("custom.long");
    engine.add_gate(gate.clone()).unwrap();
    assert_eq!(
        engine.add_gate(gate),
        Err(GateError::DuplicateId("custom.long".to_string()))
    );
}

#[test]
fn test_update_keeps_position() {
    let engine = QualityGateEngine::new();
    engine
        .add_gate(QualityGate::custom("x.*", "starts with x").with_id("custom.x"))
        .unwrap();
    engine
        .add_gate(QualityGate::custom("y.*", "starts with y").with_id("custom.y"))
        .unwrap();
    engine
        .update_gate("custom.x", QualityGate::custom("z.*", "starts with z"))
        .unwrap();

    let ids: Vec<String> = engine.gates().into_iter().map(|g| g.id).collect();
    assert_eq!(&ids[5..], &["custom.x".to_string(), "custom.y".to_string()]);
    assert_eq!(engine.gate("custom.x").unwrap().pattern, "z.*");
}

#[test]
fn test_remove_returns_gate() {
    let engine = QualityGateEngine::new();
    engine
        .add_gate(QualityGate::custom(".{20,}", "passphrase").with_id("custom.phrase"))
        .unwrap();
    let removed = engine.remove_gate("custom.phrase").unwrap();
    assert_eq!(removed.description, "passphrase");
    assert_eq!(
        engine.remove_gate("custom.phrase"),
        Err(GateError::NotFound("custom.phrase".to_string()))
    );
}

#[test]
fn test_replace_custom_gates_keeps_builtins() {
    let engine = QualityGateEngine::new();
    engine.add_gate(QualityGate::custom("a.*", "a")).unwrap();
    engine
        .replace_custom_gates(vec![
            QualityGate::custom("b.*", "b"),
            QualityGate::custom("c.*", "c"),
        ])
        .unwrap();
    let gates = engine.gates();
    assert_eq!(gates.len(), 7);
    assert_eq!(gates[5].pattern, "b.*");
}

#[test]
fn test_save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gates.csv");

    let engine = QualityGateEngine::new();
    engine.set_enabled("builtin.special", false).unwrap();
    engine
        .add_gate(
            QualityGate::custom("[^,]*,[^,]*", "contains a comma, once")
                .with_id("custom.comma")
                .with_author("alice"),
        )
        .unwrap();
    engine.set_enabled("custom.comma", false).unwrap();
    engine.save(&path).unwrap();

    let restored = QualityGateEngine::new();
    restored.load(&path).unwrap();
    assert_eq!(restored.gates(), engine.gates());
    assert_eq!(restored.number_of_quality_gates(), 4);
}

#[test]
fn test_load_missing_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let engine = QualityGateEngine::new();
    engine.load(dir.path().join("absent.csv")).unwrap();
    assert_eq!(engine.gates(), builtin_gates());
}

#[test]
fn test_load_skips_malformed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gates.csv");
    std::fs::write(
        &path,
        "true,false\ncustom.ok,.*q.*,has q,true,bob\ncustom.bad,([,broken,true\n",
    )
    .unwrap();

    let engine = QualityGateEngine::new();
    engine.load(&path).unwrap();
    let gates = engine.gates();
    // Built-in flags row has the wrong length and is ignored.
    assert!(gates[..5].iter().all(|g| g.enabled));
    assert_eq!(gates.len(), 6);
    assert_eq!(gates[5].id, "custom.ok");
    assert_eq!(gates[5].author.as_deref(), Some("bob"));
}
