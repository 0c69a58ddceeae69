//! Property-based tests for quality gate scoring.

use credvault::services::password_analysis::required_gates;
use credvault::services::quality_gates::QualityGateEngine;
use credvault::types::gate::QualityGate;
use proptest::prelude::*;

const BUILTIN_IDS: [&str; 5] = [
    "builtin.length",
    "builtin.lowercase",
    "builtin.uppercase",
    "builtin.digit",
    "builtin.special",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn score_is_bounded_by_enabled_gates(
        password in "\\PC{0,32}",
        disabled in proptest::collection::vec(any::<bool>(), 5),
    ) {
        let engine = QualityGateEngine::new();
        for (id, off) in BUILTIN_IDS.iter().zip(&disabled) {
            engine.set_enabled(id, !off).unwrap();
        }
        let total = engine.number_of_quality_gates();
        prop_assert_eq!(total, disabled.iter().filter(|d| !**d).count());
        prop_assert!(engine.calculate_passed_quality_gates(&password) <= total);
    }

    #[test]
    fn disabling_a_gate_never_raises_the_score(password in "\\PC{0,32}", index in 0usize..5) {
        let engine = QualityGateEngine::new();
        let before = engine.calculate_passed_quality_gates(&password);
        engine.set_enabled(BUILTIN_IDS[index], false).unwrap();
        prop_assert!(engine.calculate_passed_quality_gates(&password) <= before);
    }

    #[test]
    fn match_anything_gate_always_passes(password in "[^\n]{0,32}") {
        let engine = QualityGateEngine::from_gates(vec![QualityGate::custom(".*", "any")]).unwrap();
        prop_assert_eq!(engine.calculate_passed_quality_gates(&password), 1);
    }

    #[test]
    fn required_gates_stays_within_total(total in 0usize..64, tenths in 0u32..=10) {
        let ratio = tenths as f64 / 10.0;
        prop_assert!(required_gates(total, ratio) <= total);
    }
}
