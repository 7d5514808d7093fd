//! Reconciliation round-trip and merge-safety tests.

use skillspec::preserve::{
    GENERATED_END, GENERATED_START, MANUAL_END, MANUAL_START, parse_document, reconcile,
    wrap_generated, wrap_manual,
};

fn document_with_manual_blocks(generated: &str, manual: &[&str]) -> String {
    let mut parts = vec![wrap_generated(generated)];
    for block in manual {
        parts.push(String::new());
        parts.push(wrap_manual(block));
    }
    parts.join("\n")
}

#[test]
fn round_trip_preserves_every_manual_block() {
    let manual = ["reviewer notes", "## Local Setup\nrun make install", "third block"];
    let previous = document_with_manual_blocks("old body", &manual);

    let result = reconcile(&previous, "regenerated body", false).unwrap();
    assert_eq!(result.manual_blocks_preserved, manual.len());
    assert_eq!(result.generated_blocks_updated, 1);

    let merged = parse_document(&result.merged).unwrap();
    let preserved: Vec<String> = merged
        .manual_blocks()
        .iter()
        .map(|b| b.content.trim().to_string())
        .collect();
    let expected: Vec<String> = manual.iter().map(|m| m.trim().to_string()).collect();
    assert_eq!(preserved, expected);
}

#[test]
fn merging_twice_with_same_content_is_stable() {
    let previous = document_with_manual_blocks("body", &["note one", "note two"]);
    let once = reconcile(&previous, "body", false).unwrap();
    let twice = reconcile(&once.merged, "body", false).unwrap();

    assert_eq!(once.merged, twice.merged);
    assert_eq!(twice.manual_blocks_preserved, 2);
}

#[test]
fn force_discards_manual_content_and_warns() {
    let previous = document_with_manual_blocks("old", &["precious manual edit"]);
    let result = reconcile(&previous, "fresh", true).unwrap();

    assert_eq!(result.merged, "fresh");
    assert!(!result.merged.contains("precious"));
    assert!(result.warnings.iter().any(|w| w.contains("Force")));
}

#[test]
fn unmarked_previous_document_adopts_markers() {
    let result = reconcile("hand-written original", "generated replacement", false).unwrap();

    assert!(result.merged.starts_with(GENERATED_START));
    assert!(result.merged.trim_end().ends_with(GENERATED_END));
    assert!(result.merged.contains("generated replacement"));
    assert_eq!(result.manual_blocks_preserved, 0);
    assert!(result.warnings.iter().any(|w| w.contains("No markers")));
}

#[test]
fn front_matter_stays_above_generated_marker() {
    let previous = document_with_manual_blocks("old", &["note"]);
    let fresh = "---\nname: \"skill\"\ndescription: \"d\"\n---\n# Body\ncontent";
    let result = reconcile(&previous, fresh, false).unwrap();

    let front = result.merged.find("name: \"skill\"").unwrap();
    let marker = result.merged.find(GENERATED_START).unwrap();
    assert!(front < marker);

    // The manual block still trails the generated region.
    let manual = result.merged.find("note").unwrap();
    assert!(manual > marker);
}

#[test]
fn corrupt_marker_structure_aborts_without_output() {
    let previous = format!(
        "{GENERATED_START}\nbody\n{GENERATED_END}\nstray\n{MANUAL_END}\n{MANUAL_START}\nnote\n{MANUAL_END}"
    );
    let err = reconcile(&previous, "fresh", false).unwrap_err();
    assert!(err.to_string().contains("end marker"));
}

#[test]
fn manual_only_document_keeps_all_blocks() {
    let previous = format!(
        "{MANUAL_START}\nonly notes here\n{MANUAL_END}\n\n{MANUAL_START}\nmore notes\n{MANUAL_END}"
    );
    let result = reconcile(&previous, "first generated body", false).unwrap();

    assert_eq!(result.manual_blocks_preserved, 2);
    let merged = parse_document(&result.merged).unwrap();
    assert_eq!(merged.generated_blocks().len(), 1);
    assert_eq!(merged.manual_blocks().len(), 2);
}

#[test]
fn unmarked_text_between_blocks_is_not_preserved() {
    // Only manual blocks survive regeneration; loose text between regions
    // belongs to no one and is dropped.
    let previous = format!(
        "{GENERATED_START}\nold\n{GENERATED_END}\nloose commentary\n{MANUAL_START}\nkept\n{MANUAL_END}"
    );
    let result = reconcile(&previous, "new", false).unwrap();
    assert!(!result.merged.contains("loose commentary"));
    assert!(result.merged.contains("kept"));
}
