//! Projection analysis and reconciliation tests

use refsieve_core::projection::Projection;
use refsieve_projection::{
    classify, is_exclusive, is_inclusive, is_path_excluded, reconcile, sanitize_projection,
    PopulateOptions, PopulatePaths, ProjectionKind,
};
use serde_json::{json, Value};

fn projection(value: Value) -> Projection {
    Projection::from_json(&value).expect("fixture must be an object")
}

fn paths(entries: &[(&str, Option<&str>)]) -> PopulatePaths {
    entries
        .iter()
        .map(|(path, disc)| {
            let opts = match disc {
                Some(field) => PopulateOptions::with_discriminator(*field),
                None => PopulateOptions::default(),
            };
            (path.to_string(), opts)
        })
        .collect()
}

#[test]
fn test_elem_match_never_defines_mode() {
    let p = projection(json!({"field": {"$elemMatch": {"x": 1}}, "other": 1}));
    assert_eq!(is_exclusive(Some(&p)), Some(false));
    assert!(is_inclusive(Some(&p)));
}

#[test]
fn test_classification_is_exclusive_of_itself() {
    let cases = [
        json!({"a": 1}),
        json!({"a": 0}),
        json!({"a": 0, "b": 1}),
        json!({"_id": 0}),
        json!({"_id": 0, "a": 1}),
        json!({"s": {"$slice": 2}}),
        json!({"+secret": 1, "a": 0}),
        json!({}),
    ];
    for case in cases {
        let p = projection(case.clone());
        let both = is_inclusive(Some(&p)) && is_exclusive(Some(&p)) == Some(true);
        assert!(!both, "{case} classified both ways");
    }
}

#[test]
fn test_reconcile_inclusive_adds_reference_and_discriminator() {
    let original = projection(json!({"name": 1}));
    let mut fields = original.clone();
    let kind = reconcile(&mut fields, &original, &paths(&[("parent", Some("parentModel"))]));
    assert_eq!(kind, ProjectionKind::Inclusive);
    assert_eq!(fields.to_json(), json!({"name": 1, "parent": 1, "parentModel": 1}));
}

#[test]
fn test_reconcile_exclusive_restores_original() {
    let original = projection(json!({"name": 0}));
    let mut fields = projection(json!({"name": 0, "parentModel": 0}));
    reconcile(&mut fields, &original, &paths(&[("parent", Some("parentModel"))]));
    assert_eq!(fields.to_json(), json!({"name": 0}));
}

#[test]
fn test_reconcile_uses_outbound_mode_when_caller_projected_nothing() {
    let original = Projection::new();
    let mut fields = projection(json!({"password": 0, "parentModel": 0}));
    let kind = reconcile(&mut fields, &original, &paths(&[("parent", Some("parentModel"))]));
    assert_eq!(kind, ProjectionKind::Exclusive);
    assert_eq!(fields.to_json(), json!({"password": 0}));
}

#[test]
fn test_reconcile_several_paths() {
    let original = projection(json!({"title": 1, "comments.$": 1}));
    let mut fields = original.clone();
    reconcile(
        &mut fields,
        &original,
        &paths(&[("author", None), ("comments.user", Some("comments.userKind"))]),
    );
    assert_eq!(
        fields.to_json(),
        json!({"title": 1, "comments.$": 1, "author": 1})
    );
}

#[test]
fn test_caller_exclusion_of_exact_key_wins() {
    let original = projection(json!({"title": 1, "author": 0}));
    let mut fields = original.clone();
    reconcile(&mut fields, &original, &paths(&[("author", None)]));
    assert_eq!(fields.to_json(), json!({"title": 1}));
}

#[test]
fn test_reconciled_projection_still_classifies_the_same() {
    let original = projection(json!({"name": 0, "_id": 0}));
    let mut fields = projection(json!({"name": 0, "_id": 0, "owner": 0}));
    reconcile(&mut fields, &original, &paths(&[("owner", None)]));
    assert_eq!(classify(Some(&fields)), ProjectionKind::Exclusive);
    assert!(!is_path_excluded(Some(&fields), "owner"));
    assert!(is_path_excluded(Some(&fields), "_id"));
}

#[test]
fn test_untrusted_string_flags_are_neutralized() {
    let mut p = projection(json!({"name": "+password", "email": 1}));
    assert_eq!(sanitize_projection(&mut p), 1);
    assert_eq!(p.to_json(), json!({"name": 1, "email": 1}));
    assert_eq!(classify(Some(&p)), ProjectionKind::Inclusive);
}
