//! Reference filter synthesis tests

use refsieve_core::filter::Filter;
use refsieve_core::schema::{ScalarType, Schema, SchemaNode};
use refsieve_populate::{build_reference_filter, filter_invalid_ids, ReferenceQuery, RefId};
use serde_json::{json, Value};

const OID_A: &str = "5f1d7f3e2b6a4c0012345678";
const OID_B: &str = "5f1d7f3e2b6a4c0012345679";

fn user_schema() -> Schema {
    let address = Schema::new().with("owner", SchemaNode::Scalar(ScalarType::ObjectId));
    Schema::new()
        .with("owner", SchemaNode::Scalar(ScalarType::ObjectId))
        .with("editor", SchemaNode::Scalar(ScalarType::ObjectId))
        .with("score", SchemaNode::Scalar(ScalarType::Number))
        .with("addresses", SchemaNode::DocumentArray(address))
}

fn ids(values: &[Value]) -> Vec<RefId> {
    values.iter().cloned().map(RefId::from).collect()
}

fn filter(value: Value) -> Filter {
    Filter::from_json(&value).expect("fixture must be an object")
}

#[test]
fn test_single_foreign_field() {
    let out = ReferenceQuery::new("owner").build(&ids(&[json!(1), json!(2), json!(3)]), &Schema::new());
    assert_eq!(out.to_json(), json!({"owner": {"$in": [1, 2, 3]}}));
}

#[test]
fn test_caller_pin_on_foreign_field_is_kept() {
    let batch = ids(&[json!(5), json!(6)]);
    let out = ReferenceQuery::new("owner")
        .matching(filter(json!({"owner": 5})))
        .build(&batch, &Schema::new());
    assert_eq!(out.to_json(), json!({"owner": {"$in": [5, 6], "$eq": 5}}));
}

#[test]
fn test_two_foreign_fields_become_or() {
    let batch = ids(&[json!(1), json!(2)]);
    let out = ReferenceQuery::new("a").foreign_field("b").build(&batch, &Schema::new());
    assert_eq!(
        out.to_json(),
        json!({"$or": [{"a": {"$in": [1, 2]}}, {"b": {"$in": [1, 2]}}]})
    );
}

#[test]
fn test_existing_or_is_and_combined() {
    let batch = ids(&[json!(7)]);
    let out = ReferenceQuery::new("a")
        .foreign_field("b")
        .matching(filter(json!({"$or": [{"x": 1}, {"y": 2}]})))
        .build(&batch, &Schema::new());
    assert_eq!(
        out.to_json(),
        json!({"$and": [
            {"$or": [{"x": 1}, {"y": 2}]},
            {"$or": [{"a": {"$in": [7]}}, {"b": {"$in": [7]}}]}
        ]})
    );
}

#[test]
fn test_duplicate_foreign_field_is_ignored() {
    let out = ReferenceQuery::new("owner")
        .foreign_field("owner")
        .build(&ids(&[json!(1)]), &Schema::new());
    assert_eq!(out.to_json(), json!({"owner": {"$in": [1]}}));
}

#[test]
fn test_elem_match_ancestor_receives_ids() {
    let batch = ids(&[json!(OID_A)]);
    let out = ReferenceQuery::new("addresses.owner")
        .matching(filter(json!({"addresses": {"$elemMatch": {"city": "Oslo"}}})))
        .build(&batch, &user_schema());
    assert_eq!(
        out.to_json(),
        json!({"addresses": {"$elemMatch": {"city": "Oslo", "owner": {"$in": [OID_A]}}}})
    );
}

#[test]
fn test_pinned_id_is_merged() {
    let out = ReferenceQuery::new("_id")
        .matching(filter(json!({"_id": {"$nin": [3]}})))
        .build(&ids(&[json!(1), json!(2)]), &Schema::new());
    assert_eq!(out.to_json(), json!({"_id": {"$in": [1, 2], "$nin": [3]}}));
}

#[test]
fn test_skip_entries_never_reach_the_filter() {
    let batch = vec![RefId::Id(json!(OID_A)), RefId::Skip(json!(OID_B))];
    let out = ReferenceQuery::new("owner").build(&batch, &user_schema());
    assert_eq!(out.to_json(), json!({"owner": {"$in": [OID_A]}}));
}

#[test]
fn test_invalid_ids_dropped_only_when_asked() {
    let batch = ids(&[json!(OID_A), json!("not-an-id"), json!(42)]);

    let kept = ReferenceQuery::new("owner").build(&batch, &user_schema());
    assert_eq!(kept.to_json(), json!({"owner": {"$in": [OID_A, "not-an-id", 42]}}));

    let dropped = ReferenceQuery::new("owner")
        .skip_invalid_ids(true)
        .build(&batch, &user_schema());
    assert_eq!(dropped.to_json(), json!({"owner": {"$in": [OID_A]}}));
}

#[test]
fn test_invalid_ids_filtered_per_field_type() {
    let batch = ids(&[json!(OID_A), json!("12")]);
    let out = build_reference_filter(
        &batch,
        &[],
        &["owner".to_string(), "score".to_string()],
        &user_schema(),
        true,
    );
    assert_eq!(
        out.to_json(),
        json!({"$or": [
            {"owner": {"$in": [OID_A]}},
            {"score": {"$in": ["12"]}}
        ]})
    );
}

#[test]
fn test_unknown_path_keeps_every_id() {
    let batch = ids(&[json!("anything"), json!(null)]);
    let kept = filter_invalid_ids(&batch, user_schema().path("missing"), true);
    assert_eq!(kept, vec![json!("anything"), json!(null)]);
}

#[test]
fn test_nested_path_resolves_through_document_array() {
    let schema = user_schema();
    let node = schema.path("addresses.owner").expect("nested path resolves");
    assert_eq!(node, &SchemaNode::Scalar(ScalarType::ObjectId));
    assert_eq!(schema.path("addresses.0.owner"), Some(node));
}
