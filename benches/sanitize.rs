use criterion::{black_box, criterion_group, criterion_main, Criterion};
use refsieve::core::schema::{ScalarType, Schema, SchemaNode};
use refsieve::{Filter, RefId, ReferenceQuery, Sanitizer};
use serde_json::{json, Value};

fn make_filter(clauses: usize) -> Filter {
    let mut obj = serde_json::Map::new();
    for i in 0..clauses {
        let value = if i % 3 == 0 {
            json!({"$ne": i})
        } else {
            json!(format!("value-{}", i))
        };
        obj.insert(format!("field{}", i), value);
    }
    obj.insert(
        "$or".into(),
        json!([{"a": {"$gt": 1}}, {"b": 2}, {"c": {"$in": [1, 2, 3]}}]),
    );
    Filter::from_map(&obj)
}

fn make_ids(count: usize) -> Vec<RefId> {
    (0..count)
        .map(|i| {
            let id: Value = json!(format!("{:024x}", i));
            if i % 10 == 0 {
                RefId::Skip(id)
            } else {
                RefId::Id(id)
            }
        })
        .collect()
}

fn bench_sanitize(c: &mut Criterion) {
    let filter = make_filter(64);
    c.bench_function("sanitize_permissive_64", |b| {
        let sanitizer = Sanitizer::permissive();
        b.iter(|| {
            let mut f = filter.clone();
            sanitizer.sanitize(&mut f).unwrap();
            black_box(f)
        })
    });
    c.bench_function("sanitize_strict_reject_64", |b| {
        let sanitizer = Sanitizer::strict();
        b.iter(|| {
            let mut f = filter.clone();
            black_box(sanitizer.sanitize(&mut f).is_err())
        })
    });
}

fn bench_reference_filter(c: &mut Criterion) {
    let schema = Schema::new()
        .with("owner", SchemaNode::Scalar(ScalarType::ObjectId))
        .with("editor", SchemaNode::Scalar(ScalarType::ObjectId));
    let ids = make_ids(1024);
    let query = ReferenceQuery::new("owner")
        .foreign_field("editor")
        .skip_invalid_ids(true);
    c.bench_function("reference_filter_1024_ids", |b| {
        b.iter(|| black_box(query.build(&ids, &schema)))
    });
}

criterion_group!(benches, bench_sanitize, bench_reference_filter);
criterion_main!(benches);
