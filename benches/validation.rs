use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "integer", "minimum": 0},
            "name": {"type": "string", "minLength": 1, "maxLength": 64},
            "tags": {
                "type": "array",
                "items": {"type": "string", "pattern": "^[a-z][a-z0-9-]*$"},
                "uniqueItems": true
            },
            "parent": {"$ref": "#"}
        },
        "required": ["id", "name"],
        "unevaluatedProperties": false
    })
}

fn instance() -> serde_json::Value {
    json!({
        "id": 17,
        "name": "widget",
        "tags": ["core", "beta-2"],
        "parent": {"id": 16, "name": "assembly", "tags": ["core"]}
    })
}

fn bench_compile(c: &mut Criterion) {
    let schema = schema();
    c.bench_function("compile", |b| {
        b.iter(|| jsonschema_core::validator_for(black_box(&schema)).unwrap())
    });
}

fn bench_validate(c: &mut Criterion) {
    let validator = jsonschema_core::validator_for(&schema()).unwrap();
    let valid = instance();
    let invalid = json!({"id": -1, "name": ""});
    c.bench_function("validate/valid", |b| {
        b.iter(|| validator.validate(black_box(&valid)).is_ok())
    });
    c.bench_function("validate/invalid", |b| {
        b.iter(|| validator.validate(black_box(&invalid)).is_err())
    });
    c.bench_function("is_valid", |b| b.iter(|| validator.is_valid(black_box(&valid))));
}

criterion_group!(benches, bench_compile, bench_validate);
criterion_main!(benches);
