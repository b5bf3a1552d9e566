//! Cross-cutting properties checked over a small deterministic corpus.
use jsonschema_core::{validator_for, Evaluation, ValidationErrorKind};
use serde_json::{json, Value};

fn instances() -> Vec<Value> {
    vec![
        json!(null),
        json!(true),
        json!(0),
        json!(-3),
        json!(2.5),
        json!(""),
        json!("abc"),
        json!([]),
        json!([1, "two", null]),
        json!({}),
        json!({"a": 1, "b": [true], "nested": {"c": "x"}}),
    ]
}

fn schemas() -> Vec<Value> {
    vec![
        json!(true),
        json!({}),
        json!({"type": "object"}),
        json!({"minimum": 0}),
        json!({"properties": {"a": {"type": "integer"}}, "required": []}),
        json!({"items": {"type": ["integer", "string", "null"]}}),
        json!({"prefixItems": [true], "contains": {"type": "string"}, "minContains": 0}),
        json!({"allOf": [{"properties": {"a": true}}, {"properties": {"b": true}}]}),
        json!({"anyOf": [{"type": "object"}, {"type": "array"}, {"type": "string"}, true]}),
        json!({"if": {"type": "object"}, "then": {"minProperties": 0}}),
        json!({"$ref": "#/$defs/any", "$defs": {"any": true}}),
        json!({"unevaluatedProperties": true, "unevaluatedItems": true}),
    ]
}

#[test]
fn reported_members_are_always_present_in_the_instance() {
    for schema in schemas() {
        let validator = validator_for(&schema).unwrap();
        for instance in instances() {
            let Ok(evaluation) = validator.validate(&instance) else {
                continue;
            };
            if let Some(keys) = evaluation.evaluated_properties() {
                let map = instance.as_object().expect("object annotations imply an object");
                for key in keys {
                    assert!(map.contains_key(key), "{schema} reported absent key {key}");
                }
            }
            let evaluated_items = evaluation.evaluated_items();
            if let Some(indices) = evaluated_items {
                let items = instance.as_array().expect("array annotations imply an array");
                for index in indices {
                    assert!(index < items.len(), "{schema} reported absent index {index}");
                }
            }
        }
    }
}

#[test]
fn validation_is_deterministic_across_repeated_calls() {
    for schema in schemas() {
        let validator = validator_for(&schema).unwrap();
        for instance in instances() {
            let first = validator.validate(&instance).map_err(|e| e.to_string());
            for _ in 0..3 {
                let again = validator.validate(&instance).map_err(|e| e.to_string());
                assert_eq!(first, again);
            }
        }
    }
}

#[test]
fn forbidding_unevaluated_members_is_exact() {
    // Empty residual passes, non-empty residual fails, for objects and
    // arrays alike.
    let object_schema = json!({
        "properties": {"a": true},
        "unevaluatedProperties": false
    });
    let object_validator = validator_for(&object_schema).unwrap();
    assert!(object_validator.is_valid(&json!({})));
    assert!(object_validator.is_valid(&json!({"a": 1})));
    assert!(matches!(
        object_validator.validate(&json!({"a": 1, "b": 2})).unwrap_err().kind,
        ValidationErrorKind::UnevaluatedNotAllowed { .. }
    ));

    let array_schema = json!({
        "prefixItems": [true],
        "unevaluatedItems": false
    });
    let array_validator = validator_for(&array_schema).unwrap();
    assert!(array_validator.is_valid(&json!([])));
    assert!(array_validator.is_valid(&json!([1])));
    assert!(matches!(
        array_validator.validate(&json!([1, 2])).unwrap_err().kind,
        ValidationErrorKind::UnevaluatedNotAllowed { .. }
    ));
}

#[test]
fn booleans_and_empty_schemas_agree() {
    let empty = validator_for(&json!({})).unwrap();
    let accept = validator_for(&json!(true)).unwrap();
    let reject = validator_for(&json!(false)).unwrap();
    for instance in instances() {
        assert!(empty.is_valid(&instance));
        assert!(accept.is_valid(&instance));
        assert!(!reject.is_valid(&instance));
    }
}

#[test]
fn annotation_free_schemas_return_none() {
    for schema in [
        json!({"type": "object"}),
        json!({"minimum": 0, "maximum": 10}),
        json!({"not": false}),
        json!({"enum": [0, 1, {}, []]}),
    ] {
        let validator = validator_for(&schema).unwrap();
        for instance in [json!(0), json!({}), json!([])] {
            if let Ok(evaluation) = validator.validate(&instance) {
                assert_eq!(evaluation, Evaluation::None, "{schema} over {instance}");
            }
        }
    }
}

#[test]
fn contains_counting_rules() {
    // minContains = 0 turns a match-less `contains` into a pass.
    let zero = json!({"contains": {"type": "string"}, "minContains": 0});
    assert!(jsonschema_core::is_valid(&zero, &json!([])));
    assert!(jsonschema_core::is_valid(&zero, &json!([1, 2])));

    // Counting keywords without `contains` are inert.
    let inert = json!({"minContains": 5, "maxContains": 0});
    assert!(jsonschema_core::is_valid(&inert, &json!([1])));

    // With `contains` absent the default minimum of one match applies to
    // nothing; with it present it does.
    let default_min = json!({"contains": {"type": "string"}});
    assert!(!jsonschema_core::is_valid(&default_min, &json!([1])));
    assert!(jsonschema_core::is_valid(&default_min, &json!(["s"])));
}

#[test]
fn error_paths_point_into_the_instance() {
    let schema = json!({
        "properties": {
            "list": {"items": {"type": "integer"}}
        }
    });
    let validator = validator_for(&schema).unwrap();
    let instance = json!({"list": [0, 1, "two"]});
    let error = validator.validate(&instance).unwrap_err();
    let pointer = error.instance_path.to_string();
    assert_eq!(pointer, "/list/2");
    assert_eq!(instance.pointer(&pointer), Some(&json!("two")));
}
