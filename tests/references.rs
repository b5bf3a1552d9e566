//! Reference resolution: pointers, anchors, resources, dynamic scope.
use std::sync::Arc;

use jsonschema_core::{validator_for, ReferenceResolver, ResolveError, ValidationErrorKind};
use serde_json::{json, Value};

#[test]
fn self_reference_recursion_bottoms_out_on_the_instance() {
    let schema = json!({
        "type": "object",
        "properties": {
            "value": {"type": "integer"},
            "left": {"$ref": "#"},
            "right": {"$ref": "#"}
        },
        "unevaluatedProperties": false
    });
    let validator = validator_for(&schema).unwrap();
    let tree = json!({
        "value": 1,
        "left": {"value": 2},
        "right": {"value": 3, "left": {"value": 4}}
    });
    assert!(validator.is_valid(&tree));
    assert!(!validator.is_valid(&json!({"value": 1, "left": {"value": "x"}})));
    assert!(!validator.is_valid(&json!({"value": 1, "stray": 2})));
}

#[test]
fn anchors_resolve_within_their_resource() {
    let schema = json!({
        "$id": "https://example.com/schemas/main.json",
        "properties": {
            "code": {"$ref": "#code"}
        },
        "$defs": {
            "code": {"$anchor": "code", "type": "string", "pattern": "^[A-Z]{2}$"}
        }
    });
    let validator = validator_for(&schema).unwrap();
    assert!(validator.is_valid(&json!({"code": "AB"})));
    assert!(!validator.is_valid(&json!({"code": "abc"})));
}

#[test]
fn relative_references_use_the_id_directory() {
    let schema = json!({
        "$id": "https://example.com/api/root.json",
        "$ref": "common/name.json",
        "$defs": {
            "name": {
                "$id": "https://example.com/api/common/name.json",
                "type": "string"
            }
        }
    });
    let validator = validator_for(&schema).unwrap();
    assert!(validator.is_valid(&json!("x")));
    assert!(!validator.is_valid(&json!(1)));
}

#[test]
fn reference_alongside_other_keywords_is_conjunctive() {
    let schema = json!({
        "$ref": "#/$defs/base",
        "minimum": 0,
        "$defs": {"base": {"type": "integer", "maximum": 100}}
    });
    let validator = validator_for(&schema).unwrap();
    assert!(validator.is_valid(&json!(50)));
    assert!(!validator.is_valid(&json!(-1)));
    assert!(!validator.is_valid(&json!(101)));
}

#[test]
fn dynamic_anchor_resolves_outermost_first() {
    // A generic list whose items are extended by the outer schema: the
    // classic $dynamicRef shape.
    let schema = json!({
        "$id": "https://example.com/strict-tree.json",
        "$dynamicAnchor": "node",
        "$ref": "tree.json",
        "unevaluatedProperties": false,
        "$defs": {
            "tree": {
                "$id": "https://example.com/tree.json",
                "$dynamicAnchor": "node",
                "type": "object",
                "properties": {
                    "data": true,
                    "children": {
                        "type": "array",
                        "items": {"$dynamicRef": "#node"}
                    }
                }
            }
        }
    });
    let validator = validator_for(&schema).unwrap();
    assert!(validator.is_valid(&json!({"data": 1, "children": [{"data": 2}]})));
    // The nested node carries a stray property; because "#node" resolves to
    // the outermost (strict) schema, it must be rejected.
    assert!(!validator.is_valid(&json!({
        "children": [{"daat": 1}]
    })));
}

#[test]
fn dynamic_ref_with_pointer_fragment_falls_back() {
    let schema = json!({
        "$dynamicRef": "#/$defs/limit",
        "$defs": {"limit": {"maximum": 10}}
    });
    let validator = validator_for(&schema).unwrap();
    assert!(validator.is_valid(&json!(5)));
    assert!(!validator.is_valid(&json!(11)));
}

#[test]
fn unresolvable_references_fail_compilation_eagerly() {
    for schema in [
        json!({"$ref": "#/$defs/missing"}),
        json!({"$ref": "https://example.com/unknown.json"}),
        json!({"$dynamicRef": "#missing"}),
    ] {
        let error = validator_for(&schema).expect_err("must not compile");
        assert!(
            matches!(error.kind, ValidationErrorKind::UnresolvedReference { .. }),
            "unexpected kind: {:?}",
            error.kind
        );
    }
}

struct MapResolver {
    documents: Vec<(String, Arc<Value>)>,
}

impl ReferenceResolver for MapResolver {
    fn resolve(&self, uri: &str) -> Result<Arc<Value>, ResolveError> {
        self.documents
            .iter()
            .find(|(known, _)| known == uri)
            .map(|(_, document)| Arc::clone(document))
            .ok_or_else(|| ResolveError::NotFound {
                reference: uri.to_string(),
            })
    }
}

#[test]
fn custom_resolvers_supply_external_documents() {
    let resolver = MapResolver {
        documents: vec![(
            "https://example.com/ext.json".to_string(),
            Arc::new(json!({"type": "boolean"})),
        )],
    };
    let validator = jsonschema_core::options()
        .with_resolver(resolver)
        .build(&json!({"$ref": "https://example.com/ext.json"}))
        .unwrap();
    assert!(validator.is_valid(&json!(true)));
    assert!(!validator.is_valid(&json!("true")));
}

#[test]
fn pointer_fragments_reach_into_external_documents() {
    let resolver = MapResolver {
        documents: vec![(
            "https://example.com/defs.json".to_string(),
            Arc::new(json!({"$defs": {"id": {"type": "integer"}}})),
        )],
    };
    let validator = jsonschema_core::options()
        .with_resolver(resolver)
        .build(&json!({"$ref": "https://example.com/defs.json#/$defs/id"}))
        .unwrap();
    assert!(validator.is_valid(&json!(3)));
    assert!(!validator.is_valid(&json!(3.5)));
}

#[test]
fn lazy_children_compile_once_across_calls() {
    let schema = json!({
        "properties": {"next": {"$ref": "#"}, "value": {"type": "integer"}}
    });
    let validator = validator_for(&schema).unwrap();
    // Repeated top-level calls share the lazily compiled reference child;
    // results must be identical every time.
    let instance = json!({"value": 1, "next": {"value": 2}});
    for _ in 0..3 {
        assert!(validator.is_valid(&instance));
        assert!(!validator.is_valid(&json!({"next": {"value": "x"}})));
    }
}

#[test]
fn in_place_cycles_through_composition_are_compile_errors() {
    for schema in [
        json!({"allOf": [{"$ref": "#"}]}),
        json!({"not": {"$ref": "#"}}),
        json!({
            "$defs": {"a": {"anyOf": [{"$ref": "#/$defs/a"}, {"type": "null"}]}},
            "$ref": "#/$defs/a"
        }),
    ] {
        let error = validator_for(&schema).expect_err("must not compile");
        assert!(matches!(
            error.kind,
            ValidationErrorKind::CircularReference { .. }
        ));
    }
}
