//! `$ref` and `$dynamicRef`.
//!
//! Reference nodes are the only place where the validator tree can close a
//! cycle, so they are also the only lazily compiled nodes: the child
//! validator is built on first use under a one-shot guard and cached for
//! the lifetime of the compiled schema. Reference chains that can never
//! terminate (pure `$ref` hops and in-place applicators) are rejected at
//! compile time; everything else is guarded at validate time by the
//! per-value reference trail.
use ahash::AHashSet;
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::{
    compiler::{self, CompilerContext},
    context::{EvaluationContext, ScopeEntry},
    error::ValidationError,
    evaluation::Evaluation,
    paths::InstancePath,
    resolver::{self, Resolution, ResolveError, SchemaResolver},
    uri,
    validators::{BoxedValidator, CompilationResult, Validate},
};

pub(crate) fn resolve_error_to_validation(
    ctx: &CompilerContext,
    reference: &str,
    error: &ResolveError,
) -> ValidationError<'static> {
    match error {
        ResolveError::NotFound { .. } => {
            ValidationError::unresolved_reference(ctx.location.clone(), reference)
        }
        ResolveError::InvalidPointer { pointer } => ValidationError {
            instance: std::borrow::Cow::Owned(Value::Null),
            kind: crate::error::ValidationErrorKind::InvalidPointer {
                pointer: pointer.clone(),
            },
            instance_path: crate::paths::JsonPointer::default(),
            schema_path: ctx.location.clone(),
        },
        ResolveError::FetchFailed { reference, source } => ValidationError {
            instance: std::borrow::Cow::Owned(Value::Null),
            kind: crate::error::ValidationErrorKind::FetchFailed {
                reference: reference.clone(),
                detail: source.to_string(),
            },
            instance_path: crate::paths::JsonPointer::default(),
            schema_path: ctx.location.clone(),
        },
    }
}

pub(crate) struct RefValidator {
    resolved_uri: String,
    target: Resolution,
    /// Compile state captured for the lazy child build.
    ctx: CompilerContext,
    cell: OnceCell<Result<BoxedValidator, ValidationError<'static>>>,
}

impl RefValidator {
    pub(crate) fn compile(ctx: &CompilerContext, reference: &str) -> CompilationResult {
        let resolver = ctx.resolver.acquire();
        let result = Self::compile_with_resolver(ctx, &resolver, reference);
        ctx.resolver.release(resolver);
        result
    }

    fn compile_with_resolver(
        ctx: &CompilerContext,
        resolver: &SchemaResolver,
        reference: &str,
    ) -> CompilationResult {
        let resolved_uri = uri::resolve_against(&ctx.base_uri, reference)
            .ok_or_else(|| ValidationError::unresolved_reference(ctx.location.clone(), reference))?;
        // Unresolvable non-dynamic references fail eagerly.
        let target = resolver
            .resolve_reference(&ctx.resolver, &ctx.base_uri, &ctx.base, reference)
            .map_err(|error| resolve_error_to_validation(ctx, reference, &error))?;
        detect_static_cycles(ctx, resolver, &ctx.base_uri, &ctx.base, reference, &mut Vec::new(), &mut AHashSet::new())?;

        // The child compiles against the target's resource and base URI;
        // entering another resource extends the dynamic scope.
        let mut capture = ctx.clone();
        capture.base = target.resource.clone();
        capture.base_uri = target.base_uri.clone();
        if capture
            .scope
            .last()
            .map_or(true, |entry| entry.base_uri != target.base_uri)
        {
            capture.scope.push(ScopeEntry {
                schema: target.resource.clone(),
                base_uri: target.base_uri.clone(),
            });
        }
        Ok(Box::new(RefValidator {
            resolved_uri,
            target,
            ctx: capture,
            cell: OnceCell::new(),
        }))
    }

    fn child(&self) -> Result<&BoxedValidator, ValidationError<'static>> {
        match self
            .cell
            .get_or_init(|| compiler::compile(&self.ctx, &self.target.schema))
        {
            Ok(validator) => Ok(validator),
            Err(error) => Err(error.clone()),
        }
    }
}

impl Validate for RefValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        if ctx.is_reference_active(&self.resolved_uri) {
            return Err(ValidationError::circular_reference(
                self.ctx.location.clone(),
                &self.resolved_uri,
            ));
        }
        let child = self.child()?;
        let mut child_ctx = ctx.with_reference(self.resolved_uri.clone());
        if self.target.schema.get("$id").is_some() {
            child_ctx = child_ctx.with_scope(ScopeEntry {
                schema: self.target.schema.clone(),
                base_uri: self.target.base_uri.clone(),
            });
        }
        child.validate(&child_ctx, instance, path)
    }
}

pub(crate) struct DynamicRefValidator {
    reference: String,
    anchor: String,
    resolved_uri: String,
    captured_scope: Vec<ScopeEntry>,
    fallback: Resolution,
    ctx: CompilerContext,
    cell: OnceCell<Result<(BoxedValidator, Resolution), ValidationError<'static>>>,
}

impl DynamicRefValidator {
    pub(crate) fn compile(ctx: &CompilerContext, reference: &str) -> CompilationResult {
        let Some(fragment) = reference.strip_prefix('#') else {
            // Dynamic references with a URI part behave like `$ref`.
            return RefValidator::compile(ctx, reference);
        };
        let resolver = ctx.resolver.acquire();
        // The fallback (plain anchor or JSON pointer against the current
        // resource) must resolve, or compilation fails.
        let fallback = resolver
            .resolve_reference(&ctx.resolver, &ctx.base_uri, &ctx.base, reference)
            .map_err(|error| resolve_error_to_validation(ctx, reference, &error));
        ctx.resolver.release(resolver);
        let fallback = fallback?;
        let resolved_uri = uri::resolve_against(&ctx.base_uri, reference)
            .unwrap_or_else(|| reference.to_string());
        Ok(Box::new(DynamicRefValidator {
            reference: reference.to_string(),
            anchor: fragment.to_string(),
            resolved_uri,
            captured_scope: ctx.scope.clone(),
            fallback,
            ctx: ctx.clone(),
            cell: OnceCell::new(),
        }))
    }

    /// Search the dynamic scope, outermost first, for the matching
    /// `$dynamicAnchor`; fall back to the compile-time resolution.
    fn resolve(&self, runtime_scope: &[ScopeEntry]) -> Resolution {
        for entry in self.captured_scope.iter().chain(runtime_scope) {
            if let Some(schema) = resolver::find_dynamic_anchor(&entry.schema, &self.anchor) {
                return Resolution {
                    schema: std::sync::Arc::new(schema.clone()),
                    base_uri: entry.base_uri.clone(),
                    resource: entry.schema.clone(),
                };
            }
        }
        self.fallback.clone()
    }

    fn child(&self, runtime_scope: &[ScopeEntry]) -> Result<(&BoxedValidator, &Resolution), ValidationError<'static>> {
        let resolved = self
            .cell
            .get_or_init(|| {
                let resolution = self.resolve(runtime_scope);
                let mut capture = self.ctx.clone();
                capture.base = resolution.resource.clone();
                capture.base_uri = resolution.base_uri.clone();
                if capture
                    .scope
                    .last()
                    .map_or(true, |entry| entry.base_uri != resolution.base_uri)
                {
                    capture.scope.push(ScopeEntry {
                        schema: resolution.resource.clone(),
                        base_uri: resolution.base_uri.clone(),
                    });
                }
                compiler::compile(&capture, resolution.schema.as_ref())
                    .map(|validator| (validator, resolution))
            })
            .as_ref();
        match resolved {
            Ok((validator, resolution)) => Ok((validator, resolution)),
            Err(error) => Err(error.clone()),
        }
    }
}

impl Validate for DynamicRefValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        if ctx.is_reference_active(&self.resolved_uri) {
            return Err(ValidationError::circular_reference(
                self.ctx.location.clone(),
                &self.reference,
            ));
        }
        let (child, resolution) = self.child(&ctx.dynamic_scope)?;
        let child_ctx = ctx
            .with_reference(self.resolved_uri.clone())
            .with_scope(ScopeEntry {
                schema: resolution.resource.clone(),
                base_uri: resolution.base_uri.clone(),
            });
        child.validate(&child_ctx, instance, path)
    }
}

/// Reject reference cycles that can never consume input: chains of `$ref`
/// hops and in-place applicators (`allOf`, `anyOf`, `oneOf`, `not`,
/// `if`/`then`/`else`, `dependentSchemas`). Cycles broken by a structural
/// keyword (`properties`, `items`, ...) descend into a member value and are
/// fine; cycles through `$dynamicRef` are resolved dynamically and are
/// checked at validate time instead.
fn detect_static_cycles(
    ctx: &CompilerContext,
    resolver: &SchemaResolver,
    base_uri: &str,
    base: &std::sync::Arc<Value>,
    reference: &str,
    chain: &mut Vec<String>,
    visited: &mut AHashSet<String>,
) -> Result<(), ValidationError<'static>> {
    let Some(key) = uri::resolve_against(base_uri, reference) else {
        return Err(ValidationError::unresolved_reference(
            ctx.location.clone(),
            reference,
        ));
    };
    if chain.contains(&key) {
        return Err(ValidationError::circular_reference(
            ctx.location.clone(),
            reference,
        ));
    }
    if !visited.insert(key.clone()) {
        return Ok(());
    }
    // References that do not resolve here are someone else's compile error.
    let Ok(resolution) = resolver.resolve_reference(&ctx.resolver, base_uri, base, reference)
    else {
        return Ok(());
    };
    chain.push(key);
    walk_in_place(
        ctx,
        resolver,
        &resolution.base_uri,
        &resolution.resource,
        &resolution.schema,
        chain,
        visited,
    )?;
    chain.pop();
    Ok(())
}

fn walk_in_place(
    ctx: &CompilerContext,
    resolver: &SchemaResolver,
    base_uri: &str,
    base: &std::sync::Arc<Value>,
    schema: &Value,
    chain: &mut Vec<String>,
    visited: &mut AHashSet<String>,
) -> Result<(), ValidationError<'static>> {
    let Value::Object(map) = schema else {
        return Ok(());
    };
    let mut base_uri = base_uri.to_string();
    let mut base = base.clone();
    if let Some(id) = map.get("$id").and_then(Value::as_str) {
        if let Some(resolved) = uri::resolve_against(&base_uri, id) {
            base_uri = resolved;
            base = std::sync::Arc::new(schema.clone());
        }
    }
    if let Some(Value::String(reference)) = map.get("$ref") {
        detect_static_cycles(ctx, resolver, &base_uri, &base, reference, chain, visited)?;
    }
    for keyword in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(items)) = map.get(keyword) {
            for item in items {
                walk_in_place(ctx, resolver, &base_uri, &base, item, chain, visited)?;
            }
        }
    }
    for keyword in ["not", "if", "then", "else"] {
        if let Some(subschema) = map.get(keyword) {
            walk_in_place(ctx, resolver, &base_uri, &base, subschema, chain, visited)?;
        }
    }
    if let Some(Value::Object(dependents)) = map.get("dependentSchemas") {
        for subschema in dependents.values() {
            walk_in_place(ctx, resolver, &base_uri, &base, subschema, chain, visited)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;

    #[test]
    fn pointer_reference_into_defs() {
        let schema = json!({
            "$ref": "#/$defs/positive",
            "$defs": {"positive": {"type": "integer", "exclusiveMinimum": 0}}
        });
        tests_util::assert_valid(&schema, &json!(3));
        tests_util::assert_not_valid(&schema, &json!(0));
        tests_util::assert_not_valid(&schema, &json!("x"));
    }

    #[test]
    fn sibling_keywords_apply_alongside_the_reference() {
        let schema = json!({
            "$ref": "#/$defs/base",
            "maximum": 10,
            "$defs": {"base": {"type": "integer", "minimum": 0}}
        });
        tests_util::assert_valid(&schema, &json!(5));
        tests_util::assert_not_valid(&schema, &json!(-1));
        tests_util::assert_not_valid(&schema, &json!(11));
    }

    #[test]
    fn anchor_reference() {
        let schema = json!({
            "$ref": "#tag",
            "$defs": {"tagged": {"$anchor": "tag", "type": "string"}}
        });
        tests_util::assert_valid(&schema, &json!("x"));
        tests_util::assert_not_valid(&schema, &json!(1));
    }

    #[test]
    fn recursive_schema_follows_instance_depth() {
        let schema = json!({
            "type": "object",
            "properties": {
                "children": {"type": "array", "items": {"$ref": "#"}}
            }
        });
        let instance = json!({
            "children": [
                {"children": []},
                {"children": [{"children": []}]}
            ]
        });
        tests_util::assert_valid(&schema, &instance);
        tests_util::assert_not_valid(&schema, &json!({"children": [3]}));
    }

    #[test]
    fn pure_reference_cycle_fails_compilation() {
        let schema = json!({
            "$ref": "#/$defs/a",
            "$defs": {
                "a": {"$ref": "#/$defs/b"},
                "b": {"$ref": "#/$defs/a"}
            }
        });
        tests_util::assert_compile_error_kind(&schema, |kind| {
            matches!(kind, crate::ValidationErrorKind::CircularReference { .. })
        });
    }

    #[test]
    fn in_place_applicator_cycle_fails_compilation() {
        let schema = json!({
            "allOf": [{"$ref": "#"}]
        });
        tests_util::assert_compile_error_kind(&schema, |kind| {
            matches!(kind, crate::ValidationErrorKind::CircularReference { .. })
        });
    }

    #[test]
    fn unknown_reference_fails_compilation() {
        let schema = json!({"$ref": "#/$defs/missing"});
        tests_util::assert_compile_error_kind(&schema, |kind| {
            matches!(kind, crate::ValidationErrorKind::UnresolvedReference { .. })
        });
    }

    #[test]
    fn reference_to_embedded_resource_by_id() {
        let schema = json!({
            "$id": "https://example.com/root.json",
            "$ref": "item.json",
            "$defs": {
                "item": {"$id": "https://example.com/item.json", "type": "boolean"}
            }
        });
        tests_util::assert_valid(&schema, &json!(true));
        tests_util::assert_not_valid(&schema, &json!(1));
    }

    #[test]
    fn dynamic_ref_resolves_to_the_outermost_dynamic_anchor() {
        let schema = json!({
            "$id": "https://example.com/outer.json",
            "$dynamicAnchor": "node",
            "type": "object",
            "properties": {
                "inner": {"$ref": "inner.json"},
                "label": {"type": "string"}
            },
            "$defs": {
                "inner": {
                    "$id": "https://example.com/inner.json",
                    "$dynamicAnchor": "node",
                    "type": "object",
                    "properties": {
                        "next": {"$dynamicRef": "#node"}
                    }
                }
            }
        });
        // The outermost declarer of "node" is the outer schema, so `next`
        // must validate as the outer object, including its `label` rule.
        tests_util::assert_valid(&schema, &json!({"inner": {"next": {"label": "x"}}}));
        tests_util::assert_not_valid(&schema, &json!({"inner": {"next": {"label": 3}}}));
    }

    #[test]
    fn dynamic_ref_falls_back_to_plain_resolution() {
        let schema = json!({
            "$dynamicRef": "#/$defs/leaf",
            "$defs": {"leaf": {"type": "null"}}
        });
        tests_util::assert_valid(&schema, &json!(null));
        tests_util::assert_not_valid(&schema, &json!(0));
    }

    #[test]
    fn dynamic_ref_without_a_target_fails_compilation() {
        let schema = json!({"$dynamicRef": "#nowhere"});
        tests_util::assert_compile_error_kind(&schema, |kind| {
            matches!(kind, crate::ValidationErrorKind::UnresolvedReference { .. })
        });
    }

    #[test]
    fn dynamic_cycles_terminate_at_validate_time() {
        let schema = json!({
            "$dynamicAnchor": "loop",
            "allOf": [{"$dynamicRef": "#loop"}]
        });
        let validator = crate::validator_for(&schema).expect("compiles");
        // Resolving the loop on the same value must terminate with an error
        // instead of recursing forever.
        assert!(validator.validate(&json!(1)).is_err());
    }
}
