//! Lowering a schema into a validator tree.
//!
//! Compilation walks the schema once, turning each keyword group into a
//! pipeline stage. Stages for one schema object run as an `allOf` pipeline
//! unless the schema declares `unevaluatedProperties`/`unevaluatedItems`,
//! in which case the whole pipeline is owned by a coordinator that tracks
//! the accumulated annotations. References short-circuit into lazy nodes;
//! reference chains that could never terminate are rejected here.
use std::sync::Arc;

use ahash::AHashMap;
use serde_json::{Map, Value};

use crate::{
    context::ScopeEntry,
    error::ValidationError,
    options::ValidationOptions,
    paths::{JsonPointer, PathChunk},
    primitive_type::PrimitiveType,
    resolver::ResolverPool,
    uri,
    validators::{
        all_of::AllOfValidator,
        any_of::AnyOfValidator,
        array::{ArrayParts, ArrayValidator, ContainsConstraint},
        boolean::{BooleanValidator, EmptyValidator},
        content::ContentValidator,
        dependent::{DependentRequiredValidator, DependentSchemasValidator},
        format,
        helpers,
        if_::IfThenElseValidator,
        not_::NotValidator,
        null::NullValidator,
        number::NumericValidator,
        object::{ObjectParts, ObjectValidator},
        one_of::OneOfValidator,
        reference::{DynamicRefValidator, RefValidator},
        string::{compile_regex, StringValidator},
        type_::MultipleTypesValidator,
        unevaluated::{UnevaluatedBehavior, UnevaluatedCoordinator},
        untyped::{ConstValidator, EnumValidator},
        BoxedValidator, CompilationResult,
    },
    vocabulary::{Vocabulary, VocabularySet},
    Validator,
};

/// Everything a (possibly lazy) compilation needs to carry along.
#[derive(Clone, Debug)]
pub(crate) struct CompilerContext {
    pub(crate) config: Arc<ValidationOptions>,
    pub(crate) root: Arc<Value>,
    /// The schema resource whose fragment space `#...` references address.
    pub(crate) base: Arc<Value>,
    pub(crate) base_uri: String,
    pub(crate) resolver: Arc<ResolverPool>,
    pub(crate) vocabularies: Arc<VocabularySet>,
    /// Dynamic scope at this point of the schema, outermost first.
    pub(crate) scope: Vec<ScopeEntry>,
    pub(crate) location: JsonPointer,
}

impl CompilerContext {
    fn at(&self, chunk: impl Into<PathChunk>) -> Self {
        let mut ctx = self.clone();
        ctx.location = ctx.location.join(chunk);
        ctx
    }

    fn keyword_enabled(&self, keyword: &str) -> bool {
        self.vocabularies.keyword_enabled(keyword)
    }

    fn assert_formats(&self) -> bool {
        match self.config.validate_formats {
            Some(explicit) => explicit,
            None => self.vocabularies.contains(Vocabulary::FormatAssertion),
        }
    }

    /// Entering a schema with `$id` establishes a new resource: base URI,
    /// fragment space, and a dynamic scope entry.
    fn in_resource(&self, map: &Map<String, Value>) -> Self {
        if let Some(id) = map.get("$id").and_then(Value::as_str) {
            if let Some(base) = uri::resolve_against(&self.base_uri, id) {
                if base != self.base_uri {
                    let mut ctx = self.clone();
                    let resource = Arc::new(Value::Object(map.clone()));
                    ctx.base = Arc::clone(&resource);
                    ctx.scope.push(ScopeEntry {
                        schema: resource,
                        base_uri: base.clone(),
                    });
                    ctx.base_uri = base;
                    return ctx;
                }
            }
        }
        self.clone()
    }

    fn get<'m>(&self, map: &'m Map<String, Value>, keyword: &str) -> Option<&'m Value> {
        if self.keyword_enabled(keyword) {
            map.get(keyword)
        } else {
            None
        }
    }

    fn get_u64(
        &self,
        map: &Map<String, Value>,
        keyword: &'static str,
    ) -> Result<Option<u64>, ValidationError<'static>> {
        if self.keyword_enabled(keyword) {
            helpers::map_get_u64(map, &self.location, keyword)
        } else {
            Ok(None)
        }
    }
}

/// Build a [`Validator`] from a schema and options.
pub(crate) fn build(
    config: ValidationOptions,
    schema: &Value,
) -> Result<Validator, ValidationError<'static>> {
    let root = match &config.root_schema {
        Some(root) => Arc::clone(root),
        None => Arc::new(schema.clone()),
    };

    let vocabularies = match config.vocabulary_set {
        Some(set) => set,
        None => match root.get("$vocabulary") {
            Some(Value::Object(declared)) => VocabularySet::from_metaschema(declared)?,
            Some(_) => {
                return Err(ValidationError::invalid_schema(
                    JsonPointer::default().join("$vocabulary"),
                    "\"$vocabulary\" must be an object",
                ))
            }
            None => VocabularySet::default(),
        },
    };

    let initial_base = config
        .base_uri
        .clone()
        .unwrap_or_else(|| uri::DEFAULT_BASE.to_string());
    let base_uri = match root.get("$id").and_then(Value::as_str) {
        Some(id) => uri::resolve_against(&initial_base, id).ok_or_else(|| {
            ValidationError::invalid_schema(
                JsonPointer::default().join("$id"),
                "\"$id\" is not a valid URI",
            )
        })?,
        None => initial_base,
    };

    let resolver = Arc::new(ResolverPool::new(
        Arc::clone(&root),
        &base_uri,
        &config.resources,
        config.resolver.clone(),
    ));

    let config = Arc::new(config);
    let vocabularies = Arc::new(vocabularies);
    let scope = vec![ScopeEntry {
        schema: Arc::clone(&root),
        base_uri: base_uri.clone(),
    }];
    let ctx = CompilerContext {
        config: Arc::clone(&config),
        root: Arc::clone(&root),
        base: Arc::clone(&root),
        base_uri,
        resolver: Arc::clone(&resolver),
        vocabularies: Arc::clone(&vocabularies),
        scope: scope.clone(),
        location: JsonPointer::default(),
    };
    let node = compile(&ctx, schema)?;
    Ok(Validator {
        node,
        config,
        resolver,
        root,
        vocabularies,
        scope,
    })
}

/// Compile one schema (boolean or object) into a validator node.
pub(crate) fn compile(ctx: &CompilerContext, schema: &Value) -> CompilationResult {
    match schema {
        Value::Bool(true) => EmptyValidator::compile(),
        Value::Bool(false) => Ok(Box::new(NotValidator::new(
            ctx.location.clone(),
            Box::new(EmptyValidator),
        ))),
        Value::Object(map) => {
            let ctx = ctx.in_resource(map);
            compile_object(&ctx, map)
        }
        _ => Err(ValidationError::invalid_schema(
            ctx.location.clone(),
            "a schema must be an object or a boolean",
        )),
    }
}

fn compile_object(ctx: &CompilerContext, map: &Map<String, Value>) -> CompilationResult {
    let mut stages: Vec<BoxedValidator> = Vec::new();

    // References first: their annotations feed the rest of the pipeline.
    if let Some(value) = ctx.get(map, "$ref") {
        let reference = value.as_str().ok_or_else(|| {
            ValidationError::invalid_schema(
                ctx.location.join("$ref"),
                "\"$ref\" must be a string",
            )
        })?;
        stages.push(RefValidator::compile(&ctx.at("$ref"), reference)?);
    }
    if let Some(value) = ctx.get(map, "$dynamicRef") {
        let reference = value.as_str().ok_or_else(|| {
            ValidationError::invalid_schema(
                ctx.location.join("$dynamicRef"),
                "\"$dynamicRef\" must be a string",
            )
        })?;
        stages.push(DynamicRefValidator::compile(
            &ctx.at("$dynamicRef"),
            reference,
        )?);
    }

    for (keyword, build) in [
        ("allOf", Combinator::All),
        ("anyOf", Combinator::Any),
        ("oneOf", Combinator::One),
    ] {
        if let Some(value) = ctx.get(map, keyword) {
            let Value::Array(items) = value else {
                return Err(ValidationError::invalid_schema(
                    ctx.location.join(keyword),
                    format!("\"{keyword}\" must be an array of schemas"),
                ));
            };
            let keyword_ctx = ctx.at(keyword);
            let mut children = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                children.push(compile(&keyword_ctx.at(index), item)?);
            }
            let stage: BoxedValidator = match build {
                Combinator::All => Box::new(AllOfValidator::new(children)),
                Combinator::Any => Box::new(AnyOfValidator::new(ctx.location.clone(), children)),
                Combinator::One => Box::new(OneOfValidator::new(ctx.location.clone(), children)),
            };
            stages.push(stage);
        }
    }

    if let Some(value) = ctx.get(map, "not") {
        let child = compile(&ctx.at("not"), value)?;
        stages.push(Box::new(NotValidator::new(ctx.location.clone(), child)));
    }
    if let Some(value) = ctx.get(map, "if") {
        let condition = compile(&ctx.at("if"), value)?;
        let then_branch = match ctx.get(map, "then") {
            Some(value) => Some(compile(&ctx.at("then"), value)?),
            None => None,
        };
        let else_branch = match ctx.get(map, "else") {
            Some(value) => Some(compile(&ctx.at("else"), value)?),
            None => None,
        };
        stages.push(Box::new(IfThenElseValidator::new(
            condition,
            then_branch,
            else_branch,
        )));
    }

    compile_base(ctx, map, &mut stages)?;

    if ctx.vocabularies.contains(Vocabulary::Content)
        && (map.contains_key("contentEncoding")
            || map.contains_key("contentMediaType")
            || map.contains_key("contentSchema"))
    {
        let content_schema = match map.get("contentSchema") {
            Some(value) if map.contains_key("contentMediaType") => {
                Some(compile(&ctx.at("contentSchema"), value)?)
            }
            _ => None,
        };
        stages.push(ContentValidator::compile(
            ctx.location.clone(),
            map,
            content_schema,
            ctx.config.assert_content,
        )?);
    }

    if let Some(value) = ctx.get(map, "enum") {
        stages.push(EnumValidator::compile(ctx.location.clone(), value)?);
    }
    if let Some(value) = ctx.get(map, "const") {
        stages.push(ConstValidator::compile(ctx.location.clone(), value)?);
    }

    if let Some(value) = ctx.get(map, "dependentSchemas") {
        let Value::Object(dependents) = value else {
            return Err(ValidationError::invalid_schema(
                ctx.location.join("dependentSchemas"),
                "\"dependentSchemas\" must be an object",
            ));
        };
        let keyword_ctx = ctx.at("dependentSchemas");
        let mut compiled = Vec::with_capacity(dependents.len());
        for (trigger, subschema) in dependents {
            compiled.push((
                trigger.clone(),
                compile(&keyword_ctx.at(trigger.clone()), subschema)?,
            ));
        }
        stages.push(Box::new(DependentSchemasValidator::new(compiled)));
    }
    if let Some(value) = ctx.get(map, "dependentRequired") {
        let Value::Object(dependents) = value else {
            return Err(ValidationError::invalid_schema(
                ctx.location.join("dependentRequired"),
                "\"dependentRequired\" must be an object",
            ));
        };
        let mut compiled = Vec::with_capacity(dependents.len());
        for (trigger, required) in dependents {
            compiled.push((
                trigger.clone(),
                string_array(ctx, required, "dependentRequired")?,
            ));
        }
        stages.push(Box::new(DependentRequiredValidator::new(
            ctx.location.clone(),
            compiled,
        )));
    }

    let unevaluated_properties = match ctx.get(map, "unevaluatedProperties") {
        Some(value) => Some(behavior(&ctx.at("unevaluatedProperties"), value)?),
        None => None,
    };
    let unevaluated_items = match ctx.get(map, "unevaluatedItems") {
        Some(value) => Some(behavior(&ctx.at("unevaluatedItems"), value)?),
        None => None,
    };
    if unevaluated_properties.is_some() || unevaluated_items.is_some() {
        return Ok(Box::new(UnevaluatedCoordinator::new(
            ctx.location.clone(),
            stages,
            unevaluated_properties,
            unevaluated_items,
        )));
    }

    // Collapse trivial pipelines.
    match stages.len() {
        0 => EmptyValidator::compile(),
        1 => Ok(stages.pop().expect("one stage")),
        _ => Ok(Box::new(AllOfValidator::new(stages))),
    }
}

enum Combinator {
    All,
    Any,
    One,
}

fn behavior(
    ctx: &CompilerContext,
    value: &Value,
) -> Result<UnevaluatedBehavior, ValidationError<'static>> {
    Ok(match value {
        Value::Bool(false) => UnevaluatedBehavior::Forbid,
        Value::Bool(true) => UnevaluatedBehavior::AllowAll,
        _ => UnevaluatedBehavior::Schema(compile(ctx, value)?),
    })
}

const STRING_KEYWORDS: &[&str] = &["minLength", "maxLength", "pattern", "format"];
const NUMBER_KEYWORDS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
];
const ARRAY_KEYWORDS: &[&str] = &[
    "minItems",
    "maxItems",
    "uniqueItems",
    "prefixItems",
    "items",
    "additionalItems",
    "contains",
    "minContains",
    "maxContains",
];
const OBJECT_KEYWORDS: &[&str] = &[
    "minProperties",
    "maxProperties",
    "required",
    "properties",
    "patternProperties",
    "additionalProperties",
    "propertyNames",
];

fn group_present(ctx: &CompilerContext, map: &Map<String, Value>, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|keyword| ctx.get(map, keyword).is_some())
}

/// Type-dispatched base constraints. A single declared type folds into one
/// strict leaf; a type list gets a membership check plus non-strict leaves;
/// without `type`, keyword presence decides which non-strict leaves exist.
fn compile_base(
    ctx: &CompilerContext,
    map: &Map<String, Value>,
    stages: &mut Vec<BoxedValidator>,
) -> Result<(), ValidationError<'static>> {
    let mut strict_type = None;
    match ctx.get(map, "type") {
        Some(Value::String(name)) => {
            let primitive_type = PrimitiveType::try_from(name.as_str()).map_err(|()| {
                ValidationError::invalid_schema(
                    ctx.location.join("type"),
                    format!("\"{name}\" is not a JSON type"),
                )
            })?;
            strict_type = Some(primitive_type);
        }
        Some(Value::Array(items)) => {
            stages.push(MultipleTypesValidator::compile(
                ctx.location.clone(),
                items,
            )?);
        }
        Some(_) => {
            return Err(ValidationError::invalid_schema(
                ctx.location.join("type"),
                "\"type\" must be a string or an array of strings",
            ))
        }
        None => {}
    }

    let string_strict = strict_type == Some(PrimitiveType::String);
    if string_strict || group_present(ctx, map, STRING_KEYWORDS) {
        stages.push(compile_string_leaf(ctx, map, string_strict)?);
    }
    let number_strict = matches!(
        strict_type,
        Some(PrimitiveType::Number | PrimitiveType::Integer)
    );
    if number_strict || group_present(ctx, map, NUMBER_KEYWORDS) {
        stages.push(NumericValidator::compile(
            ctx.location.clone(),
            map,
            number_strict,
            strict_type == Some(PrimitiveType::Integer),
        )?);
    }
    let array_strict = strict_type == Some(PrimitiveType::Array);
    if array_strict || group_present(ctx, map, ARRAY_KEYWORDS) {
        stages.push(compile_array_leaf(ctx, map, array_strict)?);
    }
    let object_strict = strict_type == Some(PrimitiveType::Object);
    if object_strict || group_present(ctx, map, OBJECT_KEYWORDS) {
        stages.push(compile_object_leaf(ctx, map, object_strict)?);
    }
    match strict_type {
        Some(PrimitiveType::Boolean) => {
            stages.push(BooleanValidator::compile(ctx.location.clone())?);
        }
        Some(PrimitiveType::Null) => {
            stages.push(NullValidator::compile(ctx.location.clone())?);
        }
        _ => {}
    }
    Ok(())
}

fn compile_string_leaf(
    ctx: &CompilerContext,
    map: &Map<String, Value>,
    strict: bool,
) -> CompilationResult {
    let format = if ctx.keyword_enabled("format") && ctx.assert_formats() {
        format::compile(&ctx.location, map, &ctx.config.formats)?
    } else {
        None
    };
    StringValidator::compile(ctx.location.clone(), map, strict, format)
}

fn compile_array_leaf(
    ctx: &CompilerContext,
    map: &Map<String, Value>,
    strict: bool,
) -> CompilationResult {
    let prefix_items = match ctx.get(map, "prefixItems") {
        Some(Value::Array(items)) => {
            let keyword_ctx = ctx.at("prefixItems");
            let mut compiled = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                compiled.push(compile(&keyword_ctx.at(index), item)?);
            }
            compiled
        }
        Some(_) => {
            return Err(ValidationError::invalid_schema(
                ctx.location.join("prefixItems"),
                "\"prefixItems\" must be an array of schemas",
            ))
        }
        None => Vec::new(),
    };
    let items = match ctx.get(map, "items") {
        Some(value) => Some(compile(&ctx.at("items"), value)?),
        None => None,
    };
    let additional_items = match ctx.get(map, "additionalItems") {
        // `additionalItems` is overridden by `items`.
        Some(value) if items.is_none() => Some(compile(&ctx.at("additionalItems"), value)?),
        _ => None,
    };
    let contains = match ctx.get(map, "contains") {
        Some(value) => {
            let node = compile(&ctx.at("contains"), value)?;
            Some(ContainsConstraint {
                node,
                min: ctx.get_u64(map, "minContains")?.unwrap_or(1),
                max: ctx.get_u64(map, "maxContains")?,
            })
        }
        // Without `contains`, the counting keywords are inert.
        None => None,
    };
    let unique_items = match ctx.get(map, "uniqueItems") {
        Some(Value::Bool(unique)) => *unique,
        Some(_) => {
            return Err(ValidationError::invalid_schema(
                ctx.location.join("uniqueItems"),
                "\"uniqueItems\" must be a boolean",
            ))
        }
        None => false,
    };
    Ok(Box::new(ArrayValidator::new(
        ctx.location.clone(),
        strict,
        ArrayParts {
            min_items: ctx.get_u64(map, "minItems")?,
            max_items: ctx.get_u64(map, "maxItems")?,
            unique_items,
            prefix_items,
            items,
            additional_items,
            contains,
        },
    )))
}

fn compile_object_leaf(
    ctx: &CompilerContext,
    map: &Map<String, Value>,
    strict: bool,
) -> CompilationResult {
    let mut properties = AHashMap::new();
    if let Some(value) = ctx.get(map, "properties") {
        let Value::Object(entries) = value else {
            return Err(ValidationError::invalid_schema(
                ctx.location.join("properties"),
                "\"properties\" must be an object",
            ));
        };
        let keyword_ctx = ctx.at("properties");
        for (key, subschema) in entries {
            properties.insert(key.clone(), compile(&keyword_ctx.at(key.clone()), subschema)?);
        }
    }
    let mut pattern_properties = Vec::new();
    if let Some(value) = ctx.get(map, "patternProperties") {
        let Value::Object(entries) = value else {
            return Err(ValidationError::invalid_schema(
                ctx.location.join("patternProperties"),
                "\"patternProperties\" must be an object",
            ));
        };
        let keyword_ctx = ctx.at("patternProperties");
        for (pattern, subschema) in entries {
            let regex = compile_regex(keyword_ctx.location.join(pattern.clone()), pattern)?;
            pattern_properties.push((
                pattern.clone(),
                regex,
                compile(&keyword_ctx.at(pattern.clone()), subschema)?,
            ));
        }
    }
    let additional_properties = match ctx.get(map, "additionalProperties") {
        Some(value) => Some(compile(&ctx.at("additionalProperties"), value)?),
        None => None,
    };
    let property_names = match ctx.get(map, "propertyNames") {
        Some(value) => Some(compile(&ctx.at("propertyNames"), value)?),
        None => None,
    };
    let required = match ctx.get(map, "required") {
        Some(value) => string_array(ctx, value, "required")?,
        None => Vec::new(),
    };
    Ok(Box::new(ObjectValidator::new(
        ctx.location.clone(),
        strict,
        ObjectParts {
            min_properties: ctx.get_u64(map, "minProperties")?,
            max_properties: ctx.get_u64(map, "maxProperties")?,
            required,
            properties,
            pattern_properties,
            additional_properties,
            property_names,
        },
    )))
}

fn string_array(
    ctx: &CompilerContext,
    value: &Value,
    keyword: &'static str,
) -> Result<Vec<String>, ValidationError<'static>> {
    let Value::Array(items) = value else {
        return Err(ValidationError::invalid_schema(
            ctx.location.join(keyword),
            format!("\"{keyword}\" must be an array of strings"),
        ));
    };
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ValidationError::invalid_schema(
                    ctx.location.join(keyword),
                    format!("\"{keyword}\" must be an array of strings"),
                )
            })
        })
        .collect()
}
