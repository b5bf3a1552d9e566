//! Reference resolution against the root schema and registered resources.
//!
//! Resolution is split between a registry of addressable documents
//! ([`ResolverPool`]) and stateless workers ([`SchemaResolver`]) that are
//! acquired from the pool, used for one resolution, and released. A custom
//! [`ReferenceResolver`] can be installed through the options to supply
//! documents the registry does not know, e.g. fetched from disk or network.
use std::{error::Error, fmt, sync::Arc, sync::Mutex};

use ahash::AHashMap;
use serde_json::Value;

use crate::uri;

/// Why a reference could not be resolved.
#[derive(Debug)]
pub enum ResolveError {
    /// The target document or location does not exist.
    NotFound {
        /// The reference as written in the schema.
        reference: String,
    },
    /// The fragment is not a valid JSON pointer.
    InvalidPointer {
        /// The offending fragment.
        pointer: String,
    },
    /// An external resolver failed to produce a document.
    FetchFailed {
        /// The reference being retrieved.
        reference: String,
        /// Underlying failure.
        source: Box<dyn Error + Send + Sync>,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound { reference } => {
                write!(f, "\"{reference}\" cannot be resolved")
            }
            ResolveError::InvalidPointer { pointer } => {
                write!(f, "\"{pointer}\" is not a valid JSON pointer")
            }
            ResolveError::FetchFailed { reference, source } => {
                write!(f, "failed to retrieve \"{reference}\": {source}")
            }
        }
    }
}

impl Error for ResolveError {}

/// Resolves absolute URIs to schema documents.
///
/// The engine consults the installed resolver only after the registry of
/// known resources (the root schema, embedded `$id` resources, and resources
/// added through the options) has been exhausted.
pub trait ReferenceResolver: Send + Sync {
    /// Produce the document identified by `uri` (no fragment).
    fn resolve(&self, uri: &str) -> Result<Arc<Value>, ResolveError>;
}

/// A successfully resolved reference.
#[derive(Clone, Debug)]
pub(crate) struct Resolution {
    /// The target schema.
    pub(crate) schema: Arc<Value>,
    /// Base URI in effect at the target.
    pub(crate) base_uri: String,
    /// The resource document containing the target.
    pub(crate) resource: Arc<Value>,
}

/// Registry of addressable schema documents plus a pool of resolver workers.
pub(crate) struct ResolverPool {
    documents: AHashMap<String, Arc<Value>>,
    external: Option<Arc<dyn ReferenceResolver>>,
    idle: Mutex<Vec<SchemaResolver>>,
}

impl fmt::Debug for ResolverPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverPool")
            .field("documents", &self.documents.keys().collect::<Vec<_>>())
            .field("external", &self.external.is_some())
            .finish()
    }
}

impl ResolverPool {
    pub(crate) fn new(
        root: Arc<Value>,
        root_base: &str,
        extra: &AHashMap<String, Arc<Value>>,
        external: Option<Arc<dyn ReferenceResolver>>,
    ) -> Self {
        let mut documents = AHashMap::with_capacity(extra.len() + 2);
        documents.insert(uri::split_fragment(root_base).0.to_string(), Arc::clone(&root));
        register_embedded_resources(&root, root_base, &mut documents);
        for (uri, document) in extra {
            if let Some(resolved) = uri::resolve_against(uri::DEFAULT_BASE, uri) {
                documents.insert(
                    uri::split_fragment(&resolved).0.to_string(),
                    Arc::clone(document),
                );
            }
            documents.insert(uri::split_fragment(uri).0.to_string(), Arc::clone(document));
            register_embedded_resources(document, uri, &mut documents);
        }
        ResolverPool {
            documents,
            external,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn acquire(&self) -> SchemaResolver {
        self.idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop())
            .unwrap_or_default()
    }

    pub(crate) fn release(&self, resolver: SchemaResolver) {
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(resolver);
        }
    }

    fn document(&self, uri: &str) -> Result<Arc<Value>, ResolveError> {
        if let Some(document) = self.documents.get(uri) {
            return Ok(Arc::clone(document));
        }
        if let Some(external) = &self.external {
            return external.resolve(uri);
        }
        Err(ResolveError::NotFound {
            reference: uri.to_string(),
        })
    }
}

/// A stateless resolution worker.
#[derive(Debug, Default)]
pub(crate) struct SchemaResolver;

impl SchemaResolver {
    /// Resolve `reference` against the given base URI and base resource.
    pub(crate) fn resolve_reference(
        &self,
        pool: &ResolverPool,
        base_uri: &str,
        base_resource: &Arc<Value>,
        reference: &str,
    ) -> Result<Resolution, ResolveError> {
        // Fragment-only references stay within the current resource.
        if let Some(fragment) = reference.strip_prefix('#') {
            let mut resolution =
                self.resolve_in_resource(base_uri, base_resource, reference, fragment)?;
            rebase_on_id(&mut resolution);
            return Ok(resolution);
        }
        let resolved =
            uri::resolve_against(base_uri, reference).ok_or_else(|| ResolveError::NotFound {
                reference: reference.to_string(),
            })?;
        let (document_uri, fragment) = uri::split_fragment(&resolved);
        let document = pool.document(document_uri)?;
        let mut resolution = self.resolve_in_resource(
            document_uri,
            &document,
            reference,
            fragment.unwrap_or(""),
        )?;
        rebase_on_id(&mut resolution);
        Ok(resolution)
    }

    /// Resolve a plain-name `$anchor` within a resource.
    pub(crate) fn resolve_anchor(
        &self,
        base_uri: &str,
        resource: &Arc<Value>,
        anchor: &str,
    ) -> Result<Resolution, ResolveError> {
        find_anchor(resource, anchor)
            .map(|schema| Resolution {
                schema: Arc::new(schema.clone()),
                base_uri: base_uri.to_string(),
                resource: Arc::clone(resource),
            })
            .ok_or_else(|| ResolveError::NotFound {
                reference: format!("#{anchor}"),
            })
    }

    fn resolve_in_resource(
        &self,
        base_uri: &str,
        resource: &Arc<Value>,
        reference: &str,
        fragment: &str,
    ) -> Result<Resolution, ResolveError> {
        if uri::is_pointer_fragment(fragment) {
            let tokens =
                uri::pointer_tokens(fragment).ok_or_else(|| ResolveError::InvalidPointer {
                    pointer: fragment.to_string(),
                })?;
            let schema = uri::lookup_pointer(resource, &tokens).ok_or_else(|| {
                ResolveError::NotFound {
                    reference: reference.to_string(),
                }
            })?;
            Ok(Resolution {
                schema: Arc::new(schema.clone()),
                base_uri: base_uri.to_string(),
                resource: Arc::clone(resource),
            })
        } else {
            self.resolve_anchor(base_uri, resource, fragment)
        }
    }
}

/// A target carrying its own `$id` establishes a new base, and its
/// fragment space becomes the one `#...` references inside it address.
fn rebase_on_id(resolution: &mut Resolution) {
    if let Some(id) = resolution.schema.get("$id").and_then(Value::as_str) {
        if let Some(base) = uri::resolve_against(&resolution.base_uri, id) {
            if base != resolution.base_uri {
                resolution.base_uri = base;
                resolution.resource = Arc::clone(&resolution.schema);
            }
        }
    }
}

/// Register every embedded resource (subschema with `$id`) of `document`
/// under its resolved URI.
fn register_embedded_resources(
    document: &Arc<Value>,
    base_uri: &str,
    documents: &mut AHashMap<String, Arc<Value>>,
) {
    fn walk(value: &Value, base_uri: &str, documents: &mut AHashMap<String, Arc<Value>>) {
        match value {
            Value::Object(map) => {
                let mut base = base_uri.to_string();
                if let Some(id) = map.get("$id").and_then(Value::as_str) {
                    if let Some(resolved) = uri::resolve_against(base_uri, id) {
                        let document_uri = uri::split_fragment(&resolved).0.to_string();
                        documents
                            .entry(document_uri)
                            .or_insert_with(|| Arc::new(value.clone()));
                        base = resolved;
                    }
                }
                for nested in map.values() {
                    walk(nested, &base, documents);
                }
            }
            Value::Array(items) => {
                for item in items {
                    walk(item, base_uri, documents);
                }
            }
            _ => {}
        }
    }
    walk(document, base_uri, documents);
}

/// Find the subschema declaring `name` as an anchor within a resource,
/// without crossing into embedded resources. `$dynamicAnchor` also registers
/// a plain anchor, so both keywords match here.
pub(crate) fn find_anchor<'v>(resource: &'v Value, name: &str) -> Option<&'v Value> {
    find_by_anchor_keywords(resource, &["$anchor", "$dynamicAnchor"], name, true)
}

/// Find the subschema declaring `"$dynamicAnchor": name` within a resource,
/// without crossing into embedded resources.
pub(crate) fn find_dynamic_anchor<'v>(resource: &'v Value, name: &str) -> Option<&'v Value> {
    find_by_anchor_keywords(resource, &["$dynamicAnchor"], name, true)
}

fn find_by_anchor_keywords<'v>(
    value: &'v Value,
    keywords: &[&str],
    name: &str,
    is_resource_root: bool,
) -> Option<&'v Value> {
    match value {
        Value::Object(map) => {
            if !is_resource_root && map.contains_key("$id") {
                return None;
            }
            if keywords
                .iter()
                .any(|keyword| map.get(*keyword).and_then(Value::as_str) == Some(name))
            {
                return Some(value);
            }
            map.values()
                .find_map(|nested| find_by_anchor_keywords(nested, keywords, name, false))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| find_by_anchor_keywords(item, keywords, name, false)),
        _ => None,
    }
}
