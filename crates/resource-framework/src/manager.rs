//! # Schema Manager
//!
//! The kind graph: every registered kind with its parents, children, handler
//! capabilities, action table and field tree, grouped by [`ApiVersion`].
//!
//! ## Phases
//!
//! 1. **Registration**: [`SchemaManager::register`] takes `&mut self`. A kind can only
//!    name parents that are already registered, so the graph is acyclic by construction.
//! 2. **Finalize**: [`SchemaManager::finalize`] flips a phase flag; later registrations
//!    fail with [`SchemaError::Finalized`].
//! 3. **Serving**: the manager is shared as `Arc<SchemaManager>` and only read. Route
//!    generation, path parsing, request decoding and link generation all take `&self`,
//!    so concurrent requests need no locking.
//!
//! ## Paths
//!
//! ```text
//! /apis/{group}/{version}/{collection}/{id}/.../{collection}[/{id}][?action={name}]
//! ```
//!
//! Collections are matched by plural name, starting from the root kinds and then
//! following the children of the kind matched one level up.

use crate::context::ApiRequest;
use crate::error::{ApiError, ErrorCode, SchemaError};
use crate::field::{FieldTree, FieldTreeBuilder};
use crate::handler::{collection_methods, resource_methods, Capabilities, HttpMethod, ResourceHandler};
use crate::kind::{ActionDef, ApiVersion, ResourceKind};
use crate::resource::{Action, LinkType, Resource, ResourceCollection, ResourceObject, ResourceRef};
use crate::route::{ResourceRoute, RoutePattern, Segment};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

type Normalizer = fn(Value) -> Result<Value, serde_json::Error>;
type ObjectDecoder = fn(Value) -> Result<Box<dyn ResourceObject>, serde_json::Error>;
type Kinds = BTreeMap<String, KindSchema>;

/// Round-trips a payload through the typed kind so every field is present.
fn normalize<K: ResourceKind>(value: Value) -> Result<Value, serde_json::Error> {
    let typed: K = serde_json::from_value(value)?;
    serde_json::to_value(typed)
}

fn decode_object<K: ResourceKind>(value: Value) -> Result<Box<dyn ResourceObject>, serde_json::Error> {
    let typed: K = serde_json::from_value(value)?;
    Ok(Box::new(typed))
}

struct KindSchema {
    kind: String,
    plural: String,
    parents: Vec<String>,
    children: Vec<String>,
    actions: Vec<ActionDef>,
    handler: Arc<dyn ResourceHandler>,
    capabilities: Capabilities,
    fields: Option<Arc<FieldTree>>,
    default_value: Option<Value>,
    normalize: Normalizer,
    decode: ObjectDecoder,
}

impl KindSchema {
    fn action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.name() == name)
    }

    fn shares_level_with(&self, parents: &[String]) -> Option<String> {
        if self.parents.is_empty() && parents.is_empty() {
            return Some("root".to_string());
        }
        self.parents.iter().find(|p| parents.contains(p)).cloned()
    }
}

/// Result of matching a request path against the kind graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub version: ApiVersion,
    pub kind: String,
    /// `None` when the path ends at a collection.
    pub id: Option<String>,
    /// Matched parents, root first.
    pub ancestors: Vec<ResourceRef>,
}

impl ParsedPath {
    pub fn is_collection(&self) -> bool {
        self.id.is_none()
    }

    pub fn parent(&self) -> Option<&ResourceRef> {
        self.ancestors.last()
    }
}

#[derive(Default)]
pub struct SchemaManager {
    versions: BTreeMap<ApiVersion, Kinds>,
    builder: FieldTreeBuilder,
    finalized: bool,
}

impl SchemaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `K` under `version`, served by `handler`.
    ///
    /// Fails if the manager is finalized, the handler supports nothing, the kind is
    /// already known, a parent is unknown, a sibling already uses the collection name,
    /// an action is declared twice, or the kind's fields do not build.
    pub fn register<K: ResourceKind>(
        &mut self,
        version: &ApiVersion,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<(), SchemaError> {
        let kind = K::kind_name();
        if self.finalized {
            return Err(SchemaError::Finalized(kind));
        }
        let capabilities = handler.capabilities();
        if capabilities.is_empty() {
            return Err(SchemaError::NoCapabilities(kind));
        }

        let plural = K::plural_name();
        let parents = K::parents();
        let existing = self.versions.get(version);
        if existing.is_some_and(|kinds| kinds.contains_key(&kind)) {
            return Err(SchemaError::DuplicateKind {
                kind,
                version: version.to_string(),
            });
        }
        for parent in &parents {
            if !existing.is_some_and(|kinds| kinds.contains_key(parent)) {
                return Err(SchemaError::UnknownParent {
                    kind,
                    parent: parent.clone(),
                });
            }
        }
        if let Some(kinds) = existing {
            let clash = kinds
                .values()
                .filter(|other| other.plural == plural)
                .find_map(|other| other.shares_level_with(&parents));
            if let Some(parent) = clash {
                return Err(SchemaError::DuplicateCollection {
                    collection: plural,
                    parent,
                });
            }
        }

        let actions = K::actions();
        let mut seen = HashSet::new();
        for action in &actions {
            if !seen.insert(action.name()) {
                return Err(SchemaError::DuplicateAction {
                    kind,
                    action: action.name().to_string(),
                });
            }
        }

        let fields = self.builder.build(&K::describe())?;
        let default_value = K::default_resource()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| SchemaError::DefaultResource {
                kind: kind.clone(),
                reason: e.to_string(),
            })?;

        let kinds = self.versions.entry(version.clone()).or_default();
        for parent in &parents {
            if let Some(schema) = kinds.get_mut(parent) {
                schema.children.push(kind.clone());
            }
        }
        info!(kind = %kind, version = %version, ?parents, ?capabilities, "Kind registered");
        kinds.insert(
            kind.clone(),
            KindSchema {
                kind,
                plural,
                parents,
                children: Vec::new(),
                actions,
                handler,
                capabilities,
                fields,
                default_value,
                normalize: normalize::<K>,
                decode: decode_object::<K>,
            },
        );
        Ok(())
    }

    /// Ends the registration phase.
    pub fn finalize(&mut self) {
        self.finalized = true;
        let kinds: usize = self.versions.values().map(|k| k.len()).sum();
        info!(versions = self.versions.len(), kinds, "Schema manager finalized");
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn versions(&self) -> impl Iterator<Item = &ApiVersion> {
        self.versions.keys()
    }

    pub fn kind_names(&self, version: &ApiVersion) -> Vec<&str> {
        self.versions
            .get(version)
            .map(|kinds| kinds.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn handler(&self, version: &ApiVersion, kind: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.schema(version, kind).map(|s| s.handler.clone())
    }

    pub fn capabilities(&self, version: &ApiVersion, kind: &str) -> Option<Capabilities> {
        self.schema(version, kind).map(|s| s.capabilities)
    }

    pub fn field_tree(&self, version: &ApiVersion, kind: &str) -> Option<Arc<FieldTree>> {
        self.schema(version, kind).and_then(|s| s.fields.clone())
    }

    fn schema(&self, version: &ApiVersion, kind: &str) -> Option<&KindSchema> {
        self.versions.get(version).and_then(|kinds| kinds.get(kind))
    }

    fn kinds(&self, version: &ApiVersion) -> Result<&Kinds, ApiError> {
        self.versions
            .get(version)
            .ok_or_else(|| ApiError::not_found(format!("unknown api version {}", version)))
    }

    /// Every route of every kind, collection patterns bound to the collection verbs
    /// and instance patterns to the instance verbs the handler supports.
    pub fn generate_routes(&self) -> ResourceRoute {
        let mut route = ResourceRoute::new();
        for (version, kinds) in &self.versions {
            for schema in kinds.values() {
                for chain in ancestor_chains(kinds, schema) {
                    let mut pattern = RoutePattern::new(version.prefix());
                    for ancestor in chain {
                        pattern.push(Segment::Collection(ancestor.plural.clone()));
                        pattern.push(Segment::Id(ancestor.kind.clone()));
                    }
                    pattern.push(Segment::Collection(schema.plural.clone()));
                    for method in collection_methods(schema.capabilities) {
                        route.add(method, &pattern);
                    }
                    pattern.push(Segment::Id(schema.kind.clone()));
                    for method in resource_methods(schema.capabilities) {
                        route.add(method, &pattern);
                    }
                }
            }
        }
        route
    }

    /// Matches `path` against the registered versions and collections.
    pub fn parse_path(&self, path: &str) -> Result<ParsedPath, ApiError> {
        debug!(path, "Parsing path");
        let path = path.split('?').next().unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);
        let (version, kinds, rest) = self
            .versions
            .iter()
            .find_map(|(version, kinds)| {
                let prefix = version.prefix();
                let rest = path.strip_prefix(prefix.as_str())?;
                (rest.is_empty() || rest.starts_with('/')).then_some((version, kinds, rest))
            })
            .ok_or_else(|| ApiError::not_found(format!("no api version serves {}", path)))?;

        let segments: Vec<&str> = match rest.strip_prefix('/') {
            Some(rest) => rest.split('/').collect(),
            None => Vec::new(),
        };
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ApiError::not_found(format!("empty segment in {}", path)));
        }
        let mut ancestors = Vec::new();
        let mut parent: Option<&KindSchema> = None;
        let mut chunks = segments.chunks(2).peekable();
        while let Some(chunk) = chunks.next() {
            let collection = chunk[0];
            let schema = match parent {
                None => kinds
                    .values()
                    .find(|k| k.parents.is_empty() && k.plural == collection),
                Some(parent) => parent
                    .children
                    .iter()
                    .filter_map(|child| kinds.get(child))
                    .find(|k| k.plural == collection),
            }
            .ok_or_else(|| ApiError::not_found(format!("unknown collection {}", collection)))?;
            let id = chunk.get(1).map(|id| id.to_string());

            if chunks.peek().is_some() {
                ancestors.push(ResourceRef::new(schema.kind.clone(), id.unwrap_or_default()));
                parent = Some(schema);
                continue;
            }

            let served = match id {
                None => Capabilities::COLLECTION,
                Some(_) => Capabilities::INSTANCE,
            };
            if !schema.capabilities.intersects(served) {
                return Err(ApiError::not_found(format!(
                    "{} is not served at {}",
                    schema.kind, path
                )));
            }
            return Ok(ParsedPath {
                version: version.clone(),
                kind: schema.kind.clone(),
                id,
                ancestors,
            });
        }

        Err(ApiError::not_found(format!("no collection in {}", path)))
    }

    /// Builds the request's resource: identity and parents from the path, then either
    /// the resolved action or, for create and update, the decoded body.
    ///
    /// The body is overlaid on the kind's default resource, round-tripped through the
    /// typed kind, defaulted and validated before the typed object is attached.
    pub fn create_resource_from_request(&self, req: &ApiRequest) -> Result<Resource, ApiError> {
        let parsed = self.parse_path(&req.path)?;
        let schema = self
            .schema(&parsed.version, &parsed.kind)
            .ok_or_else(|| ApiError::not_found(format!("unknown kind {}", parsed.kind)))?;
        let is_collection = parsed.is_collection();
        let mut resource = Resource::new(parsed.kind, parsed.id.unwrap_or_default())
            .with_ancestors(parsed.ancestors);
        resource.version = parsed.version;

        if let Some(name) = &req.action {
            if req.method != HttpMethod::Post || is_collection {
                return Err(ApiError::new(
                    ErrorCode::InvalidAction,
                    format!("action {} must be posted to a {} instance", name, schema.kind),
                ));
            }
            let def = schema.action(name).ok_or_else(|| {
                ApiError::new(
                    ErrorCode::InvalidAction,
                    format!("unknown action {} for {}", name, schema.kind),
                )
            })?;
            let body = if req.body.is_empty() {
                Value::Object(Map::new())
            } else {
                serde_json::from_slice(&req.body)?
            };
            resource.action = Some(Action {
                name: name.clone(),
                input: def.decode(&body)?,
            });
            return Ok(resource);
        }

        match (req.method, is_collection) {
            (HttpMethod::Post, true) | (HttpMethod::Put, false) => {
                let object = self.decode_body(schema, &req.body)?;
                resource.set_boxed_object(object);
            }
            (HttpMethod::Post, false) => {
                return Err(ApiError::new(
                    ErrorCode::InvalidAction,
                    format!("post to a {} instance needs an action", schema.kind),
                ));
            }
            _ => {}
        }
        Ok(resource)
    }

    fn decode_body(&self, schema: &KindSchema, body: &[u8]) -> Result<Box<dyn ResourceObject>, ApiError> {
        if body.is_empty() {
            return Err(ApiError::invalid_format("request body is empty"));
        }
        let raw: Value = serde_json::from_slice(body)?;
        if !raw.is_object() {
            return Err(ApiError::invalid_format("request body must be a JSON object"));
        }
        if let Some(tree) = &schema.fields {
            tree.check_required(&raw)?;
        }

        let mut merged = schema
            .default_value
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()));
        merge(&mut merged, &raw);
        let mut value = (schema.normalize)(merged)?;
        if let Some(tree) = &schema.fields {
            tree.fill_default_value(&mut value, &raw);
            tree.validate_value(&value, &raw)?;
        }
        Ok((schema.decode)(value)?)
    }

    fn collection_url(
        &self,
        base_url: &str,
        version: &ApiVersion,
        ancestors: &[ResourceRef],
        schema: &KindSchema,
    ) -> Result<String, ApiError> {
        let kinds = self.kinds(version)?;
        let mut url = format!("{}{}", base_url.trim_end_matches('/'), version.prefix());
        for ancestor in ancestors {
            let parent = kinds
                .get(&ancestor.kind)
                .ok_or_else(|| unknown_kind(&ancestor.kind))?;
            url.push_str(&format!("/{}/{}", parent.plural, ancestor.id));
        }
        url.push('/');
        url.push_str(&schema.plural);
        Ok(url)
    }

    /// Sets self, update, remove, collection and child-collection links on an instance.
    /// Links for operations the handler lacks are left out.
    pub fn add_links_to_resource(&self, resource: &mut Resource, base_url: &str) -> Result<(), ApiError> {
        let kinds = self.kinds(&resource.version)?;
        let schema = kinds
            .get(&resource.kind)
            .ok_or_else(|| unknown_kind(&resource.kind))?;
        let collection = self.collection_url(base_url, &resource.version, &resource.ancestors, schema)?;
        let self_url = format!("{}/{}", collection, resource.id);

        resource.links.insert(LinkType::SelfLink, self_url.clone());
        if schema.capabilities.contains(Capabilities::UPDATE) {
            resource.links.insert(LinkType::Update, self_url.clone());
        }
        if schema.capabilities.contains(Capabilities::DELETE) {
            resource.links.insert(LinkType::Remove, self_url.clone());
        }
        if schema.capabilities.contains(Capabilities::LIST) {
            resource.links.insert(LinkType::Collection, collection);
        }
        for child in schema.children.iter().filter_map(|c| kinds.get(c)) {
            if child.capabilities.contains(Capabilities::LIST) {
                resource.links.insert(
                    LinkType::Child(child.plural.clone()),
                    format!("{}/{}", self_url, child.plural),
                );
            }
        }
        Ok(())
    }

    /// Sets the collection's self link and the links of every element.
    pub fn add_links_to_resource_collection(
        &self,
        collection: &mut ResourceCollection,
        base_url: &str,
    ) -> Result<(), ApiError> {
        let schema = self
            .schema(&collection.version, &collection.kind)
            .ok_or_else(|| unknown_kind(&collection.kind))?;
        let url = self.collection_url(base_url, &collection.version, &collection.ancestors, schema)?;
        collection.links.insert(LinkType::SelfLink, url);
        for resource in &mut collection.resources {
            self.add_links_to_resource(resource, base_url)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SchemaManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: BTreeMap<String, Vec<&String>> = self
            .versions
            .iter()
            .map(|(v, kinds)| (v.to_string(), kinds.keys().collect()))
            .collect();
        f.debug_struct("SchemaManager")
            .field("kinds", &kinds)
            .field("finalized", &self.finalized)
            .finish()
    }
}

fn unknown_kind(kind: &str) -> ApiError {
    ApiError::new(ErrorCode::ServerError, format!("kind {} is not registered", kind))
}

/// Every parent chain of `schema`, root first, `schema` itself excluded.
fn ancestor_chains<'a>(kinds: &'a Kinds, schema: &'a KindSchema) -> Vec<Vec<&'a KindSchema>> {
    if schema.parents.is_empty() {
        return vec![Vec::new()];
    }
    let mut chains = Vec::new();
    for parent in schema.parents.iter().filter_map(|p| kinds.get(p)) {
        for mut chain in ancestor_chains(kinds, parent) {
            chain.push(parent);
            chains.push(chain);
        }
    }
    chains
}

/// Overlays `patch` on `base`: objects merge key by key, anything else replaces.
fn merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overlays_objects_and_replaces_the_rest() {
        let mut base = json!({"isWorker": true, "info": {"a": 1, "b": [1, 2]}, "list": [1]});
        merge(&mut base, &json!({"info": {"b": [3]}, "list": [], "address": "10.0.0.1"}));
        assert_eq!(
            base,
            json!({"isWorker": true, "info": {"a": 1, "b": [3]}, "list": [], "address": "10.0.0.1"})
        );
    }

    #[test]
    fn unregistered_manager_parses_nothing() {
        let mgr = SchemaManager::new();
        let err = mgr.parse_path("/apis/testing/v1/clusters").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(mgr.generate_routes().is_empty());
    }
}
