//! # Resource Envelope
//!
//! A [`Resource`] is built fresh for every request from the path and the body. It
//! carries the addressed id, the resolved kind, the ancestor chain from the path, an
//! optional [`Action`], the generated links and the decoded typed object.
//!
//! Parents are stored as plain [`ResourceRef`] pairs (kind name and id), root first.
//! Nothing holds a live reference to another instance.
//!
//! ## Wire format
//!
//! A resource serializes as its object's fields with the envelope keys merged in:
//!
//! ```json
//! { "id": "c1", "type": "cluster", "links": { "self": "..." }, "creationTimestamp": "...", "name": "c1" }
//! ```
//!
//! A [`ResourceCollection`] serializes as `{"type":"collection","links":{..},"data":[..]}`.
//! `data` is always an array and `links` is omitted while empty.

use crate::context::Context;
use crate::kind::ApiVersion;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Type-erased payload of a resource or action.
///
/// Implemented for every `Serialize + Debug + Send + Sync` type, so typed kinds and
/// raw `serde_json::Value`s both fit.
pub trait ResourceObject: Any + fmt::Debug + Send + Sync {
    fn to_json(&self) -> Result<Value, serde_json::Error>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> ResourceObject for T
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Ownership-free reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceRef {
    pub kind: String,
    pub id: String,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Key of a generated hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkType {
    SelfLink,
    Update,
    Remove,
    Collection,
    /// Link to a child collection, named by the child's plural.
    Child(String),
}

impl LinkType {
    pub fn as_str(&self) -> &str {
        match self {
            LinkType::SelfLink => "self",
            LinkType::Update => "update",
            LinkType::Remove => "remove",
            LinkType::Collection => "collection",
            LinkType::Child(name) => name,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LinkType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub type Links = BTreeMap<LinkType, String>;

/// A resolved action: its name and the decoded input, if the action takes one.
#[derive(Debug)]
pub struct Action {
    pub name: String,
    pub input: Option<Box<dyn ResourceObject>>,
}

impl Action {
    pub fn input<T: 'static>(&self) -> Option<&T> {
        self.input.as_ref().and_then(|i| i.as_any().downcast_ref::<T>())
    }
}

#[derive(Debug, Default)]
pub struct Resource {
    pub id: String,
    pub kind: String,
    pub version: ApiVersion,
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Parent chain from the path, root first.
    pub ancestors: Vec<ResourceRef>,
    pub action: Option<Action>,
    pub links: Links,
    object: Option<Box<dyn ResourceObject>>,
}

impl Resource {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_object<T: ResourceObject>(mut self, object: T) -> Self {
        self.set_object(object);
        self
    }

    pub fn with_ancestors(mut self, ancestors: Vec<ResourceRef>) -> Self {
        self.ancestors = ancestors;
        self
    }

    pub fn set_object<T: ResourceObject>(&mut self, object: T) {
        self.object = Some(Box::new(object));
    }

    pub(crate) fn set_boxed_object(&mut self, object: Box<dyn ResourceObject>) {
        self.object = Some(object);
    }

    pub fn has_object(&self) -> bool {
        self.object.is_some()
    }

    /// Typed view of the decoded object; `None` when absent or of another type.
    pub fn object<T: 'static>(&self) -> Option<&T> {
        self.object.as_ref().and_then(|o| o.as_any().downcast_ref::<T>())
    }

    pub fn object_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.object.as_mut().and_then(|o| o.as_any_mut().downcast_mut::<T>())
    }

    /// Moves the typed object out, leaving the resource without one.
    pub fn take_object<T: 'static>(&mut self) -> Option<T> {
        if self.object::<T>().is_none() {
            return None;
        }
        self.object
            .take()
            .and_then(|o| o.into_any().downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Immediate parent, if the resource is nested.
    pub fn parent(&self) -> Option<&ResourceRef> {
        self.ancestors.last()
    }

    pub fn to_ref(&self) -> ResourceRef {
        ResourceRef::new(self.kind.clone(), self.id.clone())
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut out = match self.object.as_ref().map(|o| o.to_json()).transpose()? {
            Some(Value::Object(fields)) => fields,
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                let mut wrapped = Map::new();
                wrapped.insert("data".to_string(), other);
                wrapped
            }
        };
        out.insert("id".to_string(), Value::String(self.id.clone()));
        out.insert("type".to_string(), Value::String(self.kind.clone()));
        if !self.links.is_empty() {
            out.insert("links".to_string(), serde_json::to_value(&self.links)?);
        }
        if let Some(ts) = self.creation_timestamp {
            out.insert(
                "creationTimestamp".to_string(),
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
        Ok(Value::Object(out))
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// Resources listed under one parent context.
#[derive(Debug, Default)]
pub struct ResourceCollection {
    pub kind: String,
    pub version: ApiVersion,
    pub ancestors: Vec<ResourceRef>,
    pub links: Links,
    pub resources: Vec<Resource>,
}

impl ResourceCollection {
    /// Every element takes the kind, version and ancestors of the request context.
    pub fn new(ctx: &Context, resources: impl IntoIterator<Item = Resource>) -> Self {
        Self::under(&ctx.resource, resources)
    }

    /// Same as [`ResourceCollection::new`] with an explicit context resource.
    pub fn under(context: &Resource, resources: impl IntoIterator<Item = Resource>) -> Self {
        let resources = resources
            .into_iter()
            .map(|mut r| {
                r.kind = context.kind.clone();
                r.version = context.version.clone();
                r.ancestors = context.ancestors.clone();
                r
            })
            .collect();
        Self {
            kind: context.kind.clone(),
            version: context.version.clone(),
            ancestors: context.ancestors.clone(),
            links: Links::new(),
            resources,
        }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Serialize for ResourceCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let len = if self.links.is_empty() { 2 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("type", "collection")?;
        if !self.links.is_empty() {
            map.serialize_entry("links", &self.links)?;
        }
        map.serialize_entry("data", &self.resources)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Debug, Serialize, PartialEq)]
    struct Dumb {
        number: i32,
    }

    #[test]
    fn empty_and_missing_collections_serialize_alike() {
        let context = Resource::new("dumb", "");
        let none = ResourceCollection::under(&context, Vec::new());
        let empty = ResourceCollection::under(&context, std::iter::empty());
        let a = serde_json::to_string(&none).unwrap();
        let b = serde_json::to_string(&empty).unwrap();
        assert_eq!(a, r#"{"type":"collection","data":[]}"#);
        assert_eq!(a, b);
    }

    #[test]
    fn elements_share_the_collection_context() {
        let context =
            Resource::new("node", "").with_ancestors(vec![ResourceRef::new("cluster", "c1")]);
        let items = vec![Resource::new("", "n1"), Resource::new("other", "n2")];
        let coll = ResourceCollection::under(&context, items);
        assert_eq!(coll.len(), 2);
        for r in &coll.resources {
            assert_eq!(r.kind, "node");
            assert_eq!(r.parent(), Some(&ResourceRef::new("cluster", "c1")));
        }
    }

    #[test]
    fn resource_json_merges_envelope_and_object() {
        let mut r = Resource::new("dumb", "d1").with_object(Dumb { number: 10 });
        r.creation_timestamp = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        r.links.insert(LinkType::SelfLink, "http://h/apis/g/v1/dumbs/d1".into());
        r.links.insert(LinkType::Child("pods".into()), "http://h/apis/g/v1/dumbs/d1/pods".into());

        assert_eq!(
            r.to_json().unwrap(),
            json!({
                "id": "d1",
                "type": "dumb",
                "number": 10,
                "creationTimestamp": "2024-01-02T03:04:05Z",
                "links": {
                    "self": "http://h/apis/g/v1/dumbs/d1",
                    "pods": "http://h/apis/g/v1/dumbs/d1/pods"
                }
            })
        );
    }

    #[test]
    fn typed_access_downcasts() {
        let mut r = Resource::new("dumb", "d1").with_object(Dumb { number: 1 });
        assert!(r.object::<String>().is_none());
        r.object_mut::<Dumb>().unwrap().number = 2;
        assert!(r.take_object::<String>().is_none());
        assert_eq!(r.take_object::<Dumb>(), Some(Dumb { number: 2 }));
        assert!(!r.has_object());
    }
}
