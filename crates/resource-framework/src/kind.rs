//! # Resource Kinds
//!
//! A kind is a registered resource type identity. Every kind is a plain serde type that
//! also [describes](crate::describe::Describe) its fields; the provided methods of
//! [`ResourceKind`] give it a name, a collection name, its parents and its action table.
//!
//! ```rust
//! use resource_framework::describe::{Describe, FieldType, TypeDescriptor};
//! use resource_framework::kind::{ActionDef, ResourceKind};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Namespace {
//!     name: String,
//! }
//!
//! impl Describe for Namespace {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::new("Namespace").field("name", FieldType::String, "required=true")
//!     }
//! }
//!
//! impl ResourceKind for Namespace {
//!     fn actions() -> Vec<ActionDef> {
//!         vec![ActionDef::new("refresh")]
//!     }
//! }
//!
//! assert_eq!(Namespace::kind_name(), "namespace");
//! assert_eq!(Namespace::plural_name(), "namespaces");
//! ```

use crate::describe::Describe;
use crate::resource::ResourceObject;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// API group and version a kind is served under.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiVersion {
    pub group: String,
    pub version: String,
}

impl ApiVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Path prefix of every route in this version, `/apis/{group}/{version}`.
    pub fn prefix(&self) -> String {
        format!("/apis/{}/{}", self.group, self.version)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.version)
    }
}

/// Contract every registered resource type satisfies.
///
/// All methods are provided. Override `parents` to nest the kind under one or more
/// already-registered kinds, `actions` to declare side operations, and
/// `default_resource` to supply the instance a request body is decoded over.
pub trait ResourceKind:
    Describe + Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static
{
    fn kind_name() -> String {
        default_kind_name(std::any::type_name::<Self>())
    }

    /// Collection segment used in routes and child links.
    fn plural_name() -> String {
        plural(&Self::kind_name())
    }

    /// Kind names of the parents. A kind may live under several parents.
    fn parents() -> Vec<String> {
        Vec::new()
    }

    fn actions() -> Vec<ActionDef> {
        Vec::new()
    }

    fn default_resource() -> Option<Self> {
        None
    }
}

/// Last path segment of a Rust type name, generics removed, lower-cased.
pub fn default_kind_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}

/// English plural of a kind name.
pub fn plural(name: &str) -> String {
    if name.ends_with('s') || name.ends_with('x') || name.ends_with("ch") || name.ends_with("sh") {
        return format!("{}es", name);
    }
    if let Some(stem) = name.strip_suffix('y') {
        let consonant = stem
            .chars()
            .last()
            .is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
        if consonant {
            return format!("{}ies", stem);
        }
    }
    format!("{}s", name)
}

pub(crate) type InputDecoder = fn(&Value) -> Result<Box<dyn ResourceObject>, serde_json::Error>;

fn decode_input<T>(body: &Value) -> Result<Box<dyn ResourceObject>, serde_json::Error>
where
    T: DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static,
{
    let input: T = serde_json::from_value(body.clone())?;
    Ok(Box::new(input))
}

/// A named side operation a kind accepts through `?action=`.
#[derive(Clone)]
pub struct ActionDef {
    name: String,
    input: Option<InputDecoder>,
}

impl ActionDef {
    /// An action without an input payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
        }
    }

    /// An action whose request body decodes into `T`.
    pub fn with_input<T>(name: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            input: Some(decode_input::<T>),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub(crate) fn decode(&self, body: &Value) -> Result<Option<Box<dyn ResourceObject>>, serde_json::Error> {
        self.input.map(|decode| decode(body)).transpose()
    }
}

impl fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDef")
            .field("name", &self.name)
            .field("has_input", &self.has_input())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_name_strips_module_path() {
        assert_eq!(default_kind_name("my_app::model::Deployment"), "deployment");
        assert_eq!(default_kind_name("StatefulSet"), "statefulset");
        assert_eq!(default_kind_name("app::Wrapper<app::Inner>"), "wrapper");
    }

    #[test]
    fn plural_follows_english_rules() {
        assert_eq!(plural("deployment"), "deployments");
        assert_eq!(plural("address"), "addresses");
        assert_eq!(plural("box"), "boxes");
        assert_eq!(plural("switch"), "switches");
        assert_eq!(plural("mesh"), "meshes");
        assert_eq!(plural("policy"), "policies");
        assert_eq!(plural("gateway"), "gateways");
        assert_eq!(plural("namespace"), "namespaces");
    }

    #[test]
    fn action_input_is_decoded_when_declared() {
        #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
        struct Location {
            #[serde(rename = "nodeName")]
            node_name: String,
        }

        let with_input = ActionDef::with_input::<Location>("move");
        let decoded = with_input
            .decode(&serde_json::json!({"nodeName": "n1"}))
            .unwrap()
            .unwrap();
        let location = decoded.as_any().downcast_ref::<Location>().unwrap();
        assert_eq!(location.node_name, "n1");

        let bare = ActionDef::new("restart");
        assert!(bare.decode(&serde_json::json!({})).unwrap().is_none());
        assert!(with_input.decode(&serde_json::json!({"nodeName": 1})).is_err());
    }
}
