use resource_framework::{ActionDef, Describe, FieldType, ResourceKind, TypeDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cluster of nodes, identified by its name.
///
/// Served at `/apis/{group}/{version}/clusters`. Accepts the `encode` and `decode`
/// actions, both taking an [`Input`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    pub node_count: u32,
    pub map_data: BTreeMap<String, i64>,
}

impl Cluster {
    pub fn new(name: impl Into<String>, node_count: u32) -> Self {
        Self {
            name: name.into(),
            node_count,
            map_data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: i64) -> Self {
        self.map_data.insert(key.into(), value);
        self
    }
}

impl Describe for Cluster {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new("Cluster")
            .field("name", FieldType::String, "required=true,minLen=1,maxLen=10")
            .field("nodeCount", FieldType::Uint, "required=true,min=1,max=1000")
            .field("mapData", FieldType::string_map(FieldType::Int), "required=true")
    }
}

impl ResourceKind for Cluster {
    fn actions() -> Vec<ActionDef> {
        vec![
            ActionDef::with_input::<Input>(ENCODE),
            ActionDef::with_input::<Input>(DECODE),
        ]
    }
}

pub const ENCODE: &str = "encode";
pub const DECODE: &str = "decode";

/// Payload of the cluster actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    pub data: String,
}
