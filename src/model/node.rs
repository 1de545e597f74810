use resource_framework::{Describe, FieldType, ResourceKind, TypeDescriptor};
use serde::{Deserialize, Serialize};

/// A machine inside a cluster, identified by its address.
///
/// New nodes are workers unless the request says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    pub address: String,
    pub is_worker: bool,
}

impl Node {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            is_worker: true,
        }
    }
}

impl Describe for Node {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new("Node")
            .field("address", FieldType::String, "required=true,minLen=7,maxLen=13")
            .field("isWorker", FieldType::Bool, "")
    }
}

impl ResourceKind for Node {
    fn parents() -> Vec<String> {
        vec!["cluster".to_string()]
    }

    fn default_resource() -> Option<Self> {
        Some(Node {
            is_worker: true,
            ..Default::default()
        })
    }
}
