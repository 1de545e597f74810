//! Error types for the in-memory store.

use resource_framework::{ApiError, ErrorCode};
use thiserror::Error;

/// Errors that can occur while changing the stored clusters and nodes.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StateError {
    /// A cluster with the same name is already stored.
    #[error("cluster {0} already exists")]
    DuplicateCluster(String),

    #[error("unknown cluster with name {0}")]
    UnknownCluster(String),

    /// The cluster already has a node with this address.
    #[error("add duplicate node with address {0}")]
    DuplicateNode(String),

    #[error("unknown node with address {0}")]
    UnknownNode(String),
}

impl From<StateError> for ApiError {
    fn from(e: StateError) -> Self {
        let code = match e {
            StateError::DuplicateCluster(_) | StateError::DuplicateNode(_) => {
                ErrorCode::DuplicateResource
            }
            StateError::UnknownCluster(_) | StateError::UnknownNode(_) => ErrorCode::NotFound,
        };
        ApiError::new(code, e.to_string())
    }
}
