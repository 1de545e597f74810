//! # Resource Handlers
//!
//! Application code implements [`ResourceHandler`] once per kind. The handler reports
//! which operations it supports as an explicit [`Capabilities`] set; route generation,
//! path parsing and link generation consult that set instead of probing the handler.
//!
//! Every operation has a default body that fails with `MethodNotAllowed`, so a handler
//! only implements what it advertises.
//!
//! ```rust
//! use resource_framework::context::Context;
//! use resource_framework::error::ApiError;
//! use resource_framework::handler::{Capabilities, ResourceHandler};
//! use resource_framework::resource::Resource;
//! use async_trait::async_trait;
//!
//! struct ReadOnly;
//!
//! #[async_trait]
//! impl ResourceHandler for ReadOnly {
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::GET | Capabilities::LIST
//!     }
//!
//!     async fn list(&self, _ctx: &Context) -> Result<Vec<Resource>, ApiError> {
//!         Ok(Vec::new())
//!     }
//! }
//! ```

use crate::context::Context;
use crate::error::ApiError;
use crate::resource::Resource;
use async_trait::async_trait;
use bitflags::bitflags;
use serde_json::Value;
use std::fmt;

bitflags! {
    /// Operations a handler supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const CREATE = 1 << 0;
        const GET    = 1 << 1;
        const LIST   = 1 << 2;
        const UPDATE = 1 << 3;
        const DELETE = 1 << 4;
        const ACTION = 1 << 5;
    }
}

impl Capabilities {
    /// Operations addressed at a collection path.
    pub const COLLECTION: Capabilities = Capabilities::LIST.union(Capabilities::CREATE);

    /// Operations addressed at an instance path.
    pub const INSTANCE: Capabilities = Capabilities::GET
        .union(Capabilities::UPDATE)
        .union(Capabilities::DELETE)
        .union(Capabilities::ACTION);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbs bound to the collection path: GET lists, POST creates.
pub fn collection_methods(caps: Capabilities) -> Vec<HttpMethod> {
    let mut methods = Vec::new();
    if caps.contains(Capabilities::LIST) {
        methods.push(HttpMethod::Get);
    }
    if caps.contains(Capabilities::CREATE) {
        methods.push(HttpMethod::Post);
    }
    methods
}

/// Verbs bound to the instance path. POST is the action verb.
pub fn resource_methods(caps: Capabilities) -> Vec<HttpMethod> {
    let mut methods = Vec::new();
    if caps.contains(Capabilities::GET) {
        methods.push(HttpMethod::Get);
    }
    if caps.contains(Capabilities::DELETE) {
        methods.push(HttpMethod::Delete);
    }
    if caps.contains(Capabilities::UPDATE) {
        methods.push(HttpMethod::Put);
    }
    if caps.contains(Capabilities::ACTION) {
        methods.push(HttpMethod::Post);
    }
    methods
}

fn unsupported(op: &str, ctx: &Context) -> ApiError {
    ApiError::method_not_allowed(format!("{} is not supported by {}", op, ctx.resource.kind))
}

/// Application side of a kind: CRUD plus actions over the request [`Context`].
///
/// `ctx.resource` holds the addressed kind, id and ancestors; for create and update
/// it also holds the decoded, defaulted and validated object, for actions the
/// resolved [`Action`](crate::resource::Action).
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    async fn create(&self, ctx: &Context) -> Result<Resource, ApiError> {
        Err(unsupported("create", ctx))
    }

    /// `Ok(None)` means the resource does not exist.
    async fn get(&self, ctx: &Context) -> Result<Option<Resource>, ApiError> {
        Err(unsupported("get", ctx))
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<Resource>, ApiError> {
        Err(unsupported("list", ctx))
    }

    async fn update(&self, ctx: &Context) -> Result<Resource, ApiError> {
        Err(unsupported("update", ctx))
    }

    async fn delete(&self, ctx: &Context) -> Result<(), ApiError> {
        Err(unsupported("delete", ctx))
    }

    async fn action(&self, ctx: &Context) -> Result<Value, ApiError> {
        Err(unsupported("action", ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_handler_methods() {
        assert_eq!(
            resource_methods(Capabilities::all()),
            vec![HttpMethod::Get, HttpMethod::Delete, HttpMethod::Put, HttpMethod::Post]
        );
        assert_eq!(
            collection_methods(Capabilities::all()),
            vec![HttpMethod::Get, HttpMethod::Post]
        );
    }

    #[test]
    fn create_only_handler_has_no_instance_methods() {
        assert!(resource_methods(Capabilities::CREATE).is_empty());
        assert_eq!(collection_methods(Capabilities::CREATE), vec![HttpMethod::Post]);
    }

    #[test]
    fn method_names_round_trip() {
        for m in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete] {
            assert_eq!(HttpMethod::parse(m.as_str()), Some(m));
        }
        assert_eq!(HttpMethod::parse("patch"), None);
    }
}
