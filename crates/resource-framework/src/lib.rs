//! # Resource Framework
//!
//! A schema-driven REST resource engine. Types declare their fields and validation
//! constraints once; the framework turns that into:
//!
//! - a **field tree** that checks required fields, fills declared defaults and runs
//!   range, length, option and domain validators over request payloads
//! - a **kind graph** of parent/child resource kinds, from which it generates every
//!   collection and instance route and parses incoming paths back into a typed
//!   resource with its parent chain
//! - **hypermedia links** (self, update, remove, collection, child collections) for
//!   every resource and collection it returns
//!
//! ## Architecture Overview
//!
//! The crate is layered leaf-first:
//!
//! 1. **Description** ([`describe`], [`inspect`]): each type lists its serialized
//!    fields through [`TypeDescriptor`]; the inspector classifies every field shape.
//! 2. **Validation** ([`validator`], [`field`]): constraint tags compile into
//!    [`Validator`]s, and [`FieldTreeBuilder`] assembles one [`FieldTree`] per type.
//! 3. **Kind graph** ([`kind`], [`manager`], [`route`]): [`SchemaManager`] registers
//!    [`ResourceKind`]s with their [`ResourceHandler`]s, generates routes, parses paths
//!    and builds the per-request [`Resource`].
//! 4. **Serving** ([`context`], [`server`]): [`ApiServer`] runs middlewares and dispatches
//!    to the handler. It knows nothing about sockets; a transport feeds it
//!    [`ApiRequest`]s and writes back [`ApiResponse`]s.
//!
//! ## Constraint Tags
//!
//! Comma-separated `key=value` tokens attached to a field:
//!
//! | Tag | Applies to | Meaning |
//! |-----|------------|---------|
//! | `required=true` | any | absent, `null`, `""`, `[]` or `{}` (maps) is rejected |
//! | `min=`, `max=` | integers | inclusive range, both bounds required |
//! | `minLen=`, `maxLen=` | strings | inclusive length range, both bounds required |
//! | `options=a\|b` | strings | value must be one of the options |
//! | `isDomain=true` | strings | lowercase RFC 1123 domain name |
//! | `default=` | scalars, scalar slices (`1\|2\|3`) | used when the key is not sent |
//!
//! Rules on slices and maps apply to every element. Unknown keys are ignored.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use resource_framework::{
//!     ApiRequest, ApiServer, ApiVersion, Capabilities, Context, Describe, FieldType,
//!     HttpMethod, Resource, ResourceHandler, ResourceKind, SchemaManager, TypeDescriptor,
//! };
//! use resource_framework::error::ApiError;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Disk {
//!     name: String,
//!     driver: String,
//! }
//!
//! impl Describe for Disk {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::new("Disk")
//!             .field("name", FieldType::String, "required=true")
//!             .field("driver", FieldType::String, "required=true,options=lvm|ceph")
//!     }
//! }
//!
//! impl ResourceKind for Disk {}
//!
//! struct DiskHandler;
//!
//! #[async_trait]
//! impl ResourceHandler for DiskHandler {
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::CREATE
//!     }
//!
//!     async fn create(&self, ctx: &Context) -> Result<Resource, ApiError> {
//!         let name = ctx.object::<Disk>().map(|d| d.name.clone()).unwrap_or_default();
//!         Ok(Resource::new("disk", name))
//!     }
//! }
//!
//! let version = ApiVersion::new("storage", "v1");
//! let mut schemas = SchemaManager::new();
//! schemas.register::<Disk>(&version, Arc::new(DiskHandler)).unwrap();
//! schemas.finalize();
//!
//! let server = ApiServer::new(Arc::new(schemas));
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//!
//! let ok = ApiRequest::new(HttpMethod::Post, "/apis/storage/v1/disks")
//!     .with_body(r#"{"name": "d1", "driver": "lvm"}"#);
//! assert_eq!(rt.block_on(server.handle(ok)).status, 201);
//!
//! let bad = ApiRequest::new(HttpMethod::Post, "/apis/storage/v1/disks")
//!     .with_body(r#"{"name": "d2", "driver": "xfs"}"#);
//! assert_eq!(rt.block_on(server.handle(bad)).status, 422);
//! ```

pub mod context;
pub mod describe;
pub mod error;
pub mod field;
pub mod handler;
pub mod inspect;
pub mod kind;
pub mod manager;
pub mod mock;
pub mod resource;
pub mod route;
pub mod server;
pub mod tracing;
pub mod validator;

pub use crate::context::{ApiRequest, Context};
pub use crate::describe::{Describe, FieldType, TypeDescriptor};
pub use crate::error::{ApiError, ErrorCode, SchemaError, ValidationError};
pub use crate::field::{FieldTree, FieldTreeBuilder};
pub use crate::handler::{Capabilities, HttpMethod, ResourceHandler};
pub use crate::kind::{ActionDef, ApiVersion, ResourceKind};
pub use crate::manager::{ParsedPath, SchemaManager};
pub use crate::resource::{Action, LinkType, Resource, ResourceCollection, ResourceRef};
pub use crate::route::ResourceRoute;
pub use crate::server::{ApiResponse, ApiServer};
pub use crate::tracing::setup_tracing;
pub use crate::validator::Validator;
