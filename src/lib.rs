//! # Resource Recipe
//!
//! > **A cluster and node REST API on top of `resource-framework`.**
//!
//! This crate shows how an application plugs into the framework: it describes its
//! kinds once, implements a [`ResourceHandler`](resource_framework::ResourceHandler)
//! per kind, and lets the framework do routing, decoding, defaulting, validation and
//! hypermedia links.
//!
//! ## Kinds
//!
//! | Kind | Routes | Capabilities |
//! |------|--------|--------------|
//! | [`Cluster`](model::Cluster) | `/clusters`, `/clusters/:cluster_id` | create, get, list, `encode`/`decode` actions |
//! | [`Node`](model::Node) | `/clusters/:cluster_id/nodes[/:node_id]` | create, get, list, delete |
//!
//! Every route sits under `/apis/{group}/{version}`, configured through
//! [`AppConfig`](lifecycle::AppConfig).
//!
//! ## Layout
//!
//! - **[model]**: the serialized kinds and their constraint tags
//! - **[handlers]**: per-kind handlers translating requests into store calls
//! - **[state]**: the in-memory store, with its own [`StateError`](state::StateError)
//!   mapped onto API error codes
//! - **[lifecycle]**: configuration and the [`ApiSystem`](lifecycle::ApiSystem) that
//!   wires everything together
//!
//! ## Error Handling
//!
//! Handlers return [`ApiError`](resource_framework::ApiError). Store failures convert
//! with `?`: a duplicate cluster or node becomes `409 DuplicateResource`, an unknown one
//! `404 NotFound`. Requests rejected by the field tree never reach a handler and come
//! back as `422`.
//!
//! ## Testing
//!
//! Handlers are exercised end to end through [`ApiSystem`](lifecycle::ApiSystem) in
//! `tests/integration_test.rs`. For handler-free tests of the framework see
//! [`resource_framework::mock`].

pub mod handlers;
pub mod lifecycle;
pub mod model;
pub mod state;
