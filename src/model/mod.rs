//! Resource kinds served by the demo, each implementing
//! [`ResourceKind`](resource_framework::ResourceKind).

pub mod cluster;
pub mod node;

pub use cluster::*;
pub use node::*;
