//! Resource handlers of the demo kinds, backed by the shared [`State`](crate::state::State).

pub mod cluster_handler;
pub mod node_handler;

pub use cluster_handler::ClusterHandler;
pub use node_handler::NodeHandler;

use crate::state::Record;
use resource_framework::error::{ApiError, ErrorCode};
use resource_framework::resource::ResourceObject;
use resource_framework::{Context, Resource};

/// Envelope for a stored record; kind, version and parents are filled in by the server.
fn to_resource<T: ResourceObject>(record: Record<T>) -> Resource {
    let mut resource = Resource::new("", record.id).with_object(record.value);
    resource.creation_timestamp = Some(record.created_at);
    resource
}

/// The decoded request object, cloned out of the context.
fn request_object<T: Clone + 'static>(ctx: &Context) -> Result<T, ApiError> {
    ctx.object::<T>().cloned().ok_or_else(|| {
        ApiError::new(
            ErrorCode::ServerError,
            format!("{} request carries no object", ctx.resource.kind),
        )
    })
}

/// Id of the parent the request was routed through.
fn parent_id(ctx: &Context) -> Result<&str, ApiError> {
    ctx.parent()
        .map(|p| p.id.as_str())
        .ok_or_else(|| ApiError::not_found(format!("{} has no parent", ctx.resource.kind)))
}
