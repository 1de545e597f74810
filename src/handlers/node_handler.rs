use super::{parent_id, request_object, to_resource};
use crate::model::Node;
use crate::state::{Record, State};
use async_trait::async_trait;
use resource_framework::error::ApiError;
use resource_framework::{Capabilities, Context, Resource, ResourceHandler};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::info;

/// Manages the nodes of a cluster. A node is addressed by its IP address.
pub struct NodeHandler {
    state: Arc<State>,
}

impl NodeHandler {
    pub fn new(state: Arc<State>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ResourceHandler for NodeHandler {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CREATE | Capabilities::GET | Capabilities::LIST | Capabilities::DELETE
    }

    async fn create(&self, ctx: &Context) -> Result<Resource, ApiError> {
        let node: Node = request_object(ctx)?;
        if node.address.parse::<IpAddr>().is_err() {
            return Err(ApiError::invalid_format(format!(
                "address {} isn't a valid ip address",
                node.address
            )));
        }

        let cluster = parent_id(ctx)?;
        let record = Record::new(node.address.clone(), node);
        self.state.add_node(cluster, record.clone()).await?;
        info!(cluster, node = %record.id, "Node added");
        Ok(to_resource(record))
    }

    async fn get(&self, ctx: &Context) -> Result<Option<Resource>, ApiError> {
        let cluster = parent_id(ctx)?;
        Ok(self
            .state
            .get_node(cluster, &ctx.resource.id)
            .await
            .map(to_resource))
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<Resource>, ApiError> {
        let cluster = parent_id(ctx)?;
        let nodes = self.state.nodes(cluster).await?;
        Ok(nodes.into_iter().map(to_resource).collect())
    }

    async fn delete(&self, ctx: &Context) -> Result<(), ApiError> {
        let cluster = parent_id(ctx)?;
        self.state.delete_node(cluster, &ctx.resource.id).await?;
        info!(cluster, node = %ctx.resource.id, "Node removed");
        Ok(())
    }
}
