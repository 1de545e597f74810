use super::{request_object, to_resource};
use crate::model::{Cluster, Input, DECODE, ENCODE};
use crate::state::{Record, State};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use resource_framework::error::{ApiError, ErrorCode};
use resource_framework::{Capabilities, Context, Resource, ResourceHandler};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Creates, reads and lists clusters, and runs the base64 actions.
pub struct ClusterHandler {
    state: Arc<State>,
}

impl ClusterHandler {
    pub fn new(state: Arc<State>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ResourceHandler for ClusterHandler {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CREATE | Capabilities::GET | Capabilities::LIST | Capabilities::ACTION
    }

    async fn create(&self, ctx: &Context) -> Result<Resource, ApiError> {
        let cluster: Cluster = request_object(ctx)?;
        let record = Record::new(cluster.name.clone(), cluster);
        self.state.add_cluster(record.clone()).await?;
        info!(cluster = %record.id, "Cluster created");
        Ok(to_resource(record))
    }

    async fn get(&self, ctx: &Context) -> Result<Option<Resource>, ApiError> {
        Ok(self.state.get_cluster(&ctx.resource.id).await.map(to_resource))
    }

    async fn list(&self, _ctx: &Context) -> Result<Vec<Resource>, ApiError> {
        let clusters = self.state.clusters().await;
        debug!(count = clusters.len(), "Listing clusters");
        Ok(clusters.into_iter().map(to_resource).collect())
    }

    async fn action(&self, ctx: &Context) -> Result<Value, ApiError> {
        let action = ctx
            .action()
            .ok_or_else(|| ApiError::new(ErrorCode::InvalidAction, "no action given"))?;
        let data = action
            .input::<Input>()
            .map(|input| input.data.as_str())
            .unwrap_or_default();
        debug!(action = %action.name, len = data.len(), "Running cluster action");

        match action.name.as_str() {
            ENCODE => Ok(Value::String(STANDARD.encode(data))),
            DECODE => {
                let bytes = STANDARD
                    .decode(data)
                    .map_err(|e| ApiError::invalid_format(e.to_string()))?;
                let text =
                    String::from_utf8(bytes).map_err(|e| ApiError::invalid_format(e.to_string()))?;
                Ok(Value::String(text))
            }
            other => Err(ApiError::new(
                ErrorCode::InvalidAction,
                format!("unknown cluster action {}", other),
            )),
        }
    }
}
