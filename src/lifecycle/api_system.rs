use crate::handlers::{ClusterHandler, NodeHandler};
use crate::lifecycle::AppConfig;
use crate::model::{Cluster, Node};
use crate::state::State;
use resource_framework::error::SchemaError;
use resource_framework::{
    ApiRequest, ApiResponse, ApiServer, HttpMethod, ResourceRoute, SchemaManager,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Wires the demo kinds, their handlers and the shared store into one [`ApiServer`].
///
/// # Example
///
/// ```ignore
/// let system = ApiSystem::new(AppConfig::default())?;
/// let response = system
///     .handle(system.request(HttpMethod::Get, "/clusters"))
///     .await;
/// assert_eq!(response.status, 200);
/// ```
pub struct ApiSystem {
    config: AppConfig,
    state: Arc<State>,
    server: ApiServer,
}

impl ApiSystem {
    /// Registers `cluster` and its child `node` under the configured version.
    pub fn new(config: AppConfig) -> Result<Self, SchemaError> {
        let state = Arc::new(State::new());
        let version = config.api_version();

        let mut schemas = SchemaManager::new();
        schemas.register::<Cluster>(&version, Arc::new(ClusterHandler::new(state.clone())))?;
        schemas.register::<Node>(&version, Arc::new(NodeHandler::new(state.clone())))?;
        schemas.finalize();

        let mut server = ApiServer::new(Arc::new(schemas));
        server.use_middleware(|ctx| {
            debug!(
                kind = %ctx.resource.kind,
                id = %ctx.resource.id,
                parents = ctx.resource.ancestors.len(),
                "Dispatching"
            );
            Ok(())
        });

        info!(version = %version, base_url = %config.base_url, "API system ready");
        Ok(Self {
            config,
            state,
            server,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<State> {
        &self.state
    }

    pub fn routes(&self) -> ResourceRoute {
        self.server.manager().generate_routes()
    }

    /// A request addressed to the configured host; `path` is relative to the version prefix.
    pub fn request(&self, method: HttpMethod, path: &str) -> ApiRequest {
        let uri = format!("{}{}", self.config.api_version().prefix(), path);
        ApiRequest::new(method, &uri).with_host(self.config.host())
    }

    pub async fn handle(&self, req: ApiRequest) -> ApiResponse {
        self.server.handle(req).await
    }
}
