//! Runs a scripted session against the demo API and logs every response.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RECIPE_CONFIG=recipe.json RUST_LOG=debug cargo run
//! ```

use resource_framework::{setup_tracing, ApiResponse, HttpMethod};
use resource_recipe::lifecycle::{ApiSystem, AppConfig};
use resource_recipe::model::{Cluster, Input, Node};
use serde::Serialize;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = AppConfig::load().map_err(|e| e.to_string())?;
    let system = ApiSystem::new(config).map_err(|e| e.to_string())?;

    for (method, patterns) in system.routes().iter() {
        for pattern in patterns {
            info!(%method, %pattern, "Route");
        }
    }

    let span = tracing::info_span!("clusters");
    async {
        let cluster = Cluster::new("c1", 3).with_data("replicas", 2);
        send(&system, HttpMethod::Post, "/clusters", Some(&cluster)).await?;
        send::<()>(&system, HttpMethod::Get, "/clusters/c1", None).await?;
        send::<()>(&system, HttpMethod::Get, "/clusters", None).await?;

        let input = Input {
            data: "hello recipe".to_string(),
        };
        let encoded = send(&system, HttpMethod::Post, "/clusters/c1?action=encode", Some(&input))
            .await?
            .body
            .and_then(|b| b.as_str().map(str::to_string))
            .unwrap_or_default();
        send(
            &system,
            HttpMethod::Post,
            "/clusters/c1?action=decode",
            Some(&Input { data: encoded }),
        )
        .await?;
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("nodes");
    async {
        let node = Node::new("10.0.0.11");
        send(&system, HttpMethod::Post, "/clusters/c1/nodes", Some(&node)).await?;
        send(
            &system,
            HttpMethod::Post,
            "/clusters/c1/nodes",
            Some(&Node::new("10.0.0.999")),
        )
        .await?;
        send::<()>(&system, HttpMethod::Get, "/clusters/c1/nodes", None).await?;
        send::<()>(&system, HttpMethod::Delete, "/clusters/c1/nodes/10.0.0.11", None).await?;
        send::<()>(&system, HttpMethod::Get, "/clusters/c1/nodes/10.0.0.11", None).await?;
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    info!("Session finished");
    Ok(())
}

async fn send<T: Serialize>(
    system: &ApiSystem,
    method: HttpMethod,
    path: &str,
    body: Option<&T>,
) -> Result<ApiResponse, String> {
    let mut req = system.request(method, path);
    if let Some(body) = body {
        req = req.with_json(body).map_err(|e| e.to_string())?;
    }
    let response = system.handle(req).await;
    let body = response
        .body
        .as_ref()
        .map(|b| b.to_string())
        .unwrap_or_default();
    if response.is_success() {
        info!(%method, path, status = response.status, %body, "Response");
    } else {
        warn!(%method, path, status = response.status, %body, "Response");
    }
    Ok(response)
}
