//! # API Server
//!
//! A transport-agnostic dispatcher. The transport hands over an [`ApiRequest`] and
//! writes back the [`ApiResponse`]; everything in between happens here:
//!
//! 1. The schema manager turns the request into a [`Resource`] (path, action, body).
//! 2. Middlewares run in registration order over the shared [`Context`]; the first
//!    error ends the request.
//! 3. The REST handler calls the kind's [`ResourceHandler`](crate::handler::ResourceHandler),
//!    stamps envelope data and links, and serializes the result.
//!
//! | Request | Handler | Status |
//! |---------|---------|--------|
//! | `POST` collection | `create` | 201 |
//! | `GET` collection | `list` | 200 |
//! | `GET` instance | `get` | 200, 404 when absent |
//! | `PUT` instance | `update` | 200 |
//! | `DELETE` instance | `delete` | 204 |
//! | `POST` instance `?action=` | `action` | 200 |
//!
//! Errors are serialized as `{"code": .., "message": ..}` with the status from
//! [`status_code`].

use crate::context::{ApiRequest, Context};
use crate::error::{ApiError, ErrorCode};
use crate::handler::{Capabilities, HttpMethod};
use crate::manager::SchemaManager;
use crate::resource::{Resource, ResourceCollection};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

/// A step run before the REST handler; returning an error aborts the request.
pub type Middleware = Box<dyn Fn(&mut Context) -> Result<(), ApiError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn error(err: &ApiError) -> Self {
        let body = serde_json::to_value(err).unwrap_or(Value::Null);
        Self::json(status_code(err.code), body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP status for an error code.
pub fn status_code(code: ErrorCode) -> u16 {
    match code {
        ErrorCode::InvalidFormat
        | ErrorCode::MissingRequired
        | ErrorCode::InvalidOption
        | ErrorCode::OutOfRange
        | ErrorCode::InvalidAction => 422,
        ErrorCode::NotFound => 404,
        ErrorCode::DuplicateResource => 409,
        ErrorCode::MethodNotAllowed => 405,
        ErrorCode::ServerError => 500,
    }
}

pub struct ApiServer {
    manager: Arc<SchemaManager>,
    middlewares: Vec<Middleware>,
}

impl ApiServer {
    pub fn new(manager: Arc<SchemaManager>) -> Self {
        if !manager.is_finalized() {
            warn!("Serving from a schema manager that was not finalized");
        }
        Self {
            manager,
            middlewares: Vec::new(),
        }
    }

    pub fn manager(&self) -> &Arc<SchemaManager> {
        &self.manager
    }

    pub fn use_middleware<F>(&mut self, middleware: F)
    where
        F: Fn(&mut Context) -> Result<(), ApiError> + Send + Sync + 'static,
    {
        self.middlewares.push(Box::new(middleware));
    }

    pub async fn handle(&self, req: ApiRequest) -> ApiResponse {
        let span = info_span!("request", method = %req.method, path = %req.path);
        async move {
            match self.serve(req).await {
                Ok(response) => {
                    debug!(status = response.status, "Request served");
                    response
                }
                Err(e) => {
                    warn!(code = %e.code, error = %e.message, "Request failed");
                    ApiResponse::error(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn serve(&self, req: ApiRequest) -> Result<ApiResponse, ApiError> {
        let resource = self.manager.create_resource_from_request(&req)?;
        let mut ctx = Context::new(req, resource);
        for middleware in &self.middlewares {
            middleware(&mut ctx)?;
        }
        self.dispatch(&ctx).await
    }

    async fn dispatch(&self, ctx: &Context) -> Result<ApiResponse, ApiError> {
        let handler = self
            .manager
            .handler(&ctx.resource.version, &ctx.resource.kind)
            .ok_or_else(|| ApiError::not_found(format!("no handler for {}", ctx.resource.kind)))?;
        let caps = handler.capabilities();
        let is_collection = ctx.resource.id.is_empty();

        match (ctx.request.method, is_collection) {
            (HttpMethod::Post, true) => {
                require(caps, Capabilities::CREATE, ctx)?;
                let mut created = handler.create(ctx).await?;
                if created.id.is_empty() {
                    return Err(ApiError::new(
                        ErrorCode::ServerError,
                        format!("created {} has no id", ctx.resource.kind),
                    ));
                }
                if created.creation_timestamp.is_none() {
                    created.creation_timestamp = Some(Utc::now());
                }
                self.finish(ctx, &mut created)?;
                to_response(201, &created)
            }
            (HttpMethod::Get, true) => {
                require(caps, Capabilities::LIST, ctx)?;
                let items = handler.list(ctx).await?;
                let mut collection = ResourceCollection::new(ctx, items);
                self.manager
                    .add_links_to_resource_collection(&mut collection, &ctx.request.base_url())?;
                to_response(200, &collection)
            }
            (HttpMethod::Get, false) => {
                require(caps, Capabilities::GET, ctx)?;
                let mut found = handler.get(ctx).await?.ok_or_else(|| {
                    ApiError::not_found(format!(
                        "{} {} does not exist",
                        ctx.resource.kind, ctx.resource.id
                    ))
                })?;
                self.finish(ctx, &mut found)?;
                to_response(200, &found)
            }
            (HttpMethod::Put, false) => {
                require(caps, Capabilities::UPDATE, ctx)?;
                let mut updated = handler.update(ctx).await?;
                self.finish(ctx, &mut updated)?;
                to_response(200, &updated)
            }
            (HttpMethod::Delete, false) => {
                require(caps, Capabilities::DELETE, ctx)?;
                handler.delete(ctx).await?;
                Ok(ApiResponse::empty(204))
            }
            (HttpMethod::Post, false) => {
                require(caps, Capabilities::ACTION, ctx)?;
                let result = handler.action(ctx).await?;
                Ok(ApiResponse::json(200, result))
            }
            (method, _) => Err(ApiError::method_not_allowed(format!(
                "{} is not allowed on {}",
                method, ctx.request.path
            ))),
        }
    }

    /// Copies the request identity onto a handler result and adds its links.
    fn finish(&self, ctx: &Context, resource: &mut Resource) -> Result<(), ApiError> {
        resource.kind = ctx.resource.kind.clone();
        resource.version = ctx.resource.version.clone();
        resource.ancestors = ctx.resource.ancestors.clone();
        if resource.id.is_empty() {
            resource.id = ctx.resource.id.clone();
        }
        self.manager
            .add_links_to_resource(resource, &ctx.request.base_url())
    }
}

fn require(caps: Capabilities, needed: Capabilities, ctx: &Context) -> Result<(), ApiError> {
    if caps.contains(needed) {
        Ok(())
    } else {
        Err(ApiError::method_not_allowed(format!(
            "{} is not allowed on {}",
            ctx.request.method, ctx.resource.kind
        )))
    }
}

fn to_response<T: Serialize>(status: u16, body: &T) -> Result<ApiResponse, ApiError> {
    let body = serde_json::to_value(body)
        .map_err(|e| ApiError::new(ErrorCode::ServerError, e.to_string()))?;
    Ok(ApiResponse::json(status, body))
}
