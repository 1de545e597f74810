//! Per-request state shared by middlewares and handlers.

use crate::handler::HttpMethod;
use crate::resource::{Action, Resource, ResourceRef};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

const DEFAULT_HOST: &str = "localhost";

/// Transport-independent view of an incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    /// Value of the `action` query parameter.
    pub action: Option<String>,
    pub body: Vec<u8>,
    pub host: String,
}

impl ApiRequest {
    /// Splits `uri` into path and query; only the `action` parameter is kept.
    pub fn new(method: HttpMethod, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        let action = query.and_then(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, value)| *key == "action" && !value.is_empty())
                .map(|(_, value)| value.to_string())
        });

        Self {
            method,
            path: path.to_string(),
            action,
            body: Vec::new(),
            host: DEFAULT_HOST.to_string(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_json<T: Serialize>(self, body: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self.with_body(bytes))
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Base every generated link starts with.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.host)
    }
}

/// The request, the resource built from it, and a typed key/value bag.
pub struct Context {
    pub request: ApiRequest,
    pub resource: Resource,
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new(request: ApiRequest, resource: Resource) -> Self {
        Self {
            request,
            resource,
            values: HashMap::new(),
        }
    }

    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// `None` when the key is unset or holds another type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    pub fn object<T: 'static>(&self) -> Option<&T> {
        self.resource.object::<T>()
    }

    pub fn action(&self) -> Option<&Action> {
        self.resource.action.as_ref()
    }

    pub fn parent(&self) -> Option<&ResourceRef> {
        self.resource.parent()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request", &self.request)
            .field("resource", &self.resource)
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}
