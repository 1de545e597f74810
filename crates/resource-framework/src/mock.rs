//! # Mock Handler
//!
//! [`MockHandler`] implements [`ResourceHandler`] in memory with queued expectations,
//! so server and routing behavior can be tested without an application store.
//!
//! Each expectation answers exactly one call of its operation, in order. A call with no
//! matching expectation fails with `ServerError` and is still recorded. Clones share
//! state, so a test can register one clone and keep configuring the other.
//!
//! ```rust
//! use resource_framework::handler::Capabilities;
//! use resource_framework::mock::{MockHandler, MockOp};
//! use resource_framework::resource::Resource;
//!
//! let mock = MockHandler::new(Capabilities::GET | Capabilities::LIST);
//! mock.expect(MockOp::List).return_list(vec![Resource::new("", "n1")]);
//! mock.expect(MockOp::Get).return_none();
//!
//! // register `Arc::new(mock.clone())` with the schema manager, drive requests, then:
//! // mock.verify();
//! assert_eq!(mock.pending(), 2);
//! ```

use crate::context::Context;
use crate::error::{ApiError, ErrorCode};
use crate::handler::{Capabilities, ResourceHandler};
use crate::resource::{Resource, ResourceRef};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    Create,
    Get,
    List,
    Update,
    Delete,
    Action,
}

#[derive(Debug)]
enum Response {
    One(Result<Resource, ApiError>),
    Maybe(Result<Option<Resource>, ApiError>),
    Many(Result<Vec<Resource>, ApiError>),
    Unit(Result<(), ApiError>),
    Json(Result<Value, ApiError>),
}

#[derive(Debug)]
struct Expectation {
    op: MockOp,
    response: Response,
}

/// One call the handler received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub op: MockOp,
    pub kind: String,
    pub id: String,
    pub ancestors: Vec<ResourceRef>,
    pub action: Option<String>,
    /// The resource as the handler saw it, for create and update.
    pub payload: Option<Value>,
}

#[derive(Debug, Default)]
struct State {
    expectations: VecDeque<Expectation>,
    calls: Vec<RecordedCall>,
}

#[derive(Debug, Clone)]
pub struct MockHandler {
    capabilities: Capabilities,
    state: Arc<Mutex<State>>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockHandler {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Queues an expectation for `op`; finish it with one of the builder's `return_*`.
    pub fn expect(&self, op: MockOp) -> ExpectationBuilder {
        ExpectationBuilder {
            op,
            state: self.state.clone(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state).calls.clone()
    }

    pub fn pending(&self) -> usize {
        lock(&self.state).expectations.len()
    }

    /// Panics if any expectation was not consumed.
    pub fn verify(&self) {
        let state = lock(&self.state);
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }

    fn take(&self, op: MockOp, ctx: &Context) -> Option<Response> {
        let mut state = lock(&self.state);
        let payload = match op {
            MockOp::Create | MockOp::Update if ctx.resource.has_object() => ctx.resource.to_json().ok(),
            _ => None,
        };
        state.calls.push(RecordedCall {
            op,
            kind: ctx.resource.kind.clone(),
            id: ctx.resource.id.clone(),
            ancestors: ctx.resource.ancestors.clone(),
            action: ctx.action().map(|a| a.name.clone()),
            payload,
        });
        match state.expectations.front() {
            Some(next) if next.op == op => state.expectations.pop_front().map(|e| e.response),
            _ => None,
        }
    }
}

fn unexpected(op: MockOp) -> ApiError {
    ApiError::new(ErrorCode::ServerError, format!("unexpected {:?} call", op))
}

/// Completes a queued expectation.
pub struct ExpectationBuilder {
    op: MockOp,
    state: Arc<Mutex<State>>,
}

impl ExpectationBuilder {
    fn push(self, response: Response) {
        lock(&self.state).expectations.push_back(Expectation {
            op: self.op,
            response,
        });
    }

    /// Answer for `Create`, `Update` and `Get`.
    pub fn return_resource(self, resource: Resource) {
        let response = match self.op {
            MockOp::Get => Response::Maybe(Ok(Some(resource))),
            _ => Response::One(Ok(resource)),
        };
        self.push(response);
    }

    /// `Get` answering "does not exist".
    pub fn return_none(self) {
        self.push(Response::Maybe(Ok(None)));
    }

    pub fn return_list(self, resources: Vec<Resource>) {
        self.push(Response::Many(Ok(resources)));
    }

    /// Answer for `Delete`.
    pub fn return_ok(self) {
        self.push(Response::Unit(Ok(())));
    }

    /// Answer for `Action`.
    pub fn return_json(self, value: Value) {
        self.push(Response::Json(Ok(value)));
    }

    pub fn return_err(self, error: ApiError) {
        let response = match self.op {
            MockOp::Create | MockOp::Update => Response::One(Err(error)),
            MockOp::Get => Response::Maybe(Err(error)),
            MockOp::List => Response::Many(Err(error)),
            MockOp::Delete => Response::Unit(Err(error)),
            MockOp::Action => Response::Json(Err(error)),
        };
        self.push(response);
    }
}

#[async_trait]
impl ResourceHandler for MockHandler {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn create(&self, ctx: &Context) -> Result<Resource, ApiError> {
        match self.take(MockOp::Create, ctx) {
            Some(Response::One(r)) => r,
            _ => Err(unexpected(MockOp::Create)),
        }
    }

    async fn get(&self, ctx: &Context) -> Result<Option<Resource>, ApiError> {
        match self.take(MockOp::Get, ctx) {
            Some(Response::Maybe(r)) => r,
            _ => Err(unexpected(MockOp::Get)),
        }
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<Resource>, ApiError> {
        match self.take(MockOp::List, ctx) {
            Some(Response::Many(r)) => r,
            _ => Err(unexpected(MockOp::List)),
        }
    }

    async fn update(&self, ctx: &Context) -> Result<Resource, ApiError> {
        match self.take(MockOp::Update, ctx) {
            Some(Response::One(r)) => r,
            _ => Err(unexpected(MockOp::Update)),
        }
    }

    async fn delete(&self, ctx: &Context) -> Result<(), ApiError> {
        match self.take(MockOp::Delete, ctx) {
            Some(Response::Unit(r)) => r,
            _ => Err(unexpected(MockOp::Delete)),
        }
    }

    async fn action(&self, ctx: &Context) -> Result<Value, ApiError> {
        match self.take(MockOp::Action, ctx) {
            Some(Response::Json(r)) => r,
            _ => Err(unexpected(MockOp::Action)),
        }
    }
}
