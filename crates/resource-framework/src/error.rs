//! # Framework Errors
//!
//! This module defines every error type used throughout the resource framework.
//! Errors fall into two phases with different severity:
//!
//! - **Build-time** ([`SchemaError`]): raised while describing types and registering
//!   kinds. These are fatal to startup; a process must not serve requests with an
//!   inconsistent schema.
//! - **Request-time** ([`ValidationError`], [`ApiError`]): raised while parsing a
//!   path or checking a payload. They are recoverable per request and never touch
//!   the shared kind graph.
//!
//! [`ApiError`] is the structured surface handed to the transport layer. It carries a
//! machine-readable [`ErrorCode`] and a human-readable message.

use serde::{Serialize, Serializer};
use std::fmt;

/// Errors raised while building field trees or registering kinds.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("Field {field}: unsupported type {ty}")]
    UnsupportedType { field: String, ty: String },

    #[error("Field {field}: invalid tag `{tag}`: {reason}")]
    InvalidTag {
        field: String,
        tag: String,
        reason: String,
    },

    #[error("Field {field}: {key} bounds are inverted (min {min} > max {max})")]
    InvertedBounds {
        field: String,
        key: &'static str,
        min: i128,
        max: i128,
    },

    #[error("Type {ty}: duplicate field {field}")]
    DuplicateField { ty: String, field: String },

    #[error("Type {0} refers to itself")]
    RecursiveType(String),

    #[error("Type name {0} is used by two different layouts")]
    DuplicateTypeName(String),

    #[error("Kind {kind} already registered in {version}")]
    DuplicateKind { kind: String, version: String },

    #[error("Kind {kind} declares unknown parent {parent}")]
    UnknownParent { kind: String, parent: String },

    #[error("Collection {collection} already registered under {parent}")]
    DuplicateCollection { collection: String, parent: String },

    #[error("Kind {kind} declares action {action} twice")]
    DuplicateAction { kind: String, action: String },

    #[error("Handler for kind {0} supports no operation")]
    NoCapabilities(String),

    #[error("Kind {kind}: default resource cannot be serialized: {reason}")]
    DefaultResource { kind: String, reason: String },

    #[error("Schema manager is finalized, cannot register {0}")]
    Finalized(String),
}

/// The rule a single value broke.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ConstraintViolation {
    #[error("value {value} is out of range [{min}, {max}]")]
    OutOfRange { value: i128, min: i64, max: i64 },

    #[error("length {len} is out of range [{min}, {max}]")]
    Length { len: usize, min: usize, max: usize },

    #[error("value {value:?} is not one of [{}]", .options.join("|"))]
    NotInOptions { value: String, options: Vec<String> },

    #[error("{0:?} is not a valid domain name")]
    InvalidDomain(String),

    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("element {index}: {inner}")]
    Element {
        index: String,
        inner: Box<ConstraintViolation>,
    },
}

impl ConstraintViolation {
    /// Strips element wrappers and returns the violated leaf rule.
    pub fn root(&self) -> &ConstraintViolation {
        match self {
            ConstraintViolation::Element { inner, .. } => inner.root(),
            other => other,
        }
    }
}

/// A request payload that failed required or constraint checks.
///
/// Every variant names the dotted field path, e.g. `sliceComposition[0].int8WithRange`.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("field {path} is required")]
    MissingRequired { path: String },

    #[error("field {path}: {violation}")]
    Constraint {
        path: String,
        violation: ConstraintViolation,
    },

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

impl ValidationError {
    pub fn path(&self) -> Option<&str> {
        match self {
            ValidationError::MissingRequired { path } => Some(path),
            ValidationError::Constraint { path, .. } => Some(path),
            ValidationError::InvalidFormat(_) => None,
        }
    }
}

/// Machine-readable error kinds exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidFormat,
    MissingRequired,
    InvalidOption,
    OutOfRange,
    NotFound,
    DuplicateResource,
    InvalidAction,
    MethodNotAllowed,
    ServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFormat => "InvalidFormat",
            ErrorCode::MissingRequired => "MissingRequired",
            ErrorCode::InvalidOption => "InvalidOption",
            ErrorCode::OutOfRange => "OutOfRange",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::DuplicateResource => "DuplicateResource",
            ErrorCode::InvalidAction => "InvalidAction",
            ErrorCode::MethodNotAllowed => "MethodNotAllowed",
            ErrorCode::ServerError => "ServerError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Structured request-time error handed to the transport layer.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Serialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotAllowed, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        let code = match &e {
            ValidationError::MissingRequired { .. } => ErrorCode::MissingRequired,
            ValidationError::InvalidFormat(_) => ErrorCode::InvalidFormat,
            ValidationError::Constraint { violation, .. } => match violation.root() {
                ConstraintViolation::OutOfRange { .. } | ConstraintViolation::Length { .. } => {
                    ErrorCode::OutOfRange
                }
                ConstraintViolation::NotInOptions { .. } => ErrorCode::InvalidOption,
                _ => ErrorCode::InvalidFormat,
            },
        };
        ApiError::new(code, e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::invalid_format(e.to_string())
    }
}
