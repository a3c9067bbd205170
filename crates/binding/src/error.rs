use std::fmt;

use async_graphql::Value;
use serde::Deserialize;
use thiserror::Error;

/// Root operation kind an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single GraphQL error reported by the data-access service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamError {
    pub message: String,
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub path: Vec<Value>,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            request_id: None,
            path: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<Value>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum BindingError {
    #[error("{}", upstream_message(.0))]
    Upstream(Vec<UpstreamError>),

    #[error("No {kind} operation named `{name}` on the data-access client")]
    UnknownOperation { kind: OperationKind, name: String },

    #[error("Invalid data-access type definitions: {0}")]
    InvalidTypeDefs(String),

    #[error("Invalid fragment replacement for {type_name}.{field_name}: {message}")]
    InvalidFragment {
        type_name: String,
        field_name: String,
        message: String,
    },

    #[error("Invalid data-access endpoint {0}")]
    InvalidEndpoint(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response from the data-access service: {0}")]
    InvalidResponse(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Response carried no data for `{0}`")]
    MissingData(String),
}

impl BindingError {
    /// The upstream GraphQL errors, when the service rejected the operation
    pub fn upstream_errors(&self) -> Option<&[UpstreamError]> {
        match self {
            BindingError::Upstream(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BindingError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        BindingError::WebSocket(err.to_string())
    }
}

fn upstream_message(errors: &[UpstreamError]) -> String {
    match errors {
        [] => "Upstream request failed".to_string(),
        [only] => only.message.clone(),
        many => many
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
