use std::future::Future;
use std::sync::Arc;

use axum::http::{HeaderMap, Method, Uri};
use futures::future::BoxFuture;
use serde_json::{Map, Value};

/// Caller-supplied context values
pub type ContextValues = Map<String, Value>;

/// Async context builder invoked once per HTTP request or WebSocket connection
pub type ContextFn = Arc<
    dyn Fn(ContextSource) -> BoxFuture<'static, async_graphql::Result<ContextValues>> + Send + Sync,
>;

/// What the context is being built for
#[derive(Debug, Clone)]
pub enum ContextSource {
    /// An HTTP request
    Request {
        method: Method,
        uri: Uri,
        headers: HeaderMap,
    },
    /// A WebSocket connection, with the params sent in `connection_init`
    Connection { params: Value },
}

impl ContextSource {
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            ContextSource::Request { headers, .. } => Some(headers),
            ContextSource::Connection { .. } => None,
        }
    }

    pub fn connection_params(&self) -> Option<&Value> {
        match self {
            ContextSource::Connection { params } => Some(params),
            ContextSource::Request { .. } => None,
        }
    }
}

/// Connection params of a WebSocket connection, stored unchanged in the
/// connection data
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionParams(pub Value);

/// Source of the caller values merged into every operation context
#[derive(Clone, Default)]
pub enum ContextProvider {
    #[default]
    None,
    Static(ContextValues),
    Dynamic(ContextFn),
}

impl ContextProvider {
    pub fn dynamic<F, Fut>(f: F) -> Self
    where
        F: Fn(ContextSource) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = async_graphql::Result<ContextValues>> + Send + 'static,
    {
        ContextProvider::Dynamic(Arc::new(move |source| Box::pin(f(source))))
    }

    /// Values for one request or connection
    pub async fn values(&self, source: ContextSource) -> async_graphql::Result<ContextValues> {
        match self {
            ContextProvider::None => Ok(ContextValues::new()),
            ContextProvider::Static(values) => Ok(values.clone()),
            ContextProvider::Dynamic(provider) => provider(source).await,
        }
    }
}

impl std::fmt::Debug for ContextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextProvider::None => f.write_str("None"),
            ContextProvider::Static(values) => f.debug_tuple("Static").field(values).finish(),
            ContextProvider::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}
