use std::sync::Arc;

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig, ALL_WEBSOCKET_PROTOCOLS};
use async_graphql::Data;
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::extract::{FromRequest, Request, State, WebSocketUpgrade};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::{ConnectionParams, ContextSource};
use crate::format::FormattingExecutor;
use crate::host::SubscriptionServer;
use crate::judo::Judo;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub judo: Arc<Judo>,
    pub subscriptions: Arc<SubscriptionServer>,
}

/// Routes of one server instance
pub fn router(judo: Arc<Judo>, subscriptions: Arc<SubscriptionServer>) -> Router {
    let endpoint = judo.config().endpoint.clone();
    let playground = judo.config().playground.clone();
    Router::new()
        .route(&endpoint, post(graphql_handler).get(subscription_handler))
        .route(&playground, get(graphql_playground))
        .with_state(AppState {
            judo,
            subscriptions,
        })
}

/// Request body: JSON per the GraphQL-over-HTTP convention, or a raw
/// `application/graphql` document
pub struct GraphQLBody(pub async_graphql::Request);

impl<S> FromRequest<S> for GraphQLBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let raw_document = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/graphql"));

        if raw_document {
            let query = String::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(GraphQLBody(async_graphql::Request::new(query)));
        }
        let request = <GraphQLRequest as FromRequest<S>>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(GraphQLBody(request.into_inner()))
    }
}

/// GraphQL handler
async fn graphql_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    GraphQLBody(request): GraphQLBody,
) -> GraphQLResponse {
    let source = ContextSource::Request {
        method,
        uri,
        headers,
    };
    state.judo.execute(request, source).await.into()
}

/// Subscription handler: upgrades to a GraphQL WebSocket connection
async fn subscription_handler(
    State(state): State<AppState>,
    protocol: GraphQLProtocol,
    websocket: WebSocketUpgrade,
) -> Response {
    if state.subscriptions.is_closed() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Subscription server closed").into_response();
    }
    let executor = FormattingExecutor::new(state.judo.schema().clone());
    let connection_id = Uuid::new_v4();

    websocket
        .protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |stream| async move {
            let judo = state.judo.clone();
            let closed = state.subscriptions.closed();
            debug!(%connection_id, "WebSocket connection opened");

            let serve = GraphQLWebSocket::new(stream, executor, protocol)
                .on_connection_init(move |params| connection_data(judo, params))
                .serve();
            tokio::select! {
                _ = serve => debug!(%connection_id, "WebSocket connection ended"),
                _ = closed => info!(%connection_id, "WebSocket connection closed with its subscription server"),
            }
        })
}

/// Connection data: the operation context plus the unchanged connection params
async fn connection_data(judo: Arc<Judo>, params: serde_json::Value) -> async_graphql::Result<Data> {
    let context = judo
        .context(ContextSource::Connection {
            params: params.clone(),
        })
        .await?;
    let mut data = Data::default();
    data.insert(context);
    data.insert(ConnectionParams(params));
    Ok(data)
}

/// GraphQL Playground handler
async fn graphql_playground(State(state): State<AppState>) -> impl IntoResponse {
    let endpoint = &state.judo.config().endpoint;
    Html(playground_source(
        GraphQLPlaygroundConfig::new(endpoint).subscription_endpoint(endpoint),
    ))
}
