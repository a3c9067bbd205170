use async_graphql::Value;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{SinkExt, StreamExt};
use jsonwebtoken::{EncodingKey, Header};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::{BindingError, UpstreamError};

/// Stream of `data` payloads pushed by a subscription
pub type DataStream = BoxStream<'static, Result<Value, BindingError>>;

/// Carries rendered documents to the data-access service
pub trait Transport: Send + Sync {
    /// Run a query or mutation document and return its `data`
    fn request(&self, document: String) -> BoxFuture<'_, Result<Value, BindingError>>;

    /// Start a subscription document
    fn subscribe(&self, document: String) -> BoxFuture<'_, Result<DataStream, BindingError>>;
}

/// Body of a GraphQL response from the service
#[derive(Debug, Deserialize)]
struct RemoteResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<UpstreamError>,
}

impl RemoteResponse {
    fn into_data(self) -> Result<Value, BindingError> {
        if !self.errors.is_empty() {
            return Err(BindingError::Upstream(self.errors));
        }
        Ok(self.data.unwrap_or(Value::Null))
    }
}

#[derive(Serialize)]
struct ServiceClaims<'a> {
    service: &'a str,
    roles: [&'static str; 1],
}

#[derive(Serialize)]
struct Claims<'a> {
    data: ServiceClaims<'a>,
    iat: i64,
    exp: i64,
}

/// HTTP + `graphql-ws` transport to a Prisma-style service
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    secret: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: &str, secret: Option<String>) -> Result<Self, BindingError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| BindingError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            secret,
        })
    }

    /// `<service>@<stage>` derived from the endpoint path
    pub fn service_name(&self) -> String {
        let mut segments = self
            .endpoint
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|segment| !segment.is_empty());
        let service = segments.next().unwrap_or("default");
        let stage = segments.next().unwrap_or("default");
        format!("{service}@{stage}")
    }

    /// Short-lived service token signed with the configured secret
    pub fn token(&self) -> Result<Option<String>, BindingError> {
        let Some(secret) = &self.secret else {
            return Ok(None);
        };
        let service = self.service_name();
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            data: ServiceClaims {
                service: &service,
                roles: ["admin"],
            },
            iat,
            exp: iat + 3600,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(Some(token))
    }

    fn ws_endpoint(&self) -> String {
        let mut endpoint = self.endpoint.clone();
        let scheme = if endpoint.scheme() == "https" { "wss" } else { "ws" };
        // http(s) -> ws(s) is always a valid scheme change
        let _ = endpoint.set_scheme(scheme);
        endpoint.to_string()
    }
}

impl Transport for HttpTransport {
    fn request(&self, document: String) -> BoxFuture<'_, Result<Value, BindingError>> {
        Box::pin(async move {
            let mut request = self
                .client
                .post(self.endpoint.clone())
                .json(&json!({ "query": document }));
            if let Some(token) = self.token()? {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;
            // Rejections may arrive with a failure status and a GraphQL body
            let failure = response.error_for_status_ref().err();
            let body = response.bytes().await?;
            match (serde_json::from_slice::<RemoteResponse>(&body), failure) {
                (Ok(remote), Some(_)) if !remote.errors.is_empty() => {
                    Err(BindingError::Upstream(remote.errors))
                }
                (_, Some(failure)) => Err(BindingError::Http(failure)),
                (Ok(remote), None) => remote.into_data(),
                (Err(e), None) => Err(BindingError::InvalidResponse(e.to_string())),
            }
        })
    }

    fn subscribe(&self, document: String) -> BoxFuture<'_, Result<DataStream, BindingError>> {
        Box::pin(async move {
            let mut request = self.ws_endpoint().into_client_request()?;
            request
                .headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("graphql-ws"));

            let (mut socket, _) = connect_async(request).await?;

            let payload = match self.token()? {
                Some(token) => json!({ "Authorization": format!("Bearer {token}") }),
                None => json!({}),
            };
            send_json(&mut socket, json!({ "type": "connection_init", "payload": payload }))
                .await?;
            wait_for_ack(&mut socket).await?;
            send_json(
                &mut socket,
                json!({ "id": "1", "type": "start", "payload": { "query": document } }),
            )
            .await?;

            debug!(endpoint = %self.endpoint, "subscription started");
            Ok(data_frames(socket))
        })
    }
}

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Message of the legacy `graphql-ws` protocol
#[derive(Debug, Deserialize)]
struct ProtocolMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

async fn send_json(socket: &mut Socket, message: serde_json::Value) -> Result<(), BindingError> {
    socket.send(Message::Text(message.to_string().into())).await?;
    Ok(())
}

async fn wait_for_ack(socket: &mut Socket) -> Result<(), BindingError> {
    while let Some(message) = socket.next().await {
        if let Message::Text(text) = message? {
            let message: ProtocolMessage = serde_json::from_str(text.as_str())
                .map_err(|e| BindingError::WebSocket(e.to_string()))?;
            match message.kind.as_str() {
                "connection_ack" => return Ok(()),
                "connection_error" => {
                    return Err(BindingError::WebSocket(format!(
                        "connection rejected: {}",
                        message.payload.unwrap_or_default()
                    )));
                }
                _ => {}
            }
        }
    }
    Err(BindingError::WebSocket(
        "connection closed before acknowledgement".to_string(),
    ))
}

fn data_frames(socket: Socket) -> DataStream {
    futures::stream::unfold(Some(socket), |socket| async move {
        let mut socket = socket?;
        loop {
            let message = match socket.next().await? {
                Ok(message) => message,
                Err(e) => return Some((Err(BindingError::from(e)), None)),
            };
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => return None,
                _ => continue,
            };
            let message: ProtocolMessage = match serde_json::from_str(text.as_str()) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "ignoring malformed subscription frame");
                    continue;
                }
            };
            match message.kind.as_str() {
                "data" => {
                    let item = message
                        .payload
                        .ok_or_else(|| BindingError::WebSocket("data frame without payload".into()))
                        .and_then(|payload| {
                            serde_json::from_value::<RemoteResponse>(payload)
                                .map_err(|e| BindingError::WebSocket(e.to_string()))
                        })
                        .and_then(RemoteResponse::into_data);
                    return Some((item, Some(socket)));
                }
                "error" => {
                    let errors = message
                        .payload
                        .and_then(|payload| serde_json::from_value::<UpstreamError>(payload).ok())
                        .map(|error| vec![error])
                        .unwrap_or_default();
                    return Some((Err(BindingError::Upstream(errors)), None));
                }
                "complete" => return None,
                _ => continue,
            }
        }
    })
    .boxed()
}
