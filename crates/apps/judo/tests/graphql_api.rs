//! BDD-style integration tests for the GraphQL server
//!
//! The data-access service is replaced by a scripted transport that records
//! every forwarded document. Assertions go through `serde_json::Value` and
//! only look at the fields relevant to each behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_graphql::{value, Executor, Request, Value, Variables};
use axum::body::Body;
use axum::http::{self, HeaderMap, Method, StatusCode, Uri};
use binding::{BindingError, DataStream, Transport, UpstreamError};
use futures::future::BoxFuture;
use futures::StreamExt;
use judo::{
    ContextProvider, ContextSource, ContextValues, FormattingExecutor, GraphqlFiles, HostServer,
    Judo, JudoConfig, JudoError, SchemaSource,
};
use resolver_feature::{
    directive_resolver, middleware, resolver, ResolverEntry, ResolverMap, OperationContext,
};
use serde_json::json;
use tower::ServiceExt;

const PRISMA_SDL: &str = r#"
    type Query {
        users(where: UserWhereInput): [User!]!
        user(id: ID!): User
        node(id: ID!): Node
    }
    type Mutation {
        createUser(name: String!): User!
    }
    type Subscription {
        user: UserSubscriptionPayload
    }
    type UserSubscriptionPayload {
        mutation: MutationType!
        node: User
    }
    enum MutationType { CREATED UPDATED DELETED }
    input UserWhereInput { name: String }
    interface Node { id: ID! }
    type User implements Node {
        id: ID!
        name: String!
        email: String
        friend(id: ID!): User
    }
"#;

const DATAMODEL: &str = r#"
    type User {
        id: ID! @unique
        name: String!
        email: String
    }
"#;

/// Data-access transport answering every request with the same payload
struct ScriptedTransport {
    documents: Mutex<Vec<String>>,
    response: Result<Value, Vec<UpstreamError>>,
    events: Vec<Value>,
}

impl ScriptedTransport {
    fn responding(data: Value) -> Arc<Self> {
        Arc::new(Self {
            documents: Mutex::new(Vec::new()),
            response: Ok(data),
            events: Vec::new(),
        })
    }

    fn failing(errors: Vec<UpstreamError>) -> Arc<Self> {
        Arc::new(Self {
            documents: Mutex::new(Vec::new()),
            response: Err(errors),
            events: Vec::new(),
        })
    }

    fn pushing(events: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            documents: Mutex::new(Vec::new()),
            response: Ok(Value::Null),
            events,
        })
    }

    fn documents(&self) -> Vec<String> {
        self.documents.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn request(&self, document: String) -> BoxFuture<'_, Result<Value, BindingError>> {
        self.documents.lock().unwrap().push(document);
        let response = self.response.clone().map_err(BindingError::Upstream);
        Box::pin(async move { response })
    }

    fn subscribe(&self, document: String) -> BoxFuture<'_, Result<DataStream, BindingError>> {
        self.documents.lock().unwrap().push(document);
        let events = self.events.clone();
        Box::pin(async move { Ok(futures::stream::iter(events.into_iter().map(Ok)).boxed()) })
    }
}

fn config() -> JudoConfig {
    JudoConfig {
        graphql_files: GraphqlFiles {
            prisma: Some(SchemaSource::inline(PRISMA_SDL)),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn http_source() -> ContextSource {
    ContextSource::Request {
        method: Method::POST,
        uri: Uri::from_static("/graphql"),
        headers: HeaderMap::new(),
    }
}

/// Helper to execute a GraphQL query and return the response as JSON
async fn execute(judo: &Judo, query: &str) -> serde_json::Value {
    let response = judo.execute(Request::new(query), http_source()).await;
    serde_json::to_value(&response).expect("Failed to serialize response")
}

/// Assert that a response has no errors
fn assert_no_errors(response: &serde_json::Value) {
    let errors = &response["errors"];
    assert!(
        errors.is_null() || errors.as_array().map(|a| a.is_empty()).unwrap_or(true),
        "Expected no errors, got: {}",
        serde_json::to_string_pretty(errors).unwrap()
    );
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

// =============================================================================
// Query And Mutation Forwarding
// =============================================================================

#[tokio::test]
async fn query_is_forwarded_to_the_data_access_client() {
    // Given a server over a data-access service holding one user
    let transport = ScriptedTransport::responding(value!({ "users": [{ "name": "Ada" }] }));
    let judo = Judo::with_transport(config(), transport.clone()).unwrap();

    // When a client queries users with a filter
    let response = execute(&judo, r#"{ users(where: { name: "Ada" }) { name } }"#).await;

    // Then the data-access result is returned
    assert_no_errors(&response);
    assert_eq!(response["data"]["users"][0]["name"], "Ada");

    // And the forwarded document carries the arguments and selection
    assert_eq!(
        transport.documents(),
        vec![r#"query { users(where: {name: "Ada"}) { name } }"#.to_string()]
    );
}

#[tokio::test]
async fn mutation_runs_through_the_mutation_middleware() {
    // Given a mutation middleware counting its calls
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = {
        let calls = calls.clone();
        middleware(move |resolve, _parent, args, _ctx, info| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { resolve(args, info).await.map_err(async_graphql::Error::from) }
        })
    };
    let transport = ScriptedTransport::responding(value!({ "createUser": { "id": "u2" } }));
    let judo = Judo::with_transport(
        JudoConfig {
            mutation_middleware: Some(counted),
            ..config()
        },
        transport.clone(),
    )
    .unwrap();

    // When a client creates a user
    let response = execute(&judo, r#"mutation { createUser(name: "Grace") { id } }"#).await;

    // Then the middleware ran once and the result came back
    assert_no_errors(&response);
    assert_eq!(response["data"]["createUser"]["id"], "u2");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(transport.documents()[0].starts_with("mutation { createUser"));
}

#[tokio::test]
async fn always_query_id_fetches_the_id_alongside_fields() {
    // Given the id plugin over a datamodel
    let transport = ScriptedTransport::responding(value!({ "users": [{ "name": "Ada", "id": "u1" }] }));
    let judo = Judo::with_transport(
        JudoConfig {
            graphql_files: GraphqlFiles {
                datamodel: Some(SchemaSource::inline(DATAMODEL)),
                prisma: Some(SchemaSource::inline(PRISMA_SDL)),
                type_defs: Vec::new(),
            },
            always_query_id: true,
            ..config()
        },
        transport.clone(),
    )
    .unwrap();

    // When a client selects only the name
    let response = execute(&judo, "{ users { name } }").await;

    // Then the id is fetched too, and the name still resolves
    assert_no_errors(&response);
    assert_eq!(response["data"]["users"][0]["name"], "Ada");
    assert_eq!(transport.documents(), vec!["query { users { name id } }".to_string()]);
}

#[tokio::test]
async fn interface_results_resolve_to_their_concrete_type() {
    // Given a data-access service returning a User through the Node interface
    let transport = ScriptedTransport::responding(value!({
        "node": { "__typename": "User", "id": "u1", "name": "Ada" }
    }));
    let judo = Judo::with_transport(config(), transport.clone()).unwrap();

    // When a client selects through an inline fragment
    let response = execute(&judo, r#"{ node(id: "u1") { id ... on User { name } } }"#).await;

    // Then the concrete type's fields resolve
    assert_no_errors(&response);
    assert_eq!(response["data"]["node"]["id"], "u1");
    assert_eq!(response["data"]["node"]["name"], "Ada");
    // And member fields are forwarded under their type condition
    assert_eq!(
        transport.documents(),
        vec![r#"query { node(id: "u1") { id __typename ... on User { name } } }"#.to_string()]
    );
}

#[tokio::test]
async fn named_fragments_keep_their_type_condition() {
    // Given a data-access service returning a User through the Node interface
    let transport = ScriptedTransport::responding(value!({
        "node": { "__typename": "User", "name": "Ada" }
    }));
    let judo = Judo::with_transport(config(), transport.clone()).unwrap();

    // When a client selects through a fragment spread
    let response = execute(
        &judo,
        r#"query { node(id: "u1") { ...UserName } } fragment UserName on User { name }"#,
    )
    .await;

    // Then the spread is forwarded as an inline fragment on the same type
    assert_no_errors(&response);
    assert_eq!(response["data"]["node"]["name"], "Ada");
    assert_eq!(
        transport.documents(),
        vec![r#"query { node(id: "u1") { __typename ... on User { name } } }"#.to_string()]
    );
}

#[tokio::test]
async fn aliased_fields_with_different_arguments_stay_apart() {
    // Given a data-access service answering under the forwarded aliases
    let transport = ScriptedTransport::responding(value!({
        "user": { "a": { "name": "Alan" }, "b": { "name": "Barbara" } }
    }));
    let judo = Judo::with_transport(config(), transport.clone()).unwrap();

    // When a client selects the same field twice with different arguments
    let request = Request::new(
        r#"query Friends($other: ID!) {
            user(id: "1") { a: friend(id: "2") { name } b: friend(id: $other) { name } }
        }"#,
    )
    .variables(Variables::from_json(json!({ "other": "3" })));
    let response = judo.execute(request, http_source()).await;
    let response = serde_json::to_value(&response).unwrap();

    // Then each alias gets its own friend
    assert_no_errors(&response);
    assert_eq!(response["data"]["user"]["a"]["name"], "Alan");
    assert_eq!(response["data"]["user"]["b"]["name"], "Barbara");
    // And both selections were forwarded with their aliases and arguments
    assert_eq!(
        transport.documents(),
        vec![
            r#"query { user(id: "1") { a: friend(id: "2") { name } b: friend(id: "3") { name } } }"#
                .to_string()
        ]
    );
}

// =============================================================================
// Custom Resolvers, Context And Directives
// =============================================================================

#[tokio::test]
async fn custom_resolvers_read_caller_context() {
    // Given an extra `me` field resolved from static context values
    let me = resolver(|_parent, _args, ctx: OperationContext, _info| async move {
        let user = ctx.get("user").cloned().unwrap_or_default();
        Value::from_json(user).map_err(async_graphql::Error::from)
    });
    let mut values = ContextValues::new();
    values.insert("user".to_string(), json!({ "id": "u9", "name": "Grace" }));
    let transport = ScriptedTransport::responding(Value::Null);
    let judo = Judo::with_transport(
        JudoConfig {
            graphql_files: GraphqlFiles {
                prisma: Some(SchemaSource::inline(PRISMA_SDL)),
                type_defs: vec![SchemaSource::inline("type Query { me: User }")],
                ..Default::default()
            },
            resolvers: vec![ResolverMap::new().with_resolver("Query", "me", me)],
            context: ContextProvider::Static(values),
            ..config()
        },
        transport.clone(),
    )
    .unwrap();

    // When a client asks who they are
    let response = execute(&judo, "{ me { id name } }").await;

    // Then the context value is returned without touching the data-access service
    assert_no_errors(&response);
    assert_eq!(response["data"]["me"]["name"], "Grace");
    assert!(transport.documents().is_empty());
}

#[tokio::test]
async fn later_resolver_maps_win() {
    let constant = |text: &'static str| {
        resolver(move |_parent, _args, _ctx, _info| async move { Ok(Value::from(text)) })
    };
    let judo = Judo::with_transport(
        JudoConfig {
            graphql_files: GraphqlFiles {
                prisma: Some(SchemaSource::inline(PRISMA_SDL)),
                type_defs: vec![SchemaSource::inline("type Query { greeting: String }")],
                ..Default::default()
            },
            resolvers: vec![
                ResolverMap::new().with_resolver("Query", "greeting", constant("first")),
                ResolverMap::new().with_resolver("Query", "greeting", constant("second")),
            ],
            ..config()
        },
        ScriptedTransport::responding(Value::Null),
    )
    .unwrap();

    let response = execute(&judo, "{ greeting }").await;

    assert_no_errors(&response);
    assert_eq!(response["data"]["greeting"], "second");
}

#[tokio::test]
async fn directive_resolvers_wrap_annotated_fields() {
    // Given User.name annotated with @upper and a resolver for it
    let upper = directive_resolver(|next, _source, _args, _ctx, _info| async move {
        match next.await {
            Ok(Value::String(name)) => Ok(Value::String(name.to_uppercase())),
            other => other,
        }
    });
    let mut config = JudoConfig {
        graphql_files: GraphqlFiles {
            prisma: Some(SchemaSource::inline(PRISMA_SDL)),
            type_defs: vec![SchemaSource::inline("type User { name: String! @upper }")],
            ..Default::default()
        },
        ..config()
    };
    config.directive_resolvers.insert("upper".to_string(), upper);
    let transport = ScriptedTransport::responding(value!({ "users": [{ "name": "Ada" }] }));
    let judo = Judo::with_transport(config, transport).unwrap();

    // When the field is queried
    let response = execute(&judo, "{ users { name } }").await;

    // Then the directive transformed the value
    assert_no_errors(&response);
    assert_eq!(response["data"]["users"][0]["name"], "ADA");
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn upstream_error_code_reaches_the_client() {
    // Given a data-access service rejecting the caller
    let transport = ScriptedTransport::failing(vec![UpstreamError::new("Not authorized")
        .with_code("AUTH_FAILED")
        .with_request_id("req-7")]);
    let judo = Judo::with_transport(config(), transport).unwrap();

    // When a client queries
    let response = execute(&judo, "{ users { name } }").await;

    // Then the error carries the upstream code and request id
    let error = &response["errors"][0];
    assert_eq!(error["message"], "Not authorized");
    assert_eq!(error["extensions"]["code"], "AUTH_FAILED");
    assert_eq!(error["extensions"]["requestId"], "req-7");
}

#[test]
fn resolver_for_unknown_field_is_fatal() {
    let result = Judo::with_transport(
        JudoConfig {
            resolvers: vec![ResolverMap::new().with_resolver(
                "User",
                "nickname",
                resolver(|_parent, _args, _ctx, _info| async { Ok(Value::Null) }),
            )],
            ..config()
        },
        ScriptedTransport::responding(Value::Null),
    );

    assert!(matches!(result, Err(JudoError::SchemaBuild(_))));
}

#[test]
fn plain_resolver_on_subscription_root_is_fatal() {
    let result = Judo::with_transport(
        JudoConfig {
            resolvers: vec![ResolverMap::from_fields(
                "Subscription",
                [(
                    "user".to_string(),
                    ResolverEntry::resolve(resolver(|_parent, _args, _ctx, _info| async {
                        Ok(Value::Null)
                    })),
                )],
            )],
            ..config()
        },
        ScriptedTransport::responding(Value::Null),
    );

    assert!(matches!(result, Err(JudoError::SchemaBuild(_))));
}

#[test]
fn missing_data_access_schema_is_a_config_error() {
    let result = Judo::with_transport(JudoConfig::default(), ScriptedTransport::responding(Value::Null));

    assert!(matches!(result, Err(JudoError::Config(_))));
}

// =============================================================================
// Subscriptions
// =============================================================================

#[tokio::test]
async fn subscription_events_are_forwarded() {
    // Given a data-access service pushing one user event
    let transport = ScriptedTransport::pushing(vec![value!({
        "user": { "mutation": "CREATED", "node": { "name": "Ada" } }
    })]);
    let judo = Judo::with_transport(config(), transport.clone()).unwrap();
    let context = judo.context(http_source()).await.unwrap();

    // When a client subscribes
    let executor = FormattingExecutor::new(judo.schema().clone());
    let responses: Vec<_> = executor
        .execute_stream(
            Request::new("subscription { user { mutation node { name } } }").data(context),
            None,
        )
        .collect()
        .await;

    // Then the event is delivered narrowed to the field
    assert_eq!(responses.len(), 1);
    assert!(responses[0].errors.is_empty(), "{:?}", responses[0].errors);
    assert_eq!(
        serde_json::to_value(&responses[0].data).unwrap(),
        json!({ "user": { "mutation": "CREATED", "node": { "name": "Ada" } } })
    );
    assert_eq!(
        transport.documents(),
        vec!["subscription { user { mutation node { name } } }".to_string()]
    );
}

// =============================================================================
// HTTP Endpoints
// =============================================================================

fn host_with(judo: Judo) -> HostServer {
    let host = HostServer::new();
    Arc::new(judo).install(&host);
    host
}

#[tokio::test]
async fn post_endpoint_accepts_json_bodies() {
    let transport = ScriptedTransport::responding(value!({ "users": [{ "name": "Ada" }] }));
    let host = host_with(Judo::with_transport(config(), transport).unwrap());

    let response = host
        .router()
        .oneshot(
            http::Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "query": "{ users { name } }" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_no_errors(&body);
    assert_eq!(body["data"]["users"][0]["name"], "Ada");
}

#[tokio::test]
async fn post_endpoint_accepts_raw_graphql_documents() {
    let transport = ScriptedTransport::responding(value!({ "users": [{ "name": "Ada" }] }));
    let host = host_with(Judo::with_transport(config(), transport).unwrap());

    let response = host
        .router()
        .oneshot(
            http::Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("content-type", "application/graphql")
                .body(Body::from("{ users { name } }"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["data"]["users"][0]["name"], "Ada");
}

#[tokio::test]
async fn request_headers_reach_the_context_provider() {
    // Given a context provider reading the authorization header
    let provider = ContextProvider::dynamic(|source: ContextSource| async move {
        let mut values = ContextValues::new();
        if let Some(token) = source
            .headers()
            .and_then(|headers| headers.get("authorization"))
            .and_then(|value| value.to_str().ok())
        {
            values.insert("token".to_string(), json!(token));
        }
        Ok(values)
    });
    let token = resolver(|_parent, _args, ctx: OperationContext, _info| async move {
        Value::from_json(ctx.get("token").cloned().unwrap_or_default())
            .map_err(async_graphql::Error::from)
    });
    let judo = Judo::with_transport(
        JudoConfig {
            graphql_files: GraphqlFiles {
                prisma: Some(SchemaSource::inline(PRISMA_SDL)),
                type_defs: vec![SchemaSource::inline("type Query { token: String }")],
                ..Default::default()
            },
            resolvers: vec![ResolverMap::new().with_resolver("Query", "token", token)],
            context: provider,
            ..config()
        },
        ScriptedTransport::responding(Value::Null),
    )
    .unwrap();
    let host = host_with(judo);

    // When a request carries the header
    let response = host
        .router()
        .oneshot(
            http::Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("content-type", "application/json")
                .header("authorization", "Bearer abc")
                .body(Body::from(json!({ "query": "{ token }" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Then the resolver sees the value derived from it
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["data"]["token"], "Bearer abc");
}

#[tokio::test]
async fn playground_is_served_with_the_endpoint() {
    let host = host_with(Judo::with_transport(config(), ScriptedTransport::responding(Value::Null)).unwrap());

    let response = host
        .router()
        .oneshot(
            http::Request::builder()
                .uri("/playground")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("GraphQL Playground"));
    assert!(html.contains("/graphql"));
}

#[tokio::test]
async fn health_check_responds_ok() {
    let host = HostServer::new();

    let response = host
        .router()
        .oneshot(http::Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}
