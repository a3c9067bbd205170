use std::future::Future;
use std::sync::Arc;

use async_graphql::parser::parse_schema;
use async_graphql::Value;
use futures::future::BoxFuture;
use futures::StreamExt;
use indexmap::IndexMap;
use tracing::{info, trace};

use crate::document::DocumentBuilder;
use crate::error::{BindingError, OperationKind};
use crate::fragment::{FragmentReplacement, ParsedReplacement};
use crate::info::{Args, ResolveInfo};
use crate::transport::{DataStream, HttpTransport, Transport};
use crate::type_index::{RootField, TypeIndex};

/// A query or mutation exposed by the data-access client
pub type Operation =
    Arc<dyn Fn(Args, ResolveInfo) -> BoxFuture<'static, Result<Value, BindingError>> + Send + Sync>;

/// A subscription exposed by the data-access client
pub type SubscriptionOperation = Arc<
    dyn Fn(Args, ResolveInfo) -> BoxFuture<'static, Result<DataStream, BindingError>>
        + Send
        + Sync,
>;

/// Operations keyed by root field name
pub type OperationMap<T> = IndexMap<String, T>;

/// Wrap an async closure as an [`Operation`]
pub fn operation<F, Fut>(f: F) -> Operation
where
    F: Fn(Args, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BindingError>> + Send + 'static,
{
    Arc::new(move |args, info| Box::pin(f(args, info)))
}

/// Wrap an async closure as a [`SubscriptionOperation`]
pub fn subscription_operation<F, Fut>(f: F) -> SubscriptionOperation
where
    F: Fn(Args, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DataStream, BindingError>> + Send + 'static,
{
    Arc::new(move |args, info| Box::pin(f(args, info)))
}

/// Connection settings for the data-access client
#[derive(Debug, Clone)]
pub struct BindingConfig {
    /// SDL of the data-access layer
    pub type_defs: String,
    pub endpoint: String,
    pub secret: Option<String>,
    /// Log every forwarded document at info level
    pub debug: bool,
    pub fragment_replacements: Vec<FragmentReplacement>,
}

/// Generated data-access client: one operation per root field of the
/// data-access schema.
pub struct Binding {
    pub query: OperationMap<Operation>,
    pub mutation: OperationMap<Operation>,
    pub subscription: OperationMap<SubscriptionOperation>,
}

impl Binding {
    /// Create a client talking to the configured endpoint
    pub fn new(config: BindingConfig) -> Result<Self, BindingError> {
        let transport = HttpTransport::new(&config.endpoint, config.secret)?;
        info!(endpoint = %config.endpoint, "Data-access client configured");
        Self::with_transport(
            &config.type_defs,
            &config.fragment_replacements,
            config.debug,
            Arc::new(transport),
        )
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(
        type_defs: &str,
        fragment_replacements: &[FragmentReplacement],
        debug: bool,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, BindingError> {
        let document =
            parse_schema(type_defs).map_err(|e| BindingError::InvalidTypeDefs(e.to_string()))?;
        let replacements = fragment_replacements
            .iter()
            .map(ParsedReplacement::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let forwarder = Arc::new(Forwarder {
            transport,
            index: TypeIndex::from_document(&document),
            replacements,
            debug,
        });

        let query = forwarder
            .index
            .query
            .iter()
            .map(|root| (root.name.clone(), forwarder.operation(OperationKind::Query, root)))
            .collect();
        let mutation = forwarder
            .index
            .mutation
            .iter()
            .map(|root| (root.name.clone(), forwarder.operation(OperationKind::Mutation, root)))
            .collect();
        let subscription = forwarder
            .index
            .subscription
            .iter()
            .map(|root| (root.name.clone(), forwarder.subscription(root)))
            .collect();

        Ok(Self {
            query,
            mutation,
            subscription,
        })
    }

    /// Look up a query or mutation operation
    pub fn operation(&self, kind: OperationKind, name: &str) -> Result<Operation, BindingError> {
        let operations = match kind {
            OperationKind::Query => &self.query,
            OperationKind::Mutation => &self.mutation,
            OperationKind::Subscription => {
                return Err(BindingError::UnknownOperation {
                    kind,
                    name: name.to_string(),
                });
            }
        };
        operations
            .get(name)
            .cloned()
            .ok_or_else(|| BindingError::UnknownOperation {
                kind,
                name: name.to_string(),
            })
    }

    /// Look up a subscription operation
    pub fn subscription_operation(&self, name: &str) -> Result<SubscriptionOperation, BindingError> {
        self.subscription
            .get(name)
            .cloned()
            .ok_or_else(|| BindingError::UnknownOperation {
                kind: OperationKind::Subscription,
                name: name.to_string(),
            })
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("query", &self.query.keys().collect::<Vec<_>>())
            .field("mutation", &self.mutation.keys().collect::<Vec<_>>())
            .field("subscription", &self.subscription.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct Forwarder {
    transport: Arc<dyn Transport>,
    index: TypeIndex,
    replacements: Vec<ParsedReplacement>,
    debug: bool,
}

impl Forwarder {
    fn render(&self, kind: OperationKind, root: &RootField, args: &Args, info: &ResolveInfo) -> String {
        let builder = DocumentBuilder {
            index: &self.index,
            replacements: &self.replacements,
        };
        let document = builder.render(kind, &root.name, &root.type_name, args, &info.selection);
        if self.debug {
            info!(%kind, field = %root.name, %document, "Forwarding operation");
        } else {
            trace!(%kind, field = %root.name, %document, "Forwarding operation");
        }
        document
    }

    fn operation(self: &Arc<Self>, kind: OperationKind, root: &RootField) -> Operation {
        let forwarder = Arc::clone(self);
        let root = root.clone();
        operation(move |args, info| {
            let forwarder = Arc::clone(&forwarder);
            let root = root.clone();
            async move {
                let document = forwarder.render(kind, &root, &args, &info);
                let data = forwarder.transport.request(document).await?;
                field_data(data, &root.name)
            }
        })
    }

    fn subscription(self: &Arc<Self>, root: &RootField) -> SubscriptionOperation {
        let forwarder = Arc::clone(self);
        let root = root.clone();
        subscription_operation(move |args, info| {
            let forwarder = Arc::clone(&forwarder);
            let root = root.clone();
            async move {
                let document = forwarder.render(OperationKind::Subscription, &root, &args, &info);
                let stream = forwarder.transport.subscribe(document).await?;
                let field = root.name;
                Ok(stream
                    .map(move |data| data.and_then(|data| field_data(data, &field)))
                    .boxed())
            }
        })
    }
}

/// `data[field]` of a response
fn field_data(data: Value, field: &str) -> Result<Value, BindingError> {
    match data {
        Value::Object(mut map) => map
            .shift_remove(field)
            .ok_or_else(|| BindingError::MissingData(field.to_string())),
        _ => Err(BindingError::MissingData(field.to_string())),
    }
}
