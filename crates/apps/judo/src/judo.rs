use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, ServerError};
use binding::{Binding, Transport};
use resolver_feature::OperationContext;
use tracing::{debug, info};
use typedefs_feature::TypeDefs;

use crate::config::JudoConfig;
use crate::context::ContextSource;
use crate::error::JudoError;
use crate::format::format_response;
use crate::host::{HostServer, SubscriptionServer};
use crate::http;
use crate::schema::build_schema;
use crate::stages::{always_query_id, init_binding, merge_type_defs, prepare_resolvers};

/// An initialized server instance: data-access client plus executable schema
pub struct Judo {
    config: JudoConfig,
    binding: Arc<Binding>,
    type_defs: TypeDefs,
    schema: Schema,
}

impl Judo {
    /// Run every initialization stage
    pub fn build(config: JudoConfig) -> Result<Self, JudoError> {
        Self::build_with(config, None)
    }

    /// Same as [`Judo::build`] over an injected data-access transport
    pub fn with_transport(
        config: JudoConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, JudoError> {
        Self::build_with(config, Some(transport))
    }

    fn build_with(
        config: JudoConfig,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self, JudoError> {
        config.validate()?;

        let id_overrides = always_query_id(&config)?;
        let id_fragments = id_overrides
            .as_ref()
            .map(|overrides| overrides.fragments.as_slice())
            .unwrap_or_default();
        let binding = Arc::new(init_binding(&config, id_fragments, transport)?);

        let type_defs = merge_type_defs(&config)?;
        let resolvers = prepare_resolvers(&config, &type_defs, &binding, id_overrides.as_ref());
        let schema = build_schema(&type_defs, &resolvers, &config.directive_resolvers)?;

        info!(endpoint = %config.endpoint, playground = %config.playground, "Server instance built");
        Ok(Self {
            config,
            binding,
            type_defs,
            schema,
        })
    }

    /// Build a fresh instance and install it on `host`
    pub fn init(config: JudoConfig, host: &HostServer) -> Result<Arc<Self>, JudoError> {
        let _guard = host.init_guard();
        let judo = Arc::new(Self::build(config)?);
        judo.clone().install(host);
        Ok(judo)
    }

    /// The instance already installed on `host`, or a fresh one
    pub fn get_or_init(config: JudoConfig, host: &HostServer) -> Result<Arc<Self>, JudoError> {
        let _guard = host.init_guard();
        if let Some(existing) = host.judo() {
            debug!("Reusing installed server instance");
            return Ok(existing);
        }
        let judo = Arc::new(Self::build(config)?);
        judo.clone().install(host);
        Ok(judo)
    }

    /// Attach this instance's HTTP and WebSocket endpoints to `host`
    ///
    /// Returns the host generation it was installed as.
    pub fn install(self: Arc<Self>, host: &HostServer) -> u64 {
        let subscriptions = Arc::new(SubscriptionServer::new());
        let router = http::router(self.clone(), subscriptions.clone());
        host.install(self, router, subscriptions)
    }

    /// Context for one request or connection; `db` is always the client
    pub async fn context(&self, source: ContextSource) -> async_graphql::Result<OperationContext> {
        let values = self.config.context.values(source).await?;
        Ok(OperationContext::new(self.binding.clone(), values))
    }

    /// Execute a query or mutation with a context derived from `source`
    pub async fn execute(&self, request: impl Into<Request>, source: ContextSource) -> Response {
        let context = match self.context(source).await {
            Ok(context) => context,
            Err(error) => {
                return format_response(Response::from_errors(vec![ServerError {
                    message: error.message,
                    source: error.source,
                    locations: Vec::new(),
                    path: Vec::new(),
                    extensions: error.extensions,
                }]));
            }
        };
        let request = request.into().data(context);
        format_response(self.schema.execute(request).await)
    }

    pub fn config(&self) -> &JudoConfig {
        &self.config
    }

    pub fn binding(&self) -> &Arc<Binding> {
        &self.binding
    }

    pub fn type_defs(&self) -> &TypeDefs {
        &self.type_defs
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}
