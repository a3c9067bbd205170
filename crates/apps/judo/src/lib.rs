pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod host;
pub mod http;
pub mod judo;
pub mod schema;
pub mod stages;

pub use config::{GraphqlFiles, JudoConfig, PrismaConfig, SchemaSource};
pub use context::{ConnectionParams, ContextFn, ContextProvider, ContextSource, ContextValues};
pub use error::JudoError;
pub use format::{format_error, format_response, FormattingExecutor};
pub use host::{HostServer, SubscriptionServer};
pub use http::{router, AppState, GraphQLBody};
pub use judo::Judo;
pub use schema::{build_schema, type_ref};
pub use stages::{always_query_id, init_binding, merge_type_defs, prepare_resolvers};
