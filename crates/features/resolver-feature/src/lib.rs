pub mod context;
pub mod directive;
pub mod error;
pub mod fragments;
pub mod map;
pub mod resolver;
pub mod wrap;

pub use context::OperationContext;
pub use directive::{directive_resolver, DirectiveResolver, DirectiveResolvers, Next};
pub use error::ResolverError;
pub use fragments::{
    add_fragment, always_query_id_field, extract_fragment_replacements, FragmentOverrides,
};
pub use map::{ResolverEntry, ResolverMap};
pub use resolver::{
    aliased_field_of, field_of, middleware, parent_field, resolver, subscription_middleware,
    subscription_resolver, Middleware, Resolver, SubscriptionMiddleware, SubscriptionResolver,
    ValueStream,
};
pub use wrap::{
    default_middleware, default_subscription_middleware, wrap_resolvers, wrap_subscriptions,
};
