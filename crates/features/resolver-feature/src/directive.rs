use std::future::Future;
use std::sync::Arc;

use async_graphql::{Result, Value};
use binding::{Args, ResolveInfo};
use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::context::OperationContext;

/// Resolution of the field a directive wraps; awaiting it runs the field
pub type Next = BoxFuture<'static, Result<Value>>;

/// Resolver for a schema directive: `(next, source, directive_args, context, info)`
///
/// The directive decides whether and when `next` runs and may replace its
/// result.
pub type DirectiveResolver = Arc<
    dyn Fn(Next, Value, Args, OperationContext, ResolveInfo) -> BoxFuture<'static, Result<Value>>
        + Send
        + Sync,
>;

/// Directive name → resolver
pub type DirectiveResolvers = IndexMap<String, DirectiveResolver>;

pub fn directive_resolver<F, Fut>(f: F) -> DirectiveResolver
where
    F: Fn(Next, Value, Args, OperationContext, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move |next, source, args, ctx, info| Box::pin(f(next, source, args, ctx, info)))
}
