use std::sync::Arc;

use async_graphql::Error;
use binding::{Operation, OperationMap};
use futures::StreamExt;
use indexmap::IndexMap;

use crate::resolver::{
    middleware, resolver, subscription_middleware, subscription_resolver, Middleware, Resolver,
    SubscriptionMiddleware, SubscriptionResolver, ValueStream,
};

/// `(resolve, parent, args, context, info) => resolve(args, info)`
pub fn default_middleware() -> Middleware {
    middleware(|resolve: Operation, _parent, args, _ctx, info| async move {
        resolve(args, info).await.map_err(Error::from)
    })
}

/// Hands the subscription's event stream through unchanged
pub fn default_subscription_middleware() -> SubscriptionMiddleware {
    subscription_middleware(|subscribe, _parent, args, _ctx, info| async move {
        subscribe(args, info)
            .await
            .map(|events| -> ValueStream { events.map(|event| event.map_err(Error::from)).boxed() })
            .map_err(Error::from)
    })
}

/// Wrap every operation in `operations` so that invoking the field calls
/// `middleware(resolve, parent, args, context, info)` once.
pub fn wrap_resolvers(
    middleware: Option<Middleware>,
    operations: &OperationMap<Operation>,
) -> IndexMap<String, Resolver> {
    let middleware = middleware.unwrap_or_else(default_middleware);
    operations
        .iter()
        .map(|(name, resolve)| {
            let middleware = Arc::clone(&middleware);
            let resolve = Arc::clone(resolve);
            let wrapped = resolver(move |parent, args, ctx, info| {
                middleware(Arc::clone(&resolve), parent, args, ctx, info)
            });
            (name.clone(), wrapped)
        })
        .collect()
}

/// Build a `subscribe` for every field name, delegating to
/// `context.db.subscription[field]` through `middleware`.
///
/// The data-access operation is looked up when the subscription starts, so
/// a field the client does not expose fails at that point.
pub fn wrap_subscriptions<I, S>(
    middleware: Option<SubscriptionMiddleware>,
    fields: I,
) -> IndexMap<String, SubscriptionResolver>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let middleware = middleware.unwrap_or_else(default_subscription_middleware);
    fields
        .into_iter()
        .map(Into::into)
        .map(|field: String| {
            let middleware = Arc::clone(&middleware);
            let name = field.clone();
            let wrapped = subscription_resolver(move |parent, args, ctx, info| {
                let middleware = Arc::clone(&middleware);
                let subscribe = ctx.db().subscription_operation(&name);
                async move {
                    match subscribe {
                        Ok(subscribe) => middleware(subscribe, parent, args, ctx, info).await,
                        Err(e) => Err(Error::from(e)),
                    }
                }
            });
            (field, wrapped)
        })
        .collect()
}
