use std::future::Future;
use std::sync::Arc;

use async_graphql::{Result, Value};
use binding::{Args, Operation, ResolveInfo, SubscriptionOperation};
use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::context::OperationContext;

/// Stream of values produced by a subscription field
pub type ValueStream = BoxStream<'static, Result<Value>>;

/// Resolves one field: `(parent, args, context, info)`
pub type Resolver = Arc<
    dyn Fn(Value, Args, OperationContext, ResolveInfo) -> BoxFuture<'static, Result<Value>>
        + Send
        + Sync,
>;

/// Starts the event stream of one subscription field
pub type SubscriptionResolver = Arc<
    dyn Fn(Value, Args, OperationContext, ResolveInfo) -> BoxFuture<'static, Result<ValueStream>>
        + Send
        + Sync,
>;

/// Hook around every forwarded query or mutation: `(resolve, parent, args, context, info)`
pub type Middleware = Arc<
    dyn Fn(Operation, Value, Args, OperationContext, ResolveInfo) -> BoxFuture<'static, Result<Value>>
        + Send
        + Sync,
>;

/// Hook around every forwarded subscription
pub type SubscriptionMiddleware = Arc<
    dyn Fn(
            SubscriptionOperation,
            Value,
            Args,
            OperationContext,
            ResolveInfo,
        ) -> BoxFuture<'static, Result<ValueStream>>
        + Send
        + Sync,
>;

pub fn resolver<F, Fut>(f: F) -> Resolver
where
    F: Fn(Value, Args, OperationContext, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info)))
}

pub fn subscription_resolver<F, Fut>(f: F) -> SubscriptionResolver
where
    F: Fn(Value, Args, OperationContext, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ValueStream>> + Send + 'static,
{
    Arc::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info)))
}

pub fn middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(Operation, Value, Args, OperationContext, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move |resolve, parent, args, ctx, info| Box::pin(f(resolve, parent, args, ctx, info)))
}

pub fn subscription_middleware<F, Fut>(f: F) -> SubscriptionMiddleware
where
    F: Fn(SubscriptionOperation, Value, Args, OperationContext, ResolveInfo) -> Fut
        + Send
        + Sync
        + 'static,
    Fut: Future<Output = Result<ValueStream>> + Send + 'static,
{
    Arc::new(move |subscribe, parent, args, ctx, info| {
        Box::pin(f(subscribe, parent, args, ctx, info))
    })
}

/// Resolver returning the parent's value for the field, or null when absent
pub fn parent_field(name: impl Into<String>) -> Resolver {
    let name = name.into();
    resolver(move |parent, _args, _ctx, info: ResolveInfo| {
        let value = aliased_field_of(&parent, info.alias.as_deref(), &name);
        async move { Ok(value) }
    })
}

/// `parent[name]` of an object value
pub fn field_of(parent: &Value, name: &str) -> Value {
    match parent {
        Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// `parent[alias]` when the parent was fetched with the field's alias,
/// otherwise `parent[name]`
pub fn aliased_field_of(parent: &Value, alias: Option<&str>, name: &str) -> Value {
    if let (Some(alias), Value::Object(map)) = (alias, parent) {
        if let Some(value) = map.get(alias) {
            return value.clone();
        }
    }
    field_of(parent, name)
}
