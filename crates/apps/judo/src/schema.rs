//! Executable schema construction
//!
//! Turns merged type definitions and a resolver map into a dynamic
//! `async-graphql` schema. Fields without a resolver read the parent's value
//! under the field's alias, falling back to `parent[field]`.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema, Subscription, SubscriptionField,
    SubscriptionFieldFuture, TypeRef, Union,
};
use async_graphql::parser::types::{BaseType, Selection, SelectionSet, Type};
use async_graphql::{Context, Error, Name, Result, Value};
use binding::{Args, ResolveInfo, SelectedField};
use futures::stream::BoxStream;
use futures::StreamExt;
use indexmap::IndexMap;
use resolver_feature::{
    aliased_field_of, DirectiveResolver, DirectiveResolvers, Next, OperationContext, Resolver,
    ResolverEntry, ResolverMap, SubscriptionResolver,
};
use tracing::{debug, info};
use typedefs_feature::{DirectiveUse, FieldDef, InputValueDef, TypeDef, TypeDefKind, TypeDefs};

use crate::error::JudoError;

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Build the executable schema
///
/// Fails when `resolvers` names a type or field the definitions lack, when a
/// subscription field has no subscribe resolver, or when the engine rejects
/// the assembled schema.
pub fn build_schema(
    type_defs: &TypeDefs,
    resolvers: &ResolverMap,
    directive_resolvers: &DirectiveResolvers,
) -> Result<Schema, JudoError> {
    check_resolvers(type_defs, resolvers)?;

    let roots = type_defs.roots();
    if type_defs.get(&roots.query).is_none() {
        return Err(JudoError::SchemaBuild(format!(
            "Query root type `{}` is not defined",
            roots.query
        )));
    }
    let mutation = type_defs.get(&roots.mutation).map(|ty| ty.name.as_str());
    let subscription = type_defs.get(&roots.subscription).map(|ty| ty.name.as_str());

    let planner = Planner {
        resolvers,
        directive_resolvers,
        abstract_types: Arc::new(
            type_defs
                .types()
                .filter(|ty| {
                    matches!(ty.kind, TypeDefKind::Interface { .. } | TypeDefKind::Union { .. })
                })
                .map(|ty| ty.name.clone())
                .collect(),
        ),
    };

    let mut builder = Schema::build(&roots.query, mutation, subscription);
    for ty in type_defs.types() {
        if BUILTIN_SCALARS.contains(&ty.name.as_str()) {
            continue;
        }
        builder = match &ty.kind {
            TypeDefKind::Object { fields, .. } if ty.name == roots.subscription => {
                builder.register(planner.subscription(ty, fields)?)
            }
            TypeDefKind::Object { implements, fields } => {
                builder.register(planner.object(ty, implements, fields))
            }
            TypeDefKind::Interface { implements, fields } => {
                builder.register(interface(ty, implements, fields))
            }
            TypeDefKind::Union { members } => {
                let mut union = Union::new(&ty.name);
                for member in members {
                    union = union.possible_type(member);
                }
                if let Some(description) = &ty.description {
                    union = union.description(description);
                }
                builder.register(union)
            }
            TypeDefKind::Enum { values } => {
                let mut enum_type = Enum::new(&ty.name);
                for value in values {
                    let mut item = EnumItem::new(&value.name);
                    if let Some(description) = &value.description {
                        item = item.description(description);
                    }
                    enum_type = enum_type.item(item);
                }
                if let Some(description) = &ty.description {
                    enum_type = enum_type.description(description);
                }
                builder.register(enum_type)
            }
            TypeDefKind::InputObject { fields } => {
                let mut input = InputObject::new(&ty.name);
                for field in fields.values() {
                    input = input.field(input_value(field));
                }
                if let Some(description) = &ty.description {
                    input = input.description(description);
                }
                builder.register(input)
            }
            TypeDefKind::Scalar => {
                let mut scalar = Scalar::new(&ty.name);
                if let Some(description) = &ty.description {
                    scalar = scalar.description(description);
                }
                builder.register(scalar)
            }
        };
    }

    let schema = builder
        .finish()
        .map_err(|e| JudoError::SchemaBuild(e.to_string()))?;
    info!(
        types = type_defs.len(),
        resolvers = resolvers.len(),
        "Executable schema built"
    );
    Ok(schema)
}

/// Reject resolvers the schema cannot honour
fn check_resolvers(type_defs: &TypeDefs, resolvers: &ResolverMap) -> Result<(), JudoError> {
    let subscription_root = &type_defs.roots().subscription;

    for (type_name, field_name, entry) in resolvers.iter() {
        let Some(ty) = type_defs.get(type_name) else {
            return Err(JudoError::SchemaBuild(format!(
                "`{type_name}` defined in resolvers, but not in schema"
            )));
        };
        if !ty.is_object() {
            return Err(JudoError::SchemaBuild(format!(
                "`{type_name}` is a {} and cannot have field resolvers",
                ty.kind.keyword()
            )));
        }
        if ty.field(field_name).is_none() {
            return Err(JudoError::SchemaBuild(format!(
                "`{type_name}.{field_name}` defined in resolvers, but not in schema"
            )));
        }
        match (entry, type_name == subscription_root.as_str()) {
            (ResolverEntry::Resolve { .. }, true) => {
                return Err(JudoError::SchemaBuild(format!(
                    "Subscription field `{field_name}` needs a subscribe resolver"
                )));
            }
            (ResolverEntry::Subscribe(_), false) => {
                return Err(JudoError::SchemaBuild(format!(
                    "`{type_name}.{field_name}` has a subscribe resolver outside the subscription root"
                )));
            }
            _ => {}
        }
    }

    if let Some(fields) = type_defs.get(subscription_root).and_then(TypeDef::fields) {
        if let Some(missing) = fields
            .keys()
            .find(|field| resolvers.get(subscription_root, field).is_none())
        {
            return Err(JudoError::SchemaBuild(format!(
                "Subscription field `{missing}` has no resolver"
            )));
        }
    }
    Ok(())
}

/// Engine type reference for a parsed SDL type
pub fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::named(name.as_str()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

fn core_type_name(ty: &Type) -> &str {
    match &ty.base {
        BaseType::Named(name) => name.as_str(),
        BaseType::List(inner) => core_type_name(inner),
    }
}

fn input_value(definition: &InputValueDef) -> InputValue {
    let mut input = InputValue::new(&definition.name, type_ref(&definition.ty));
    if let Some(default_value) = &definition.default_value {
        input = input.default_value(default_value.clone());
    }
    if let Some(description) = &definition.description {
        input = input.description(description);
    }
    input
}

fn interface(ty: &TypeDef, implements: &[String], fields: &IndexMap<String, FieldDef>) -> Interface {
    let mut interface = Interface::new(&ty.name);
    for field in fields.values() {
        let mut interface_field = InterfaceField::new(&field.name, type_ref(&field.ty));
        for argument in &field.arguments {
            interface_field = interface_field.argument(input_value(argument));
        }
        if let Some(description) = &field.description {
            interface_field = interface_field.description(description);
        }
        interface = interface.field(interface_field);
    }
    for name in implements {
        interface = interface.implement(name);
    }
    if let Some(description) = &ty.description {
        interface = interface.description(description);
    }
    interface
}

fn directive_args(directive: &DirectiveUse) -> Args {
    directive
        .arguments
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Assembles per-field plans from the resolver map
struct Planner<'s> {
    resolvers: &'s ResolverMap,
    directive_resolvers: &'s DirectiveResolvers,
    abstract_types: Arc<HashSet<String>>,
}

impl Planner<'_> {
    fn plan(&self, ty: &TypeDef, field: &FieldDef) -> FieldPlan {
        let resolve = match self.resolvers.get(&ty.name, &field.name) {
            Some(ResolverEntry::Resolve { resolve, .. }) => Some(resolve.clone()),
            _ => None,
        };
        // Object-level directives sit inside field-level ones
        let directives = ty
            .directives
            .iter()
            .chain(&field.directives)
            .filter_map(|directive| {
                self.directive_resolvers
                    .get(&directive.name)
                    .map(|resolver| (resolver.clone(), directive_args(directive)))
            })
            .collect::<Vec<_>>();
        if !directives.is_empty() {
            debug!(
                type_name = %ty.name,
                field = %field.name,
                directives = directives.len(),
                "Directive resolvers attached"
            );
        }
        FieldPlan {
            parent_type: ty.name.clone(),
            field_name: field.name.clone(),
            return_type: field.ty.clone(),
            resolve,
            directives,
            abstract_types: self.abstract_types.clone(),
        }
    }

    fn object(&self, ty: &TypeDef, implements: &[String], fields: &IndexMap<String, FieldDef>) -> Object {
        let mut object = Object::new(&ty.name);
        for definition in fields.values() {
            let plan = Arc::new(self.plan(ty, definition));
            let mut field = Field::new(&definition.name, type_ref(&definition.ty), move |ctx| {
                FieldFuture::new(resolve_field(plan.clone(), ctx))
            });
            for argument in &definition.arguments {
                field = field.argument(input_value(argument));
            }
            if let Some(description) = &definition.description {
                field = field.description(description);
            }
            object = object.field(field);
        }
        for name in implements {
            object = object.implement(name);
        }
        if let Some(description) = &ty.description {
            object = object.description(description);
        }
        object
    }

    fn subscription(
        &self,
        ty: &TypeDef,
        fields: &IndexMap<String, FieldDef>,
    ) -> Result<Subscription, JudoError> {
        let mut subscription = Subscription::new(&ty.name);
        for definition in fields.values() {
            let Some(ResolverEntry::Subscribe(subscribe)) =
                self.resolvers.get(&ty.name, &definition.name)
            else {
                return Err(JudoError::SchemaBuild(format!(
                    "Subscription field `{}` has no resolver",
                    definition.name
                )));
            };
            let plan = Arc::new(SubscriptionPlan {
                subscribe: subscribe.clone(),
                field: self.plan(ty, definition),
            });
            let mut field = SubscriptionField::new(
                &definition.name,
                type_ref(&definition.ty),
                move |ctx| SubscriptionFieldFuture::new(subscribe_field(plan.clone(), ctx)),
            );
            for argument in &definition.arguments {
                field = field.argument(input_value(argument));
            }
            if let Some(description) = &definition.description {
                field = field.description(description);
            }
            subscription = subscription.field(field);
        }
        if let Some(description) = &ty.description {
            subscription = subscription.description(description);
        }
        Ok(subscription)
    }
}

/// Everything needed to resolve one field at request time
struct FieldPlan {
    parent_type: String,
    field_name: String,
    return_type: Type,
    resolve: Option<Resolver>,
    /// Innermost first
    directives: Vec<(DirectiveResolver, Args)>,
    abstract_types: Arc<HashSet<String>>,
}

impl FieldPlan {
    fn info(&self, alias: Option<String>, selection: Vec<SelectedField>) -> ResolveInfo {
        ResolveInfo::new(
            &self.parent_type,
            &self.field_name,
            self.return_type.to_string(),
        )
        .with_alias(alias)
        .with_selection(selection)
    }

    /// The field's resolution wrapped in its directive resolvers
    fn run(&self, parent: Value, args: Args, ctx: OperationContext, info: ResolveInfo) -> Next {
        let next: Next = match &self.resolve {
            Some(resolve) => {
                let resolve = resolve.clone();
                let (parent, ctx, info) = (parent.clone(), ctx.clone(), info.clone());
                Box::pin(async move { resolve(parent, args, ctx, info).await })
            }
            None => {
                let value = aliased_field_of(&parent, info.alias.as_deref(), &self.field_name);
                Box::pin(async move { Ok(value) })
            }
        };
        self.wrap(next, &parent, &ctx, &info)
    }

    fn wrap(&self, mut next: Next, source: &Value, ctx: &OperationContext, info: &ResolveInfo) -> Next {
        for (directive, args) in &self.directives {
            next = directive(next, source.clone(), args.clone(), ctx.clone(), info.clone());
        }
        next
    }

    /// Engine value for a resolved value; abstract types are tagged with the
    /// object's `__typename`
    fn to_field_value<'a>(&self, value: Value) -> Result<Option<FieldValue<'a>>> {
        tagged(value, &self.return_type, &self.abstract_types)
    }
}

fn tagged<'a>(
    value: Value,
    ty: &Type,
    abstract_types: &HashSet<String>,
) -> Result<Option<FieldValue<'a>>> {
    if value == Value::Null {
        return Ok(None);
    }
    if !abstract_types.contains(core_type_name(ty)) {
        return Ok(Some(FieldValue::value(value)));
    }
    match (&ty.base, value) {
        (BaseType::List(inner), Value::List(items)) => {
            let items = items
                .into_iter()
                .map(|item| Ok(tagged(item, inner, abstract_types)?.unwrap_or(FieldValue::NULL)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(FieldValue::list(items)))
        }
        (_, value) => {
            let type_name = match &value {
                Value::Object(object) => match object.get("__typename") {
                    Some(Value::String(name)) => name.clone(),
                    _ => {
                        return Err(Error::new(format!(
                            "Value of abstract type `{}` carries no `__typename`",
                            core_type_name(ty)
                        )));
                    }
                },
                other => {
                    return Err(Error::new(format!(
                        "Expected an object for abstract type `{}`, got {other}",
                        core_type_name(ty)
                    )));
                }
            };
            Ok(Some(FieldValue::value(value).with_type(type_name)))
        }
    }
}

struct SubscriptionPlan {
    subscribe: SubscriptionResolver,
    field: FieldPlan,
}

/// Owned snapshot of a selection set
///
/// Fragment spreads are expanded; fields selected under an inline fragment
/// or a spread carry its type condition.
fn snapshot(
    ctx: &Context<'_>,
    selection_set: &SelectionSet,
    type_condition: Option<&str>,
    out: &mut Vec<SelectedField>,
) -> Result<()> {
    for item in &selection_set.items {
        match &item.node {
            Selection::Field(field) => {
                let field = &field.node;
                let mut selection = Vec::new();
                snapshot(ctx, &field.selection_set.node, None, &mut selection)?;
                let arguments = field
                    .arguments
                    .iter()
                    .map(|(name, value)| -> Result<(Name, Value)> {
                        let value = value
                            .node
                            .clone()
                            .into_const_with(|variable| variable_value(ctx, &variable))?;
                        Ok((name.node.clone(), value))
                    })
                    .collect::<Result<Vec<_>>>()?;
                out.push(SelectedField {
                    name: field.name.node.to_string(),
                    alias: field.alias.as_ref().map(|alias| alias.node.to_string()),
                    arguments,
                    type_condition: type_condition.map(str::to_string),
                    selection,
                });
            }
            Selection::InlineFragment(fragment) => {
                let condition = fragment
                    .node
                    .type_condition
                    .as_ref()
                    .map(|condition| condition.node.on.node.as_str())
                    .or(type_condition);
                snapshot(ctx, &fragment.node.selection_set.node, condition, out)?;
            }
            Selection::FragmentSpread(spread) => {
                let Some(fragment) = ctx.query_env.fragments.get(&spread.node.fragment_name.node)
                else {
                    continue;
                };
                let condition = fragment.node.type_condition.node.on.node.as_str();
                snapshot(ctx, &fragment.node.selection_set.node, Some(condition), out)?;
            }
        }
    }
    Ok(())
}

/// Value of `$name` in the current operation, or its declared default
fn variable_value(ctx: &Context<'_>, name: &str) -> Result<Value> {
    ctx.query_env
        .operation
        .node
        .variable_definitions
        .iter()
        .find(|definition| definition.node.name.node == name)
        .and_then(|definition| {
            ctx.query_env
                .variables
                .get(&definition.node.name.node)
                .or_else(|| definition.node.default_value())
        })
        .cloned()
        .ok_or_else(|| Error::new(format!("Variable `${name}` is not defined")))
}

/// Parent value, arguments, context and info of the current field
fn invocation(
    plan: &FieldPlan,
    ctx: &ResolverContext<'_>,
) -> Result<(Value, Args, OperationContext, ResolveInfo)> {
    let context = ctx.data::<OperationContext>()?.clone();
    let parent = ctx.parent_value.as_value().cloned().unwrap_or(Value::Null);
    let args: Args = ctx
        .args
        .iter()
        .map(|(name, value)| (name.clone(), value.as_value().clone()))
        .collect();
    let field = &ctx.ctx.item.node;
    let mut selection = Vec::new();
    snapshot(ctx.ctx, &field.selection_set.node, None, &mut selection)?;
    let alias = field.alias.as_ref().map(|alias| alias.node.to_string());
    Ok((parent, args, context, plan.info(alias, selection)))
}

async fn resolve_field<'a>(
    plan: Arc<FieldPlan>,
    ctx: ResolverContext<'a>,
) -> Result<Option<FieldValue<'a>>> {
    let (parent, args, context, info) = invocation(&plan, &ctx)?;
    let value = plan.run(parent, args, context, info).await?;
    plan.to_field_value(value)
}

async fn subscribe_field<'a>(
    plan: Arc<SubscriptionPlan>,
    ctx: ResolverContext<'a>,
) -> Result<BoxStream<'a, Result<FieldValue<'a>>>> {
    let (parent, args, context, info) = invocation(&plan.field, &ctx)?;
    let events = (plan.subscribe)(parent, args, context.clone(), info.clone()).await?;
    debug!(field = %plan.field.field_name, "Subscription started");
    Ok(events
        .then(move |event| resolve_event(plan.clone(), event, context.clone(), info.clone()))
        .boxed())
}

/// Run one subscription event through the field's directives
async fn resolve_event<'a>(
    plan: Arc<SubscriptionPlan>,
    event: Result<Value>,
    context: OperationContext,
    info: ResolveInfo,
) -> Result<FieldValue<'a>> {
    let event = event?;
    let value = if plan.field.directives.is_empty() {
        event
    } else {
        let source = event.clone();
        let next: Next = Box::pin(async move { Ok(event) });
        plan.field.wrap(next, &source, &context, &info).await?
    };
    Ok(plan.field.to_field_value(value)?.unwrap_or(FieldValue::NULL))
}
