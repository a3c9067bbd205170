//! Initialization stages, each reading the immutable configuration

use std::sync::Arc;

use binding::{Binding, BindingConfig, FragmentReplacement, Transport};
use indexmap::IndexMap;
use resolver_feature::{
    always_query_id_field, wrap_resolvers, wrap_subscriptions, FragmentOverrides, Resolver,
    ResolverEntry, ResolverMap,
};
use tracing::{debug, info};
use typedefs_feature::TypeDefs;

use crate::config::JudoConfig;
use crate::error::JudoError;

/// SDL of the data-access layer
pub fn prisma_type_defs(config: &JudoConfig) -> Result<String, JudoError> {
    config
        .graphql_files
        .prisma
        .as_ref()
        .ok_or_else(|| JudoError::Config("graphql_files.prisma is required".to_string()))?
        .load()
}

/// Merge datamodel, data-access SDL and extra sources, later sources winning
pub fn merge_type_defs(config: &JudoConfig) -> Result<TypeDefs, JudoError> {
    let files = &config.graphql_files;
    let mut sources = Vec::with_capacity(files.type_defs.len() + 2);
    if let Some(datamodel) = &files.datamodel {
        sources.push(datamodel.load()?);
    }
    sources.push(prisma_type_defs(config)?);
    for source in &files.type_defs {
        sources.push(source.load()?);
    }
    let type_defs = TypeDefs::merge(&sources)?;
    debug!(sources = sources.len(), types = type_defs.len(), "Type definitions loaded");
    Ok(type_defs)
}

/// Id-fetching overrides, when enabled
pub fn always_query_id(config: &JudoConfig) -> Result<Option<FragmentOverrides>, JudoError> {
    if !config.always_query_id {
        return Ok(None);
    }
    let datamodel = config.graphql_files.datamodel.as_ref().ok_or_else(|| {
        JudoError::Config("always_query_id needs graphql_files.datamodel".to_string())
    })?;
    let overrides = always_query_id_field(&datamodel.load()?)?;
    debug!(fields = overrides.resolvers.len(), "Id fragments generated");
    Ok(Some(overrides))
}

/// Create the data-access client
///
/// `extra_fragments` are appended to the configured fragments. Without a
/// `transport` the client talks HTTP to `prisma.url`.
pub fn init_binding(
    config: &JudoConfig,
    extra_fragments: &[FragmentReplacement],
    transport: Option<Arc<dyn Transport>>,
) -> Result<Binding, JudoError> {
    let type_defs = prisma_type_defs(config)?;
    let fragment_replacements: Vec<FragmentReplacement> = config
        .fragments
        .iter()
        .chain(extra_fragments)
        .cloned()
        .collect();

    let binding = match transport {
        Some(transport) => Binding::with_transport(
            &type_defs,
            &fragment_replacements,
            config.prisma.debug,
            transport,
        )?,
        None => Binding::new(BindingConfig {
            type_defs,
            endpoint: config.prisma.url.clone(),
            secret: config.prisma.secret.clone(),
            debug: config.prisma.debug,
            fragment_replacements,
        })?,
    };
    info!(
        queries = binding.query.len(),
        mutations = binding.mutation.len(),
        subscriptions = binding.subscription.len(),
        "Data-access client ready"
    );
    Ok(binding)
}

/// Wrapped data-access operations, then id overrides, then the configured
/// maps; later entries win per field
pub fn prepare_resolvers(
    config: &JudoConfig,
    type_defs: &TypeDefs,
    binding: &Binding,
    always_query_id: Option<&FragmentOverrides>,
) -> ResolverMap {
    let roots = type_defs.roots();
    let resolve_entries = |resolvers: IndexMap<String, Resolver>| {
        resolvers
            .into_iter()
            .map(|(field, resolve)| (field, ResolverEntry::resolve(resolve)))
    };

    let mut maps = vec![
        ResolverMap::from_fields(
            roots.query.clone(),
            resolve_entries(wrap_resolvers(config.query_middleware.clone(), &binding.query)),
        ),
        ResolverMap::from_fields(
            roots.mutation.clone(),
            resolve_entries(wrap_resolvers(
                config.mutation_middleware.clone(),
                &binding.mutation,
            )),
        ),
        ResolverMap::from_fields(
            roots.subscription.clone(),
            wrap_subscriptions(
                config.subscription_middleware.clone(),
                binding.subscription.keys().cloned(),
            )
            .into_iter()
            .map(|(field, subscribe)| (field, ResolverEntry::Subscribe(subscribe))),
        ),
    ];
    if let Some(overrides) = always_query_id {
        maps.push(overrides.resolvers.clone());
    }
    maps.extend(config.resolvers.iter().cloned());

    let resolvers = ResolverMap::merge_all(maps);
    debug!(fields = resolvers.len(), "Resolvers prepared");
    resolvers
}
