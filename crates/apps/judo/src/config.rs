use std::env;
use std::path::PathBuf;

use binding::FragmentReplacement;
use resolver_feature::{DirectiveResolvers, Middleware, ResolverMap, SubscriptionMiddleware};

use crate::context::ContextProvider;
use crate::error::JudoError;

/// An SDL source, read from disk or given inline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Inline(String),
}

impl SchemaSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SchemaSource::File(path.into())
    }

    pub fn inline(sdl: impl Into<String>) -> Self {
        SchemaSource::Inline(sdl.into())
    }

    pub fn load(&self) -> Result<String, JudoError> {
        match self {
            SchemaSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| JudoError::Io {
                    path: path.clone(),
                    source,
                })
            }
            SchemaSource::Inline(sdl) => Ok(sdl.clone()),
        }
    }
}

/// Connection to the data-access service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrismaConfig {
    pub url: String,
    pub secret: Option<String>,
    /// Log every forwarded document
    pub debug: bool,
}

impl Default for PrismaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4466".to_string(),
            secret: None,
            debug: true,
        }
    }
}

/// Schema sources, merged in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphqlFiles {
    pub datamodel: Option<SchemaSource>,
    /// SDL of the data-access layer; also drives the data-access client
    pub prisma: Option<SchemaSource>,
    pub type_defs: Vec<SchemaSource>,
}

/// Server configuration, built once and read by every init stage
#[derive(Clone)]
pub struct JudoConfig {
    pub endpoint: String,
    pub playground: String,
    pub prisma: PrismaConfig,
    pub graphql_files: GraphqlFiles,
    pub query_middleware: Option<Middleware>,
    pub mutation_middleware: Option<Middleware>,
    pub subscription_middleware: Option<SubscriptionMiddleware>,
    /// Extra resolver maps; later maps win per field
    pub resolvers: Vec<ResolverMap>,
    pub directive_resolvers: DirectiveResolvers,
    pub fragments: Vec<FragmentReplacement>,
    /// Make every datamodel field also fetch its type's `id`
    pub always_query_id: bool,
    pub context: ContextProvider,
}

impl Default for JudoConfig {
    fn default() -> Self {
        Self {
            endpoint: "/graphql".to_string(),
            playground: "/playground".to_string(),
            prisma: PrismaConfig::default(),
            graphql_files: GraphqlFiles::default(),
            query_middleware: None,
            mutation_middleware: None,
            subscription_middleware: None,
            resolvers: Vec::new(),
            directive_resolvers: DirectiveResolvers::new(),
            fragments: Vec::new(),
            always_query_id: false,
            context: ContextProvider::None,
        }
    }
}

impl JudoConfig {
    /// Load configuration from the environment (and `.env`)
    pub fn from_env() -> Result<Self, JudoError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from a variable lookup, defaults filling the gaps
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, JudoError> {
        let mut config = JudoConfig::default();

        if let Some(endpoint) = var("GRAPHQL_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(playground) = var("GRAPHQL_PLAYGROUND") {
            config.playground = playground;
        }
        if let Some(url) = var("PRISMA_ENDPOINT") {
            config.prisma.url = url;
        }
        config.prisma.secret = var("PRISMA_SECRET").filter(|secret| !secret.is_empty());
        if let Some(debug) = var("PRISMA_DEBUG") {
            config.prisma.debug = parse_flag("PRISMA_DEBUG", &debug)?;
        }

        config.graphql_files.datamodel = var("JUDO_DATAMODEL").map(SchemaSource::file);
        config.graphql_files.prisma = var("JUDO_PRISMA_SCHEMA").map(SchemaSource::file);
        if let Some(paths) = var("JUDO_TYPEDEFS") {
            config.graphql_files.type_defs = paths
                .split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(SchemaSource::file)
                .collect();
        }
        if let Some(flag) = var("JUDO_ALWAYS_QUERY_ID") {
            config.always_query_id = parse_flag("JUDO_ALWAYS_QUERY_ID", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JudoError> {
        for (name, path) in [("endpoint", &self.endpoint), ("playground", &self.playground)] {
            if path.is_empty() || !path.starts_with('/') {
                return Err(JudoError::Config(format!(
                    "{name} must be an absolute path, got `{path}`"
                )));
            }
        }
        if self.endpoint == self.playground {
            return Err(JudoError::Config(format!(
                "endpoint and playground cannot share the path `{}`",
                self.endpoint
            )));
        }
        if self.prisma.url.is_empty() {
            return Err(JudoError::Config("prisma.url cannot be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, JudoError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(JudoError::Config(format!("{name} must be a boolean, got `{other}`"))),
    }
}
