use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JudoError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Type definitions error: {0}")]
    TypeDefs(#[from] typedefs_feature::TypeDefsError),

    #[error("Data-access client error: {0}")]
    Binding(#[from] binding::BindingError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] resolver_feature::ResolverError),

    #[error("Schema build error: {0}")]
    SchemaBuild(String),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
