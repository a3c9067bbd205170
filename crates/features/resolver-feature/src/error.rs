use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Type definitions error: {0}")]
    TypeDefs(#[from] typedefs_feature::TypeDefsError),

    #[error("Invalid selection `{selection}`: {message}")]
    InvalidSelection { selection: String, message: String },
}
