use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeDefsError {
    /// `index` is the position of the offending source in the merge order
    #[error("Type definitions #{index} could not be parsed: {message}")]
    Parse { index: usize, message: String },
}
