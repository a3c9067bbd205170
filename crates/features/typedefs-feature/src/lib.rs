pub mod error;
pub mod merge;
pub mod model;
mod print;

pub use error::TypeDefsError;
pub use merge::{RootNames, TypeDefs};
pub use model::{DirectiveUse, EnumValueDef, FieldDef, InputValueDef, TypeDef, TypeDefKind};
