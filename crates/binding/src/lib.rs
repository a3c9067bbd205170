pub mod client;
pub mod error;
pub mod fragment;
pub mod info;
pub mod transport;
pub mod type_index;

mod document;

pub use client::{
    operation, subscription_operation, Binding, BindingConfig, Operation, OperationMap,
    SubscriptionOperation,
};
pub use error::{BindingError, OperationKind, UpstreamError};
pub use fragment::{parse_selection, FragmentReplacement};
pub use info::{Args, ResolveInfo, SelectedField};
pub use transport::{DataStream, HttpTransport, Transport};
