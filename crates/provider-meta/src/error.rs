//! # Provider Errors
//!
//! Errors raised while handing out namespace-scoped clients. None of them are
//! retryable: each one means the provider meta or the calling context was
//! wired up incorrectly.

use thiserror::Error;

/// Rendered in place of a type name when no value was supplied.
pub const NIL_TYPE_NAME: &str = "<nil>";

/// Errors returned by [`ProviderMeta::get_ns_client`](crate::ProviderMeta::get_ns_client)
/// and [`get_client`](crate::get_client).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider meta was built without a root client.
    #[error("root api client not set, init with ProviderMeta::new()")]
    RootClientNotSet,

    /// The provider meta was built without its provider-level resource data.
    #[error("provider resource data not set, init with ProviderMeta::new()")]
    ResourceDataNotSet,

    /// The calling context is none of the supported shapes.
    #[error("get_client() called with unsupported type {0}")]
    UnsupportedContext(String),

    /// The meta argument handed to the dispatcher is not a provider meta.
    #[error("meta argument must be a {expected}, not {actual}")]
    InvalidMeta {
        expected: &'static str,
        actual: String,
    },
}
