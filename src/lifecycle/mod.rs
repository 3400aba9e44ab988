//! Provider lifecycle and observability.
//!
//! - [`Provider`] - configures the root client and the shared meta, and runs
//!   data source and resource operations by name
//! - [`setup_tracing`] - initializes the tracing/logging infrastructure

pub mod provider;
pub mod tracing;

pub use self::provider::*;
pub use self::tracing::*;
