//! # Provider Meta
//!
//! Namespace-scoped Vault clients for a resource provider.
//!
//! Vault namespaces are hierarchical, and every namespace needs its own client:
//! the root client cloned with an `X-Vault-Namespace` header. Resource
//! operations run concurrently against overlapping namespaces, so clients are
//! derived lazily from one root client and cached per canonical namespace path.
//!
//! ## Architecture Overview
//!
//! 1. **Path Layer** ([`path::build_path`]) - joins the provider's root namespace
//!    with a requested namespace into one canonical cache key.
//! 2. **Cache Layer** ([`ProviderMeta`]) - owns the root client and hands out
//!    exactly one `Arc<Client>` per namespace, even under concurrent first use.
//! 3. **Dispatch Layer** ([`get_client`]) - works out which namespace an
//!    operation wants from whatever context the host runtime passed in.
//!
//! ```rust
//! use provider_meta::mock::MockTransport;
//! use provider_meta::schema::{FieldSchema, FieldType, ResourceData, Schema};
//! use provider_meta::{get_client, Client, ProviderMeta};
//! use std::sync::Arc;
//!
//! let schema = Schema::new().field("namespace", FieldSchema::new(FieldType::String).optional());
//! let mut provider_data = ResourceData::new(schema.clone());
//! provider_data.set("namespace", "team-a").unwrap();
//!
//! let root = Client::new(Arc::new(MockTransport::new()));
//! let meta = ProviderMeta::new(root, provider_data);
//!
//! let mut resource = ResourceData::new(schema);
//! resource.set("namespace", "/app/").unwrap();
//!
//! let client = get_client(Some(&resource), Some(&meta)).unwrap();
//! assert_eq!(client.namespace(), Some("team-a/app"));
//!
//! // Same namespace, same client.
//! let again = meta.get_ns_client("app").unwrap();
//! assert!(Arc::ptr_eq(&client, &again));
//! ```
//!
//! ## Testing
//!
//! [`mock::MockTransport`] answers requests from registered expectations and
//! records what it received, so resource code can be tested without a server.

pub mod client;
pub mod consts;
pub mod dispatch;
pub mod error;
pub mod meta;
pub mod mock;
pub mod path;
pub mod schema;
pub mod transport;

// Re-export core types for convenience
pub use client::{Client, ClientError, Headers, Logical, Method, Request, Secret};
pub use dispatch::{get_client, CallContext, ClientContext};
pub use error::ProviderError;
pub use meta::ProviderMeta;
pub use schema::{InstanceState, ResourceData, ResourceDiff, SchemaError};
pub use transport::{HttpTransport, Transport};
