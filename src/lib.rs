//! # Vault Provider
//!
//! Vault resources for an infrastructure-as-code host, built on the
//! namespace-scoped clients of [`provider_meta`].
//!
//! Every resource may name a `namespace`. It is resolved relative to the
//! provider's own namespace, and all operations in one namespace share a
//! single cached client, however many run at once.
//!
//! ## Module Tour
//!
//! ### 1. Configuration ([`config`])
//! - **Role**: Reads the provider block or the `VAULT_*` environment.
//! - **Key items**: [`ProviderConfig`](config::ProviderConfig).
//!
//! ### 2. The Contract ([`resource`])
//! - **Role**: Lifecycle hooks every data source and resource implements. Hooks
//!   receive the provider meta as an opaque value and resolve their own client.
//! - **Key items**: [`Resource`](resource::Resource), [`ResourceError`](resource::ResourceError).
//!
//! ### 3. The Implementation ([`gcp`])
//! - `vault_gcp_roleset` data source and `vault_gcp_service_account_key` resource.
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! - **Role**: Wires the root client, the meta and the registries together.
//! - **Key items**: [`Provider`](lifecycle::Provider), [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ## Running the Demo
//!
//! ```bash
//! VAULT_ADDR=http://127.0.0.1:8200 VAULT_TOKEN=root RUST_LOG=debug cargo run
//! ```

pub mod config;
pub mod gcp;
pub mod lifecycle;
pub mod resource;
