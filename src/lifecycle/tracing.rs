//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a `tracing-subscriber` formatter for the whole
//! provider. The level comes from `RUST_LOG`; the format is compact and hides
//! module paths (`with_target(false)`).
//!
//! ## What Gets Traced
//!
//! - **Provider lifecycle**: configuration (address, root namespace)
//! - **Resource operations**: one span per operation, with the resource name and id
//! - **Vault requests**: method, path and namespace of every request (debug)
//! - **Client cache**: each namespace client the first time it is created (debug)
//! - **Expired leases**: a warning when a revoke finds nothing to revoke
//!
//! ## Usage Examples
//!
//! ```bash
//! # Outcomes only
//! RUST_LOG=info cargo run
//!
//! # Every request and cache miss
//! RUST_LOG=debug cargo run
//!
//! # Only the client cache
//! RUST_LOG=provider_meta::meta=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug`, creating a key in a nested namespace looks like:
//!
//! ```text
//! DEBUG create_resource: Creating resource name="vault_gcp_service_account_key"
//! DEBUG create_resource:create: Created namespace client namespace=admin/team-a size=1
//! DEBUG create_resource:create: Reading service account key path=gcp/key/editor query=[("ttl", "1h")]
//! DEBUG create_resource:create: Sending request method=GET path=gcp/key/editor namespace="admin/team-a"
//!  INFO create_resource:create: Created service account key lease_id=gcp/key/editor/abc lease_duration=3600
//!  INFO create_resource: Resource created id=gcp/key/editor
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
