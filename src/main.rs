//! Demo: mint and revoke a GCP service account key against a live Vault server.
//!
//! ```bash
//! VAULT_ADDR=http://127.0.0.1:8200 VAULT_TOKEN=root RUST_LOG=info cargo run -- editor team-a
//! ```
//!
//! Arguments are the roleset (default `editor`) and an optional namespace,
//! relative to `VAULT_NAMESPACE`.

use serde_json::{json, Map, Value};
use tracing::{error, info, Instrument};
use vault_provider::config::ProviderConfig;
use vault_provider::gcp::{RolesetDataSource, ServiceAccountKeyResource};
use vault_provider::lifecycle::{setup_tracing, Provider};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let mut args = std::env::args().skip(1);
    let roleset = args.next().unwrap_or_else(|| "editor".to_string());
    let namespace = args.next();

    let config = ProviderConfig::from_env().map_err(|e| e.to_string())?;
    let provider = Provider::configure(&config).map_err(|e| e.to_string())?;

    let mut raw = object(json!({"backend": "gcp", "roleset": roleset}));
    if let Some(namespace) = namespace {
        raw.insert("namespace".to_string(), Value::String(namespace));
    }

    let span = tracing::info_span!("roleset_lookup");
    let lookup = async {
        info!("Checking roleset");
        provider
            .read_data_source(RolesetDataSource::NAME, raw.clone())
            .await
    }
    .instrument(span)
    .await;
    if let Err(e) = lookup {
        error!(error = %e, "Roleset lookup failed");
        return Err(e.to_string());
    }

    let span = tracing::info_span!("key_lifecycle");
    async {
        raw.insert("ttl".to_string(), Value::String("1h".to_string()));
        let mut key = provider
            .create_resource(ServiceAccountKeyResource::NAME, raw)
            .await
            .map_err(|e| e.to_string())?;
        info!(
            id = %key.id(),
            lease_id = key.get_str("lease_id").unwrap_or_default(),
            "Key minted"
        );

        provider
            .delete_resource(ServiceAccountKeyResource::NAME, &mut key)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    if let Some(meta) = provider.provider_meta() {
        info!(namespaces = ?meta.cached_namespaces(), "Demo completed successfully");
    }
    Ok(())
}
