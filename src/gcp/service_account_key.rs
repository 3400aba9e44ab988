//! `vault_gcp_service_account_key` resource.
//!
//! Creating the resource mints a key under a lease; deleting it revokes the
//! lease. There is nothing to refresh, so reads are no-ops.

use super::base_schema;
use crate::resource::{Resource, ResourceError};
use async_trait::async_trait;
use provider_meta::schema::{FieldSchema, FieldType, Schema};
use provider_meta::{get_client, CallContext, ResourceData};
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

pub const REVOKE_PATH: &str = "sys/leases/revoke";

#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceAccountKeyResource;

impl ServiceAccountKeyResource {
    pub const NAME: &'static str = "vault_gcp_service_account_key";
}

#[async_trait]
impl Resource for ServiceAccountKeyResource {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn schema(&self) -> Schema {
        base_schema()
            .field(
                "ttl",
                FieldSchema::new(FieldType::String)
                    .optional()
                    .force_new()
                    .description("The TTL period of the key."),
            )
            .field(
                "private_key_data",
                FieldSchema::new(FieldType::String)
                    .computed()
                    .sensitive()
                    .description("The private key of the service account, base64 encoded."),
            )
            .field(
                "lease_id",
                FieldSchema::new(FieldType::String)
                    .computed()
                    .description("Lease identifier assigned by vault."),
            )
            .field(
                "lease_duration",
                FieldSchema::new(FieldType::Int)
                    .computed()
                    .description("Lease duration in seconds relative to the time in lease_start_time."),
            )
            .field(
                "lease_start_time",
                FieldSchema::new(FieldType::String)
                    .computed()
                    .description("Time at which the lease was read, using the local clock."),
            )
            .field(
                "lease_renewable",
                FieldSchema::new(FieldType::Bool)
                    .computed()
                    .description("True if the duration of this lease can be extended through renewal."),
            )
    }

    #[instrument(skip_all, fields(resource = "vault_gcp_service_account_key"))]
    async fn create(
        &self,
        d: &mut ResourceData,
        meta: &dyn CallContext,
    ) -> Result<(), ResourceError> {
        let client = get_client(Some(&*d), Some(meta))?;

        let backend = d.get_str("backend").unwrap_or_default();
        let roleset = d.get_str("roleset").unwrap_or_default();
        let path = format!("{backend}/key/{roleset}");

        let ttl = d.get_ok("ttl").and_then(Value::as_str).map(str::to_string);
        let query: Vec<(&str, &str)> = ttl.iter().map(|ttl| ("ttl", ttl.as_str())).collect();

        debug!(%path, ?query, "Reading service account key");
        let secret = client
            .logical()
            .read_with_data(&path, &query)
            .await?
            .ok_or_else(|| ResourceError::NotFound {
                kind: "secret",
                path: path.clone(),
            })?;

        let started = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| ResourceError::Time(e.to_string()))?;

        // `d` is only updated once every field is accepted.
        let mut next = d.clone();
        next.set(
            "private_key_data",
            secret.data.get("private_key_data").cloned().unwrap_or(Value::Null),
        )?;
        next.set("lease_id", secret.lease_id.as_str())?;
        next.set("lease_duration", secret.lease_duration)?;
        next.set("lease_start_time", started)?;
        next.set("lease_renewable", secret.renewable)?;
        next.set_id(path);
        *d = next;

        info!(lease_id = %secret.lease_id, lease_duration = secret.lease_duration, "Created service account key");
        Ok(())
    }

    async fn read(&self, _d: &mut ResourceData, _meta: &dyn CallContext) -> Result<(), ResourceError> {
        Ok(())
    }

    #[instrument(skip_all, fields(resource = "vault_gcp_service_account_key", id = %d.id()))]
    async fn delete(
        &self,
        d: &mut ResourceData,
        meta: &dyn CallContext,
    ) -> Result<(), ResourceError> {
        let client = get_client(Some(&*d), Some(meta))?;
        let lease_id = d.get_str("lease_id").unwrap_or_default().to_string();

        debug!(%lease_id, "Revoking lease");
        let response = client
            .logical()
            .write(REVOKE_PATH, json!({ "lease_id": lease_id }))
            .await
            .map_err(|source| ResourceError::Revoke {
                lease_id: lease_id.clone(),
                source,
            })?;

        if response.is_none() {
            warn!(%lease_id, "Lease is already expired, removing from state");
            d.set_id("");
        }
        Ok(())
    }
}
