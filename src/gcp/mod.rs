//! GCP secrets engine: roleset lookups and service account keys.
//!
//! Both resources accept a `namespace` so they can target a namespace nested
//! under the provider's own.

pub mod roleset;
pub mod service_account_key;

pub use roleset::RolesetDataSource;
pub use service_account_key::ServiceAccountKeyResource;

use provider_meta::consts::FIELD_NAMESPACE;
use provider_meta::schema::{FieldSchema, FieldType, Schema};

/// Version value meaning "whatever is current".
pub const LATEST_SECRET_VERSION: i64 = -1;

/// Secret type a roleset must have to mint keys.
pub const SECRET_TYPE_SERVICE_ACCOUNT_KEY: &str = "service_account_key";

fn trim_slashes(value: &str) -> String {
    value.trim_matches('/').to_string()
}

/// Fields shared by every GCP resource.
pub(crate) fn base_schema() -> Schema {
    Schema::new()
        .field(
            "roleset",
            FieldSchema::new(FieldType::String)
                .required()
                .force_new()
                .description("GCP Secret Engine, Service Account Roleset to read credentials from."),
        )
        .field(
            "backend",
            FieldSchema::new(FieldType::String)
                .required()
                .force_new()
                .state_func(trim_slashes)
                .description("GCP Secret Engine Backend to read credentials from."),
        )
        .field(
            "version",
            FieldSchema::new(FieldType::Int)
                .optional()
                .force_new()
                .default(LATEST_SECRET_VERSION),
        )
        .field(
            FIELD_NAMESPACE,
            FieldSchema::new(FieldType::String)
                .optional()
                .force_new()
                .description("Target namespace, relative to the provider namespace."),
        )
}
