//! Provider configuration.
//!
//! Settings come from the provider block (deserialized with serde) or from the
//! standard Vault environment variables.

use provider_meta::consts::FIELD_NAMESPACE;
use provider_meta::schema::{FieldSchema, FieldType, Schema};
use provider_meta::{ClientError, ResourceData, SchemaError};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ADDRESS: &str = "https://127.0.0.1:8200";

pub const ENV_VAULT_ADDR: &str = "VAULT_ADDR";
pub const ENV_VAULT_TOKEN: &str = "VAULT_TOKEN";
pub const ENV_VAULT_NAMESPACE: &str = "VAULT_NAMESPACE";
pub const ENV_VAULT_CLIENT_TIMEOUT: &str = "VAULT_CLIENT_TIMEOUT";

/// Errors raised while configuring the provider.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Settings of the provider block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub address: String,
    pub token: Option<String>,
    /// Root namespace every resource namespace is nested under.
    pub namespace: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            namespace: None,
            timeout_secs: None,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let timeout_secs = match get(ENV_VAULT_CLIENT_TIMEOUT) {
            Some(value) => Some(value.parse().map_err(|_| ConfigError::InvalidValue {
                var: ENV_VAULT_CLIENT_TIMEOUT,
                value,
            })?),
            None => None,
        };

        Ok(Self {
            address: get(ENV_VAULT_ADDR).unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            token: get(ENV_VAULT_TOKEN),
            namespace: get(ENV_VAULT_NAMESPACE),
            timeout_secs,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn schema() -> Schema {
        Schema::new()
            .field(
                "address",
                FieldSchema::new(FieldType::String)
                    .required()
                    .description("URL of the root of the target Vault server."),
            )
            .field(
                "token",
                FieldSchema::new(FieldType::String)
                    .optional()
                    .sensitive()
                    .description("Token to use to authenticate to Vault."),
            )
            .field(
                FIELD_NAMESPACE,
                FieldSchema::new(FieldType::String)
                    .optional()
                    .description("The namespace to use. Available only for Vault Enterprise."),
            )
    }

    /// Renders the provider block as resource data, the source of the root namespace.
    pub fn to_resource_data(&self) -> Result<ResourceData, SchemaError> {
        let mut d = ResourceData::new(Self::schema());
        d.set("address", self.address.as_str())?;
        if let Some(token) = &self.token {
            d.set("token", token.as_str())?;
        }
        if let Some(namespace) = &self.namespace {
            d.set(FIELD_NAMESPACE, namespace.as_str())?;
        }
        d.validate()?;
        Ok(d)
    }
}
