//! Resource contract shared by every data source and resource.
//!
//! A [`Resource`] describes its [`Schema`] and implements lifecycle hooks. Each
//! hook receives the resource's [`ResourceData`] and the provider meta as an
//! opaque [`CallContext`]; the hook resolves its own namespace-scoped client
//! with [`get_client`](provider_meta::get_client).
//!
//! Only the hooks a resource supports need implementing. The defaults report
//! [`ResourceError::Unsupported`] (`read` defaults to a no-op).

use async_trait::async_trait;
use provider_meta::schema::Schema;
use provider_meta::{CallContext, ClientError, ProviderError, ResourceData, SchemaError};
use thiserror::Error;

/// Errors returned by resource hooks.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResourceError {
    #[error("error reading from Vault: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Nothing is stored at the requested path.
    #[error("no {kind} found at {path:?}")]
    NotFound { kind: &'static str, path: String },

    #[error("roleset '{roleset}' cannot generate service account keys (has secret type {secret_type})")]
    InvalidSecretType { roleset: String, secret_type: String },

    #[error("error revoking Vault lease {lease_id:?}: {source}")]
    Revoke {
        lease_id: String,
        source: ClientError,
    },

    #[error("unknown resource type {0:?}")]
    UnknownResource(String),

    #[error("{resource} does not support {operation}")]
    Unsupported {
        resource: &'static str,
        operation: &'static str,
    },

    #[error("failed to format timestamp: {0}")]
    Time(String),
}

/// A managed resource or data source.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Type name as used in configuration (e.g. `vault_gcp_roleset`).
    fn name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(
        &self,
        _d: &mut ResourceData,
        _meta: &dyn CallContext,
    ) -> Result<(), ResourceError> {
        Err(ResourceError::Unsupported {
            resource: self.name(),
            operation: "create",
        })
    }

    async fn read(&self, _d: &mut ResourceData, _meta: &dyn CallContext) -> Result<(), ResourceError> {
        Ok(())
    }

    async fn update(
        &self,
        _d: &mut ResourceData,
        _meta: &dyn CallContext,
    ) -> Result<(), ResourceError> {
        Err(ResourceError::Unsupported {
            resource: self.name(),
            operation: "update",
        })
    }

    async fn delete(
        &self,
        _d: &mut ResourceData,
        _meta: &dyn CallContext,
    ) -> Result<(), ResourceError> {
        Err(ResourceError::Unsupported {
            resource: self.name(),
            operation: "delete",
        })
    }
}
