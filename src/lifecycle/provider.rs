use crate::config::{ConfigError, ProviderConfig};
use crate::gcp::{RolesetDataSource, ServiceAccountKeyResource};
use crate::resource::{Resource, ResourceError};
use provider_meta::{CallContext, Client, HttpTransport, ProviderMeta, ResourceData, Transport};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

type Registry = BTreeMap<&'static str, Arc<dyn Resource>>;

fn registry(entries: Vec<Arc<dyn Resource>>) -> Registry {
    entries
        .into_iter()
        .map(|resource| (resource.name(), resource))
        .collect()
}

/// The configured provider: the shared meta plus every data source and resource it serves.
///
/// `Provider` is the piece the host runtime talks to. It owns:
/// - **The meta**: a [`ProviderMeta`] holding the root client and the
///   provider-level resource data. It is stored as an opaque
///   `Arc<dyn CallContext>`, the same way the host hands it to resource hooks.
/// - **The registries**: data sources and resources by type name.
///
/// # Example
///
/// ```ignore
/// let provider = Provider::configure(&ProviderConfig::from_env()?)?;
///
/// let raw = json!({"backend": "gcp", "roleset": "editor"});
/// let roleset = provider
///     .read_data_source("vault_gcp_roleset", raw.as_object().cloned().unwrap_or_default())
///     .await?;
/// ```
///
/// `Provider` is `Send + Sync`; wrap it in an `Arc` to run operations from
/// many tasks at once. Operations in the same namespace share one client.
pub struct Provider {
    meta: Arc<dyn CallContext>,
    data_sources: Registry,
    resources: Registry,
}

impl Provider {
    /// Connects to the Vault server at `config.address`.
    pub fn configure(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let transport = match config.timeout() {
            Some(timeout) => HttpTransport::with_timeout(&config.address, timeout)?,
            None => HttpTransport::new(&config.address)?,
        };
        Self::with_transport(config, Arc::new(transport))
    }

    /// Builds the provider over an arbitrary transport.
    pub fn with_transport(
        config: &ProviderConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        let mut client = Client::new(transport);
        if let Some(token) = &config.token {
            client = client.with_token(token.as_str());
        }
        let provider_data = config.to_resource_data()?;

        info!(
            address = %config.address,
            namespace = config.namespace.as_deref().unwrap_or_default(),
            "Provider configured"
        );

        Ok(Self {
            meta: Arc::new(ProviderMeta::new(client, provider_data)),
            data_sources: registry(vec![Arc::new(RolesetDataSource) as Arc<dyn Resource>]),
            resources: registry(vec![Arc::new(ServiceAccountKeyResource) as Arc<dyn Resource>]),
        })
    }

    /// The meta value handed to every hook.
    pub fn meta(&self) -> &dyn CallContext {
        &*self.meta
    }

    /// The meta as its concrete type, for inspecting the client cache.
    pub fn provider_meta(&self) -> Option<&ProviderMeta> {
        self.meta().as_any().downcast_ref::<ProviderMeta>()
    }

    pub fn data_source_names(&self) -> Vec<&'static str> {
        self.data_sources.keys().copied().collect()
    }

    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    fn data_source(&self, name: &str) -> Result<&Arc<dyn Resource>, ResourceError> {
        self.data_sources
            .get(name)
            .ok_or_else(|| ResourceError::UnknownResource(name.to_string()))
    }

    fn resource(&self, name: &str) -> Result<&Arc<dyn Resource>, ResourceError> {
        self.resources
            .get(name)
            .ok_or_else(|| ResourceError::UnknownResource(name.to_string()))
    }

    fn resource_data(
        resource: &dyn Resource,
        raw: Map<String, Value>,
    ) -> Result<ResourceData, ResourceError> {
        let d = ResourceData::from_raw(resource.schema(), raw)?;
        d.validate()?;
        Ok(d)
    }

    #[instrument(skip(self, raw))]
    pub async fn read_data_source(
        &self,
        name: &str,
        raw: Map<String, Value>,
    ) -> Result<ResourceData, ResourceError> {
        let data_source = self.data_source(name)?;
        let mut d = Self::resource_data(data_source.as_ref(), raw)?;
        debug!("Reading data source");

        data_source.read(&mut d, self.meta()).await?;
        info!(id = %d.id(), "Data source read");
        Ok(d)
    }

    #[instrument(skip(self, raw))]
    pub async fn create_resource(
        &self,
        name: &str,
        raw: Map<String, Value>,
    ) -> Result<ResourceData, ResourceError> {
        let resource = self.resource(name)?;
        let mut d = Self::resource_data(resource.as_ref(), raw)?;
        debug!("Creating resource");

        resource.create(&mut d, self.meta()).await?;
        info!(id = %d.id(), "Resource created");
        Ok(d)
    }

    /// Refreshes `d` from Vault.
    #[instrument(skip(self, d), fields(id = %d.id()))]
    pub async fn read_resource(&self, name: &str, d: &mut ResourceData) -> Result<(), ResourceError> {
        let resource = self.resource(name)?;
        resource.read(d, self.meta()).await
    }

    /// Applies changed inputs in place. Resources whose inputs all force
    /// replacement report [`ResourceError::Unsupported`].
    #[instrument(skip(self, d), fields(id = %d.id()))]
    pub async fn update_resource(
        &self,
        name: &str,
        d: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        let resource = self.resource(name)?;
        resource.update(d, self.meta()).await?;
        info!("Resource updated");
        Ok(())
    }

    /// Runs the delete hook; on success the resource is gone from state.
    #[instrument(skip(self, d), fields(id = %d.id()))]
    pub async fn delete_resource(
        &self,
        name: &str,
        d: &mut ResourceData,
    ) -> Result<(), ResourceError> {
        let resource = self.resource(name)?;
        resource.delete(d, self.meta()).await?;

        d.set_id("");
        info!("Resource deleted");
        Ok(())
    }
}
