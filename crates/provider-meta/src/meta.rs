//! # Provider Meta & Namespace Client Cache
//!
//! [`ProviderMeta`] is created once per provider configuration and shared by
//! every resource operation. It owns the root [`Client`] and a cache of
//! namespace-scoped clones of it.
//!
//! ## Concurrency Model
//!
//! Resource operations run in parallel and often ask for the same namespace on
//! a cold cache. Lookup and insertion happen under one mutex, so:
//!
//! - exactly one client is built per canonical namespace path, and
//! - every caller for that path gets the same `Arc<Client>`.
//!
//! Nothing inside the critical section performs I/O; cloning a client only
//! copies its header map.

use crate::client::Client;
use crate::consts::FIELD_NAMESPACE;
use crate::dispatch::ClientContext;
use crate::error::ProviderError;
use crate::path::build_path;
use crate::schema::ResourceData;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Provider-level state shared by all resource operations.
#[derive(Debug, Default)]
pub struct ProviderMeta {
    client: Option<Client>,
    resource_data: Option<ResourceData>,
    client_cache: Mutex<HashMap<String, Arc<Client>>>,
}

impl ProviderMeta {
    /// Builds a meta from the root client and the provider's own resource data.
    ///
    /// The `namespace` field of `resource_data` is the root namespace that
    /// prefixes every requested namespace.
    pub fn new(client: Client, resource_data: ResourceData) -> Self {
        Self {
            client: Some(client),
            resource_data: Some(resource_data),
            client_cache: Mutex::default(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_resource_data(mut self, resource_data: ResourceData) -> Self {
        self.resource_data = Some(resource_data);
        self
    }

    /// The root client, never scoped to a namespace by this type.
    pub fn root_client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn resource_data(&self) -> Option<&ResourceData> {
        self.resource_data.as_ref()
    }

    /// Returns the client for `ns`, creating and caching it on first use.
    ///
    /// `ns` is joined under the provider's root namespace. Fails only when the
    /// meta was not initialized, in which case the cache is left untouched.
    pub fn get_ns_client(&self, ns: &str) -> Result<Arc<Client>, ProviderError> {
        let client = self.client.as_ref().ok_or(ProviderError::RootClientNotSet)?;
        let resource_data = self
            .resource_data
            .as_ref()
            .ok_or(ProviderError::ResourceDataNotSet)?;

        let root_ns = resource_data
            .get_ok(FIELD_NAMESPACE)
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let key = build_path(root_ns, ns);

        let mut cache = self.lock_cache();
        if let Some(cached) = cache.get(&key) {
            return Ok(Arc::clone(cached));
        }

        let mut ns_client = client.clone();
        ns_client.set_namespace(&key);
        let ns_client = Arc::new(ns_client);
        cache.insert(key.clone(), Arc::clone(&ns_client));
        debug!(namespace = %key, size = cache.len(), "Created namespace client");

        Ok(ns_client)
    }

    /// Resolves the namespace requested by `ctx` and returns its client.
    pub fn client_for(&self, ctx: ClientContext<'_>) -> Result<Arc<Client>, ProviderError> {
        self.get_ns_client(&ctx.requested_namespace())
    }

    /// Returns the cached client for a canonical namespace path, if any.
    pub fn cached_client(&self, namespace_path: &str) -> Option<Arc<Client>> {
        self.lock_cache().get(namespace_path).cloned()
    }

    /// Canonical namespace paths currently cached, sorted.
    pub fn cached_namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self.lock_cache().keys().cloned().collect();
        namespaces.sort();
        namespaces
    }

    // A panic while holding the lock cannot leave a half-inserted entry.
    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, Arc<Client>>> {
        self.client_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
