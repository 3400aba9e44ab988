//! # Namespace Resolution
//!
//! Resource operations reach Vault through [`get_client`]. The host runtime
//! passes both the calling context and the provider meta as opaque values, so
//! the dispatcher inspects their runtime types once, at this boundary, and
//! turns the context into a [`ClientContext`].
//!
//! ## Precedence
//!
//! | Context            | Requested namespace                                        |
//! |--------------------|------------------------------------------------------------|
//! | `String` / `&str`  | the string itself                                          |
//! | [`ResourceData`]   | `namespace` field when set and non-empty                   |
//! | [`ResourceDiff`]   | planned `namespace` field when set and non-empty           |
//! | [`InstanceState`]  | `namespace` attribute, else `TERRAFORM_VAULT_NAMESPACE_IMPORT` |
//!
//! The environment override only applies to instance state: configuration
//! and diffs describe declared resources, while instance state may come from an
//! import that never recorded a namespace.

use crate::client::Client;
use crate::consts::{ENV_VAR_VAULT_NAMESPACE_IMPORT, FIELD_NAMESPACE};
use crate::error::{ProviderError, NIL_TYPE_NAME};
use crate::meta::ProviderMeta;
use crate::schema::{InstanceState, ResourceData, ResourceDiff};
use serde_json::Value;
use std::any::{type_name, Any};
use std::sync::Arc;
use tracing::debug;

/// An opaque value handed across the host-runtime boundary.
///
/// Implemented for every `Send + Sync + 'static` type, so any value can be
/// passed as `&dyn CallContext` and later recovered with `as_any()`.
pub trait CallContext: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Runtime type name, used in error messages.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> CallContext for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// The supported shapes a namespace can be resolved from.
#[derive(Debug, Clone, Copy)]
pub enum ClientContext<'a> {
    Namespace(&'a str),
    Config(&'a ResourceData),
    Diff(&'a ResourceDiff),
    State(&'a InstanceState),
}

impl<'a> ClientContext<'a> {
    /// Recovers a context from an opaque value.
    pub fn from_call_context(ctx: Option<&'a dyn CallContext>) -> Result<Self, ProviderError> {
        let Some(ctx) = ctx else {
            return Err(ProviderError::UnsupportedContext(NIL_TYPE_NAME.to_string()));
        };

        let any = ctx.as_any();
        if let Some(ns) = any.downcast_ref::<String>() {
            Ok(Self::Namespace(ns))
        } else if let Some(ns) = any.downcast_ref::<&'static str>() {
            Ok(Self::Namespace(*ns))
        } else if let Some(d) = any.downcast_ref::<ResourceData>() {
            Ok(Self::Config(d))
        } else if let Some(d) = any.downcast_ref::<ResourceDiff>() {
            Ok(Self::Diff(d))
        } else if let Some(state) = any.downcast_ref::<InstanceState>() {
            Ok(Self::State(state))
        } else {
            Err(ProviderError::UnsupportedContext(ctx.type_name().to_string()))
        }
    }

    /// The namespace this context asks for, before joining the root namespace.
    ///
    /// Reads `TERRAFORM_VAULT_NAMESPACE_IMPORT` on every call for instance state.
    pub fn requested_namespace(&self) -> String {
        self.requested_namespace_with(|key| std::env::var(key).ok())
    }

    fn requested_namespace_with(&self, lookup_env: impl FnOnce(&str) -> Option<String>) -> String {
        match self {
            Self::Namespace(ns) => ns.to_string(),
            Self::Config(d) => field_namespace(d.get_ok(FIELD_NAMESPACE)),
            Self::Diff(d) => field_namespace(d.get_ok(FIELD_NAMESPACE)),
            Self::State(state) => match state.attribute(FIELD_NAMESPACE) {
                Some(ns) if !ns.is_empty() => ns.to_string(),
                _ => match lookup_env(ENV_VAR_VAULT_NAMESPACE_IMPORT) {
                    Some(ns) if !ns.is_empty() => {
                        debug!(
                            namespace = %ns,
                            env = ENV_VAR_VAULT_NAMESPACE_IMPORT,
                            "Using namespace from import environment"
                        );
                        ns
                    }
                    _ => String::new(),
                },
            },
        }
    }
}

fn field_namespace(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl<'a> From<&'a str> for ClientContext<'a> {
    fn from(ns: &'a str) -> Self {
        Self::Namespace(ns)
    }
}

impl<'a> From<&'a ResourceData> for ClientContext<'a> {
    fn from(d: &'a ResourceData) -> Self {
        Self::Config(d)
    }
}

impl<'a> From<&'a ResourceDiff> for ClientContext<'a> {
    fn from(d: &'a ResourceDiff) -> Self {
        Self::Diff(d)
    }
}

impl<'a> From<&'a InstanceState> for ClientContext<'a> {
    fn from(state: &'a InstanceState) -> Self {
        Self::State(state)
    }
}

fn provider_meta(meta: Option<&dyn CallContext>) -> Result<&ProviderMeta, ProviderError> {
    let invalid = |actual: &str| ProviderError::InvalidMeta {
        expected: type_name::<ProviderMeta>(),
        actual: actual.to_string(),
    };

    let meta = meta.ok_or_else(|| invalid(NIL_TYPE_NAME))?;
    let any = meta.as_any();
    if let Some(p) = any.downcast_ref::<ProviderMeta>() {
        Ok(p)
    } else if let Some(p) = any.downcast_ref::<Arc<ProviderMeta>>() {
        Ok(p.as_ref())
    } else {
        Err(invalid(meta.type_name()))
    }
}

/// Returns the namespace-scoped client for a resource operation.
///
/// `ctx` is the operation's calling context (see the module docs for the
/// supported shapes) and `meta` is the [`ProviderMeta`] the provider was
/// configured with. Errors from [`ProviderMeta::get_ns_client`] are returned
/// unchanged.
///
/// Pass the values themselves, not their smart pointers: for
/// `meta: Arc<dyn CallContext>` pass `Some(&*meta)`. `Some(&meta)` also
/// compiles, but resolves as the `Arc` and fails with
/// [`ProviderError::InvalidMeta`].
pub fn get_client(
    ctx: Option<&dyn CallContext>,
    meta: Option<&dyn CallContext>,
) -> Result<Arc<Client>, ProviderError> {
    let meta = provider_meta(meta)?;
    let ctx = ClientContext::from_call_context(ctx)?;
    meta.client_for(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::schema::{FieldSchema, FieldType, Schema};
    use std::sync::Mutex;

    // Tests touching the process environment must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn namespace_schema() -> Schema {
        Schema::new().field(FIELD_NAMESPACE, FieldSchema::new(FieldType::String).required())
    }

    fn meta() -> ProviderMeta {
        ProviderMeta::new(
            Client::new(Arc::new(MockTransport::new())),
            ResourceData::new(namespace_schema()),
        )
    }

    fn rsc_data(ns: Option<&str>) -> ResourceData {
        let mut d = ResourceData::new(namespace_schema());
        if let Some(ns) = ns {
            d.set(FIELD_NAMESPACE, ns).unwrap();
        }
        d
    }

    fn instance_state(ns: Option<&str>) -> InstanceState {
        let state = InstanceState::new("id");
        match ns {
            Some(ns) => state.with_attribute(FIELD_NAMESPACE, ns),
            None => state,
        }
    }

    /// Clears the import variable when dropped, even if the test body panics.
    struct ImportEnv;

    impl Drop for ImportEnv {
        fn drop(&mut self) {
            std::env::remove_var(ENV_VAR_VAULT_NAMESPACE_IMPORT);
        }
    }

    fn with_import_env<T>(value: &str, f: impl FnOnce() -> T) -> T {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _env = ImportEnv;
        std::env::set_var(ENV_VAR_VAULT_NAMESPACE_IMPORT, value);
        f()
    }

    fn header(client: &Client) -> &str {
        client.namespace().unwrap_or_default()
    }

    #[test]
    fn test_string() {
        let meta = meta();
        let got = get_client(Some(&"ns1-string".to_string()), Some(&meta)).unwrap();
        assert_eq!(header(&got), "ns1-string");

        let got = get_client(Some(&"ns1-str"), Some(&meta)).unwrap();
        assert_eq!(header(&got), "ns1-str");
    }

    #[test]
    fn test_string_joins_root_namespace() {
        let mut root = ResourceData::new(namespace_schema());
        root.set(FIELD_NAMESPACE, "bar").unwrap();
        let meta = ProviderMeta::new(Client::new(Arc::new(MockTransport::new())), root);

        let got = get_client(Some(&"/foo/".to_string()), Some(&meta)).unwrap();
        assert_eq!(header(&got), "bar/foo");
    }

    #[test]
    fn test_rsc_data() {
        let meta = meta();
        let d = rsc_data(Some("ns1-rsc-data"));
        let got = get_client(Some(&d), Some(&meta)).unwrap();
        assert_eq!(header(&got), "ns1-rsc-data");
    }

    #[test]
    fn test_rsc_diff_reads_planned_namespace() {
        let meta = meta();
        let diff = ResourceDiff::new(rsc_data(Some("old")), rsc_data(Some("ns1-diff")));
        let got = get_client(Some(&diff), Some(&meta)).unwrap();
        assert_eq!(header(&got), "ns1-diff");
    }

    #[test]
    fn test_inst_state() {
        let meta = meta();
        let state = instance_state(Some("ns1-inst-state"));
        let got = get_client(Some(&state), Some(&meta)).unwrap();
        assert_eq!(header(&got), "ns1-inst-state");
    }

    #[test]
    fn test_import_env() {
        let meta = meta();
        let state = instance_state(None);
        let got = with_import_env("ns1-import-env", || get_client(Some(&state), Some(&meta))).unwrap();
        assert_eq!(header(&got), "ns1-import-env");
    }

    #[test]
    fn test_ignore_env_rsc_data() {
        let meta = meta();
        let d = rsc_data(Some("ns1"));
        let got = with_import_env("ns1-import-env", || get_client(Some(&d), Some(&meta))).unwrap();
        assert_eq!(header(&got), "ns1");
    }

    #[test]
    fn test_ignore_env_inst_state() {
        let meta = meta();
        let state = instance_state(Some("ns1"));
        let got = with_import_env("ns1-import-env", || get_client(Some(&state), Some(&meta))).unwrap();
        assert_eq!(header(&got), "ns1");
    }

    #[test]
    fn test_env_never_applies_to_config_or_diff() {
        let lookup = |_: &str| Some("ns1-import-env".to_string());
        let d = rsc_data(None);
        assert_eq!(ClientContext::Config(&d).requested_namespace_with(lookup), "");

        let diff = ResourceDiff::new(rsc_data(None), rsc_data(None));
        assert_eq!(ClientContext::Diff(&diff).requested_namespace_with(lookup), "");

        let state = instance_state(None);
        assert_eq!(
            ClientContext::State(&state).requested_namespace_with(lookup),
            "ns1-import-env"
        );
    }

    #[test]
    fn test_empty_attribute_falls_back_to_env() {
        let state = instance_state(Some(""));
        let ns = ClientContext::State(&state).requested_namespace_with(|key| {
            assert_eq!(key, ENV_VAR_VAULT_NAMESPACE_IMPORT);
            Some("from-env".to_string())
        });
        assert_eq!(ns, "from-env");

        let ns = ClientContext::State(&state).requested_namespace_with(|_| None);
        assert_eq!(ns, "");
    }

    #[test]
    fn test_error_unsupported_type() {
        let meta = meta();

        let err = get_client(None, Some(&meta)).unwrap_err();
        assert_eq!(err, ProviderError::UnsupportedContext("<nil>".to_string()));
        assert_eq!(err.to_string(), "get_client() called with unsupported type <nil>");

        let err = get_client(Some(&42_i32), Some(&meta)).unwrap_err();
        assert_eq!(err, ProviderError::UnsupportedContext("i32".to_string()));
        assert!(meta.cached_namespaces().is_empty());
    }

    #[test]
    fn test_error_not_provider_meta() {
        let d = rsc_data(Some("ns1"));

        let err = get_client(Some(&d), None).unwrap_err();
        assert_eq!(
            err,
            ProviderError::InvalidMeta {
                expected: type_name::<ProviderMeta>(),
                actual: "<nil>".to_string(),
            }
        );

        let err = get_client(Some(&d), Some(&"not a meta".to_string())).unwrap_err();
        assert!(matches!(
            &err,
            ProviderError::InvalidMeta { actual, .. } if actual == type_name::<String>()
        ));
        assert!(err.to_string().starts_with("meta argument must be a "));
    }

    #[test]
    fn test_arc_meta_is_accepted() {
        let meta = Arc::new(meta());
        let got = get_client(Some(&"ns1".to_string()), Some(&meta)).unwrap();
        assert!(Arc::ptr_eq(&got, &meta.cached_client("ns1").unwrap()));
    }

    #[test]
    fn test_erased_meta_must_be_dereferenced() {
        let meta: Arc<dyn CallContext> = Arc::new(meta());
        let ns = "ns1".to_string();

        let got = get_client(Some(&ns), Some(&*meta)).unwrap();
        assert_eq!(header(&got), "ns1");

        let err = get_client(Some(&ns), Some(&meta)).unwrap_err();
        assert_eq!(
            err,
            ProviderError::InvalidMeta {
                expected: type_name::<ProviderMeta>(),
                actual: type_name::<Arc<dyn CallContext>>().to_string(),
            }
        );
    }

    #[test]
    fn test_import_env_is_cleared_after_panic() {
        let result = std::panic::catch_unwind(|| {
            with_import_env("ns1-leaked", || panic!("test body failed"))
        });
        assert!(result.is_err());

        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        assert!(std::env::var(ENV_VAR_VAULT_NAMESPACE_IMPORT).is_err());
    }

    #[test]
    fn test_typed_entry_point_matches_dispatcher() {
        let meta = meta();
        let d = rsc_data(Some("ns1"));
        let typed = meta.client_for(ClientContext::from(&d)).unwrap();
        let dynamic = get_client(Some(&d), Some(&meta)).unwrap();
        assert!(Arc::ptr_eq(&typed, &dynamic));
    }
}
