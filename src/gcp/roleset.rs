//! `vault_gcp_roleset` data source.

use super::{base_schema, SECRET_TYPE_SERVICE_ACCOUNT_KEY};
use crate::resource::{Resource, ResourceError};
use async_trait::async_trait;
use provider_meta::schema::{FieldSchema, FieldType, Schema};
use provider_meta::{get_client, CallContext, ResourceData};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Reads a roleset and checks that it can mint service account keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct RolesetDataSource;

impl RolesetDataSource {
    pub const NAME: &'static str = "vault_gcp_roleset";
}

/// Strings are kept as is; other values are stored as JSON.
fn to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flatten(data: &Map<String, Value>) -> Map<String, Value> {
    data.iter()
        .map(|(key, value)| (key.clone(), Value::String(to_plain_string(value))))
        .collect()
}

#[async_trait]
impl Resource for RolesetDataSource {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn schema(&self) -> Schema {
        base_schema().field(
            "data",
            FieldSchema::new(FieldType::Map)
                .computed()
                .sensitive()
                .description("Map of strings read from Vault."),
        )
    }

    #[instrument(skip_all, fields(resource = "vault_gcp_roleset"))]
    async fn read(&self, d: &mut ResourceData, meta: &dyn CallContext) -> Result<(), ResourceError> {
        let client = get_client(Some(&*d), Some(meta))?;

        let backend = d.get_str("backend").unwrap_or_default();
        let roleset = d.get_str("roleset").unwrap_or_default().to_string();
        let path = format!("{backend}/roleset/{roleset}");

        let secret = client
            .logical()
            .read(&path)
            .await?
            .ok_or_else(|| ResourceError::NotFound {
                kind: "roleset",
                path: path.clone(),
            })?;
        debug!(%path, request_id = %secret.request_id, "Read roleset");

        d.set_id(path);
        d.set("data", flatten(&secret.data))?;

        match secret.data.get("secret_type") {
            Some(Value::String(t)) if t == SECRET_TYPE_SERVICE_ACCOUNT_KEY => Ok(()),
            other => Err(ResourceError::InvalidSecretType {
                roleset,
                secret_type: other.map_or_else(|| "none".to_string(), to_plain_string),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_meta::consts::{FIELD_NAMESPACE, NAMESPACE_HEADER_NAME};
    use provider_meta::mock::MockTransport;
    use provider_meta::{Client, ClientError, Method, ProviderMeta, Secret};
    use serde_json::json;
    use std::sync::Arc;

    fn meta(mock: MockTransport) -> (Arc<MockTransport>, ProviderMeta) {
        let mock = Arc::new(mock);
        let provider_data = crate::config::ProviderConfig::default()
            .to_resource_data()
            .unwrap();
        let meta = ProviderMeta::new(Client::new(mock.clone()), provider_data);
        (mock, meta)
    }

    fn roleset_data(secret_type: &str) -> Map<String, Value> {
        json!({
            "secret_type": secret_type,
            "project": "my-project",
            "bindings": {"//cloudresourcemanager.googleapis.com/projects/my-project": ["roles/viewer"]},
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn config(backend: &str) -> ResourceData {
        let mut d = ResourceData::new(RolesetDataSource.schema());
        d.set("backend", backend).unwrap();
        d.set("roleset", "editor").unwrap();
        d
    }

    #[tokio::test]
    async fn test_read_records_flattened_data() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Get, "gcp/roleset/editor")
            .return_ok(Some(Secret::with_data(roleset_data("service_account_key"))));
        let (mock, meta) = meta(mock);

        let mut d = config("/gcp/");
        RolesetDataSource.read(&mut d, &meta).await.unwrap();

        assert_eq!(d.id(), "gcp/roleset/editor");
        let data = d.get("data").unwrap();
        assert_eq!(data["secret_type"], "service_account_key");
        assert_eq!(data["project"], "my-project");
        assert_eq!(
            data["bindings"],
            r#"{"//cloudresourcemanager.googleapis.com/projects/my-project":["roles/viewer"]}"#
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_wrong_secret_type_still_records_data() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Get, "gcp/roleset/editor")
            .return_ok(Some(Secret::with_data(roleset_data("access_token"))));
        let (_, meta) = meta(mock);

        let mut d = config("gcp");
        let err = RolesetDataSource.read(&mut d, &meta).await.unwrap_err();

        assert_eq!(
            err,
            ResourceError::InvalidSecretType {
                roleset: "editor".to_string(),
                secret_type: "access_token".to_string(),
            }
        );
        assert_eq!(d.id(), "gcp/roleset/editor");
        assert!(d.get("data").is_some());
    }

    #[tokio::test]
    async fn test_missing_roleset() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Get, "gcp/roleset/editor").return_ok(None);
        let (_, meta) = meta(mock);

        let mut d = config("gcp");
        let err = RolesetDataSource.read(&mut d, &meta).await.unwrap_err();

        assert_eq!(
            err,
            ResourceError::NotFound {
                kind: "roleset",
                path: "gcp/roleset/editor".to_string(),
            }
        );
        assert_eq!(d.id(), "");
    }

    #[tokio::test]
    async fn test_client_error() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Get, "gcp/roleset/editor")
            .return_err(ClientError::Transport("connection refused".to_string()));
        let (_, meta) = meta(mock);

        let err = RolesetDataSource
            .read(&mut config("gcp"), &meta)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "error reading from Vault: transport error: connection refused"
        );
    }

    #[tokio::test]
    async fn test_read_uses_resource_namespace() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Get, "gcp/roleset/editor")
            .return_ok(Some(Secret::with_data(roleset_data("service_account_key"))));
        let (mock, meta) = meta(mock);

        let mut d = config("gcp");
        d.set(FIELD_NAMESPACE, "team-a").unwrap();
        RolesetDataSource.read(&mut d, &meta).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].header(NAMESPACE_HEADER_NAME), Some("team-a"));
        assert_eq!(meta.cached_namespaces(), vec!["team-a".to_string()]);
    }
}
