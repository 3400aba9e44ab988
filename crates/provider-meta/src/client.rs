//! # Vault API Client
//!
//! [`Client`] is the object the cache clones per namespace. It is split in two:
//!
//! - an `Arc`'d inner part (token + transport) shared by every clone, and
//! - a per-clone header map, so setting a namespace on a clone never leaks
//!   back into the root client.
//!
//! Requests go through [`Client::logical`], which mirrors Vault's logical API
//! (`read`, `write`, `delete`).

use crate::consts::{NAMESPACE_HEADER_NAME, PATH_DELIM, TOKEN_HEADER_NAME};
use crate::transport::Transport;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Header name to value.
pub type Headers = BTreeMap<String, String>;

/// Errors raised while talking to Vault.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("Code: {code}. Errors: {}", errors.join(", "))]
    Status { code: u16, errors: Vec<String> },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("unexpected request: {0}")]
    Unexpected(String),
}

/// HTTP verbs used by the logical API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request, ready for a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Logical path without the `/v1/` prefix or surrounding separators.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    pub body: Option<Value>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A secret as returned by Vault's logical API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub lease_id: String,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

impl Secret {
    /// Builds a secret carrying only `data`.
    pub fn with_data(data: Map<String, Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

struct ClientInner {
    token: Option<String>,
    transport: Arc<dyn Transport>,
}

/// A Vault API client.
///
/// Cloning is cheap: the transport is shared, only the header map is copied.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    headers: Headers,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                token: None,
                transport,
            }),
            headers: Headers::new(),
        }
    }

    /// Returns a client that authenticates with `token`.
    ///
    /// Existing clones keep their previous token.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                token: Some(token.into()),
                transport: Arc::clone(&self.inner.transport),
            }),
            headers: self.headers,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.inner.token.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Scopes this client to `namespace`.
    ///
    /// An empty namespace is the root namespace and clears the header.
    pub fn set_namespace(&mut self, namespace: &str) {
        if namespace.is_empty() {
            self.clear_namespace();
        } else {
            self.set_header(NAMESPACE_HEADER_NAME, namespace);
        }
    }

    pub fn clear_namespace(&mut self) {
        self.headers.remove(NAMESPACE_HEADER_NAME);
    }

    pub fn namespace(&self) -> Option<&str> {
        self.headers.get(NAMESPACE_HEADER_NAME).map(String::as_str)
    }

    pub fn logical(&self) -> Logical<'_> {
        Logical { client: self }
    }

    fn request(&self, method: Method, path: &str) -> Request {
        let mut headers = self.headers.clone();
        if let Some(token) = &self.inner.token {
            headers.insert(TOKEN_HEADER_NAME.to_string(), token.clone());
        }
        Request {
            method,
            path: path.trim_matches(PATH_DELIM).to_string(),
            query: Vec::new(),
            headers,
            body: None,
        }
    }

    async fn send(&self, request: Request) -> Result<Option<Secret>, ClientError> {
        debug!(
            method = %request.method,
            path = %request.path,
            namespace = self.namespace().unwrap_or_default(),
            "Sending request"
        );
        self.inner.transport.send(request).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("token", &self.inner.token.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers)
            .finish()
    }
}

/// Vault's logical backend API, borrowed from a [`Client`].
pub struct Logical<'a> {
    client: &'a Client,
}

impl Logical<'_> {
    /// Reads `path`. `Ok(None)` means nothing is stored there.
    pub async fn read(&self, path: &str) -> Result<Option<Secret>, ClientError> {
        self.read_with_data(path, &[]).await
    }

    /// Reads `path`, passing `data` as query parameters.
    pub async fn read_with_data(
        &self,
        path: &str,
        data: &[(&str, &str)],
    ) -> Result<Option<Secret>, ClientError> {
        let mut request = self.client.request(Method::Get, path);
        request.query = data
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.client.send(request).await
    }

    pub async fn write(&self, path: &str, data: Value) -> Result<Option<Secret>, ClientError> {
        let mut request = self.client.request(Method::Put, path);
        request.body = Some(data);
        self.client.send(request).await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Secret>, ClientError> {
        let request = self.client.request(Method::Delete, path);
        self.client.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use serde_json::json;

    #[test]
    fn test_namespace_on_clone_does_not_touch_root() {
        let root = Client::new(Arc::new(MockTransport::new()));
        let mut scoped = root.clone();
        scoped.set_namespace("team-a");

        assert_eq!(scoped.namespace(), Some("team-a"));
        assert_eq!(root.namespace(), None);
        assert!(root.headers().is_empty());
    }

    #[test]
    fn test_empty_namespace_clears_header() {
        let mut client = Client::new(Arc::new(MockTransport::new()));
        client.set_namespace("team-a");
        client.set_namespace("");
        assert_eq!(client.namespace(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = Client::new(Arc::new(MockTransport::new())).with_token("s.secret");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("s.secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_secret_decodes_null_data() {
        let secret: Secret = serde_json::from_value(json!({
            "request_id": "r-1",
            "lease_id": "",
            "lease_duration": 0,
            "renewable": false,
            "data": null,
        }))
        .unwrap();
        assert!(secret.data.is_empty());
        assert_eq!(secret.request_id, "r-1");
    }

    #[tokio::test]
    async fn test_read_with_data_sends_headers_and_query() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Get, "gcp/key/app")
            .return_ok(Some(Secret::with_data(Map::new())));
        let mock = Arc::new(mock);

        let mut client = Client::new(mock.clone()).with_token("s.token");
        client.set_namespace("team-a");

        let secret = client
            .logical()
            .read_with_data("/gcp/key/app/", &[("ttl", "1h")])
            .await
            .unwrap();
        assert!(secret.is_some());

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.path, "gcp/key/app");
        assert_eq!(request.query, vec![("ttl".to_string(), "1h".to_string())]);
        assert_eq!(request.header(NAMESPACE_HEADER_NAME), Some("team-a"));
        assert_eq!(request.header(TOKEN_HEADER_NAME), Some("s.token"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_write_carries_body() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Put, "sys/leases/revoke").return_ok(None);
        let mock = Arc::new(mock);

        let client = Client::new(mock.clone());
        let resp = client
            .logical()
            .write("sys/leases/revoke", json!({"lease_id": "l-1"}))
            .await
            .unwrap();
        assert!(resp.is_none());
        assert_eq!(mock.requests()[0].body, Some(json!({"lease_id": "l-1"})));
    }

    #[tokio::test]
    async fn test_delete_sends_no_body() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Delete, "gcp/roleset/editor").return_ok(None);
        let mock = Arc::new(mock);

        let mut client = Client::new(mock.clone()).with_token("s.token");
        client.set_namespace("team-a");
        let resp = client.logical().delete("/gcp/roleset/editor").await.unwrap();

        assert!(resp.is_none());
        let request = &mock.requests()[0];
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.body, None);
        assert_eq!(request.header(NAMESPACE_HEADER_NAME), Some("team-a"));
        mock.verify();
    }
}
