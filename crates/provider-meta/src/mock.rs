//! # Mock Transport
//!
//! Utilities for testing resource code without a Vault server.
//!
//! Register expectations with [`MockTransport::expect`], hand the transport to a
//! [`Client`](crate::Client), then inspect [`MockTransport::requests`] and call
//! [`MockTransport::verify`].
//!
//! ```
//! use provider_meta::mock::MockTransport;
//! use provider_meta::{Client, Method, Secret};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut mock = MockTransport::new();
//! mock.expect(Method::Get, "gcp/roleset/app").return_ok(Some(Secret::default()));
//! let mock = Arc::new(mock);
//!
//! let client = Client::new(mock.clone());
//! let secret = client.logical().read("gcp/roleset/app").await.unwrap();
//! assert!(secret.is_some());
//! mock.verify();
//! # }
//! ```
//!
//! Expectations are matched by method and path, first registered first served,
//! so concurrent callers may arrive in any order.

use crate::client::{ClientError, Method, Request, Secret};
use crate::consts::PATH_DELIM;
use crate::transport::Transport;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct Expectation {
    method: Method,
    path: String,
    response: Result<Option<Secret>, ClientError>,
}

/// An in-memory [`Transport`] that answers from registered expectations.
#[derive(Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one request for `method` on `path`.
    pub fn expect(&mut self, method: Method, path: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            path: path.trim_matches(PATH_DELIM).to_string(),
            expectations: self.expectations.clone(),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Panics if any expectation was not consumed.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            let pending: Vec<String> = exps
                .iter()
                .map(|e| format!("{} {}", e.method, e.path))
                .collect();
            panic!("Not all expectations were met. {} remaining: {:?}", exps.len(), pending);
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Option<Secret>, ClientError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut exps = self.expectations.lock().unwrap();
        let position = exps
            .iter()
            .position(|e| e.method == request.method && e.path == request.path);
        match position.and_then(|i| exps.remove(i)) {
            Some(expectation) => expectation.response,
            None => Err(ClientError::Unexpected(format!(
                "{} {}",
                request.method, request.path
            ))),
        }
    }
}

/// Builder returned by [`MockTransport::expect`].
pub struct ExpectationBuilder {
    method: Method,
    path: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ExpectationBuilder {
    /// Answers the request with `secret`.
    pub fn return_ok(self, secret: Option<Secret>) {
        self.push(Ok(secret));
    }

    /// Answers the request with `error`.
    pub fn return_err(self, error: ClientError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Option<Secret>, ClientError>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            method: self.method,
            path: self.path,
            response,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Client;

    #[tokio::test]
    async fn test_unexpected_request_is_an_error() {
        let client = Client::new(Arc::new(MockTransport::new()));
        let err = client.logical().read("secret/missing").await.unwrap_err();
        assert_eq!(err, ClientError::Unexpected("GET secret/missing".to_string()));
    }

    #[tokio::test]
    async fn test_expectations_match_by_method_and_path() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Put, "sys/leases/revoke").return_ok(None);
        mock.expect(Method::Get, "gcp/roleset/app")
            .return_err(ClientError::Status { code: 403, errors: vec!["permission denied".into()] });
        let mock = Arc::new(mock);
        let client = Client::new(mock.clone());

        // Served out of registration order.
        let err = client.logical().read("gcp/roleset/app").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { code: 403, .. }));
        assert_eq!(err.to_string(), "Code: 403. Errors: permission denied");

        let resp = client
            .logical()
            .write("sys/leases/revoke", serde_json::json!({}))
            .await
            .unwrap();
        assert!(resp.is_none());

        mock.verify();
        assert_eq!(mock.requests().len(), 2);
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn test_verify_panics_on_pending_expectation() {
        let mut mock = MockTransport::new();
        mock.expect(Method::Delete, "secret/app").return_ok(None);
        mock.verify();
    }
}
