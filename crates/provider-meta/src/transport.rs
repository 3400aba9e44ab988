//! # Transports
//!
//! A [`Transport`] moves a [`Request`] to Vault and back. [`HttpTransport`] is
//! the real one; tests use [`MockTransport`](crate::mock::MockTransport).

use crate::client::{ClientError, Method, Request, Secret};
use crate::consts::PATH_DELIM;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Sends logical API requests.
///
/// `Ok(None)` means the server answered without a secret (HTTP 204, or a 404
/// on a read).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Option<Secret>, ClientError>;
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<String>,
}

/// HTTP transport backed by a blocking `ureq` agent.
///
/// Each request runs on tokio's blocking pool so async callers are never stalled.
#[derive(Clone)]
pub struct HttpTransport {
    address: Url,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(address: &str) -> Result<Self, ClientError> {
        Self::with_agent(address, ureq::AgentBuilder::new().build())
    }

    pub fn with_timeout(address: &str, timeout: Duration) -> Result<Self, ClientError> {
        Self::with_agent(address, ureq::AgentBuilder::new().timeout(timeout).build())
    }

    fn with_agent(address: &str, agent: ureq::Agent) -> Result<Self, ClientError> {
        let address =
            Url::parse(address).map_err(|e| ClientError::InvalidAddress(format!("{address}: {e}")))?;
        if address.cannot_be_a_base() {
            return Err(ClientError::InvalidAddress(address.to_string()));
        }
        Ok(Self { address, agent })
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    /// Resolves a logical path to `<address>/v1/<path>?<query>`.
    fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url, ClientError> {
        let mut url = self.address.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidAddress(self.address.to_string()))?
            .pop_if_empty()
            .push("v1")
            .extend(path.split(PATH_DELIM).filter(|segment| !segment.is_empty()));
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Option<Secret>, ClientError> {
        let url = self.endpoint(&request.path, &request.query)?;
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || send_blocking(&agent, &url, &request))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?
    }
}

fn send_blocking(
    agent: &ureq::Agent,
    url: &Url,
    request: &Request,
) -> Result<Option<Secret>, ClientError> {
    let mut call = agent.request(request.method.as_str(), url.as_str());
    for (name, value) in &request.headers {
        call = call.set(name, value);
    }

    let result = match &request.body {
        Some(body) => call
            .set("Content-Type", "application/json")
            .send_string(&body.to_string()),
        None => call.call(),
    };

    match result {
        Ok(response) => {
            let status = response.status();
            let body = response
                .into_string()
                .map_err(|e| ClientError::Decode(e.to_string()))?;
            decode_secret(status, &body)
        }
        Err(ureq::Error::Status(404, _)) if request.method == Method::Get => Ok(None),
        Err(ureq::Error::Status(code, response)) => Err(ClientError::Status {
            code,
            errors: parse_errors(&response.into_string().unwrap_or_default()),
        }),
        Err(ureq::Error::Transport(err)) => Err(ClientError::Transport(err.to_string())),
    }
}

fn decode_secret(status: u16, body: &str) -> Result<Option<Secret>, ClientError> {
    if status == 204 || body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

fn parse_errors(body: &str) -> Vec<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.errors)
        .unwrap_or_default()
}
