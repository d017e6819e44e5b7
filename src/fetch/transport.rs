use std::time::Duration;

use crate::foundation::{
    config::GrabConfig,
    error::{GrabError, GrabResult},
};

/// Status and body of one HTTP GET.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// One open session against the remote service, shared by every request of a batch.
///
/// Only transport-level failures are errors; any HTTP status comes back as a [`Response`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> GrabResult<Response>;
}

/// Opens sessions. Area runs open one per run, history runs one per day.
pub trait Connect: Send + Sync {
    fn connect(&self) -> GrabResult<Box<dyn Transport>>;
}

/// [`Connect`] implementation backed by `reqwest`'s blocking client.
#[derive(Clone, Debug)]
pub struct HttpConnector {
    pub user_agent: String,
    pub timeout: Duration,
}

impl HttpConnector {
    pub fn from_config(cfg: &GrabConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            timeout: Duration::from_secs(cfg.request_timeout_secs),
        }
    }
}

impl Connect for HttpConnector {
    fn connect(&self) -> GrabResult<Box<dyn Transport>> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .build()
            .map_err(|e| GrabError::fetch(format!("failed to build http client: {e}")))?;
        Ok(Box::new(HttpTransport { client }))
    }
}

/// Pooled HTTP session; connections are reused until it is dropped.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> GrabResult<Response> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| GrabError::fetch(format!("GET {url}: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|e| GrabError::fetch(format!("read body of {url}: {e}")))?;
        tracing::debug!(url, status, bytes = body.len(), "response");
        Ok(Response::new(status, body.to_vec()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fetch/transport.rs"]
mod tests;
