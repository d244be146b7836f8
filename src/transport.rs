use crate::config::ClientConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Whether a request produced a response body at all. The backend encodes
/// success and failure inside the JSON body, never in the HTTP status, so the
/// transport only distinguishes "got a body" from "got nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOutcome {
    Delivered,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub body: String,
    pub outcome: TransportOutcome,
}

impl RawResponse {
    pub fn delivered(body: impl Into<String>) -> Self {
        Self { body: body.into(), outcome: TransportOutcome::Delivered }
    }

    /// Synthetic response for a connection error, timeout, or body-read
    /// failure. Always has an empty body.
    pub fn failed() -> Self {
        Self { body: String::new(), outcome: TransportOutcome::Failed }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == TransportOutcome::Failed || self.body.is_empty()
    }
}

/// The wire boundary. The client only ever submits a JSON body to a path or
/// polls a session; tests substitute a scripted implementation.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn submit(&self, path: &str, body: &Value) -> RawResponse;
    async fn poll_status(&self, session_id: &str) -> RawResponse;
}

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
    submit_timeout: Duration,
    poll_timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(config.backend_url()).context("invalid backend base URL")?;
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            submit_timeout: Duration::from_millis(config.submit_timeout_ms()),
            poll_timeout: Duration::from_millis(config.poll_timeout_ms()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Option<Url> {
        match self.base_url.join(path) {
            Ok(url) => Some(url),
            Err(err) => {
                warn!("failed to build endpoint URL for {path}: {err}");
                None
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn submit(&self, path: &str, body: &Value) -> RawResponse {
        let Some(url) = self.endpoint(path) else {
            return RawResponse::failed();
        };
        let response = self
            .http
            .post(url)
            .timeout(self.submit_timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await;
        match response {
            Ok(response) => match response.text().await {
                Ok(text) => RawResponse::delivered(text),
                Err(err) => {
                    warn!("failed to read response body from {path}: {err}");
                    RawResponse::failed()
                }
            },
            Err(err) => {
                warn!("request to {path} failed: {err}");
                RawResponse::failed()
            }
        }
    }

    async fn poll_status(&self, session_id: &str) -> RawResponse {
        let Some(url) = self.endpoint(&format!("/api/juce/poll_status/{session_id}")) else {
            return RawResponse::failed();
        };
        match self.http.get(url).timeout(self.poll_timeout).send().await {
            Ok(response) => match response.text().await {
                Ok(text) => RawResponse::delivered(text),
                Err(err) => {
                    warn!("failed to read poll body for {session_id}: {err}");
                    RawResponse::failed()
                }
            },
            Err(err) => {
                warn!("status poll failed for {session_id}: {err}");
                RawResponse::failed()
            }
        }
    }
}
