//! HTTP transport for submitting forms.
//!
//! This module defines the `FormTransport` trait so the controller can be exercised without a
//! live service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use url::Url;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::form::FormSnapshot;

/// Response from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for POSTing a validated form as a multipart body.
///
/// # Errors
/// Implementations return [`Error::Transport`] when no response could be obtained: connection
/// failures, timeouts, or a body that could not be read. Any HTTP status, success or not, is a
/// successful return.
#[async_trait]
pub trait FormTransport: Send + Sync {
    async fn post_form(&self, path: &str, form: &FormSnapshot) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Create a transport rooted at `base_url`. Without a timeout, requests run until the
    /// service answers or the connection fails.
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    /// Endpoint paths are appended to the base URL, so a base with a path prefix is preserved.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl FormTransport for ReqwestTransport {
    #[tracing::instrument(skip(self, form), fields(filename = %form.file.filename, size = form.file.len()))]
    async fn post_form(&self, path: &str, form: &FormSnapshot) -> Result<HttpResponse> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "Submitting form");

        let response = self
            .client
            .post(&url)
            .multipart(form.to_multipart()?)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "HTTP request failed");
                e
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::info!(status = status, response_len = body.len(), "Form submission completed");

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

/// Mock transport returning predetermined responses per path, in FIFO order.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, Vec<Result<HttpResponse>>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

/// Record of a submission made to the mock transport.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub path: String,
    pub form: FormSnapshot,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_response(&self, path: &str, response: Result<HttpResponse>) {
        self.responses.lock().entry(path.to_string()).or_default().push(response);
    }

    /// Shorthand for a response with a JSON body.
    pub fn add_json(&self, path: &str, status: u16, body: serde_json::Value) {
        self.add_response(
            path,
            Ok(HttpResponse {
                status,
                body: Bytes::from(body.to_string()),
            }),
        );
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl FormTransport for MockTransport {
    async fn post_form(&self, path: &str, form: &FormSnapshot) -> Result<HttpResponse> {
        self.calls.lock().push(MockCall {
            path: path.to_string(),
            form: form.clone(),
        });

        let mut responses = self.responses.lock();
        if let Some(queue) = responses.get_mut(path) {
            if !queue.is_empty() {
                return queue.remove(0);
            }
        }

        Err(Error::Transport(anyhow::anyhow!("No mock response configured for POST {path}")))
    }
}
