//! HTTP client used by the url source.
//!
//! The [`HttpClient`] trait performs one GET and reports either a 2xx
//! response or an [`HttpError`]. Error messages follow the usual client
//! wording (`Request failed with status code 503`, `timeout of 20000ms
//! exceeded`) since they end up verbatim in recorded attempts.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::types::{Attempt, ConfstackError, Result};

/// Response of a successful request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Map<String, Value>,
    /// Parsed JSON body, or the raw text when the body is not JSON
    pub data: Value,
}

impl HttpResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            headers: Map::new(),
            data,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), Value::String(value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HttpError {
    /// The server answered with a non-2xx status
    #[error("{message}")]
    Status {
        message: String,
        response: HttpResponse,
    },

    /// No response: timeout, DNS, connection refused
    #[error("{message}")]
    Transport { message: String },
}

impl HttpError {
    pub fn status(response: HttpResponse) -> Self {
        Self::Status {
            message: format!("Request failed with status code {}", response.status),
            response,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::transport(format!("timeout of {}ms exceeded", timeout.as_millis()))
    }

    /// Record this failure as a url attempt
    pub fn into_attempt(self) -> Attempt {
        match self {
            Self::Status { message, response } => {
                Attempt::response(message, response.status, response.data, response.headers)
            }
            Self::Transport { message } => Attempt::transport(message),
        }
    }
}

/// Performs GET requests
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> std::result::Result<HttpResponse, HttpError>;
}

/// Shared client type for the url source and its retry task.
pub type SharedHttpClient = Arc<dyn HttpClient>;

// =============================================================================
// reqwest client
// =============================================================================

/// [`HttpClient`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("confstack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfstackError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn map_error(error: reqwest::Error, timeout: Duration) -> HttpError {
        if error.is_timeout() {
            HttpError::timeout(timeout)
        } else {
            HttpError::transport(error.to_string())
        }
    }
}

fn header_map(headers: &reqwest::header::HeaderMap) -> Map<String, Value> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), Value::String(value.to_string())))
        })
        .collect()
}

/// JSON when the body parses, the raw text otherwise
fn parse_body(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, timeout: Duration) -> std::result::Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        let status = response.status();
        let headers = header_map(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        let response = HttpResponse {
            status: status.as_u16(),
            headers,
            data: parse_body(body),
        };

        if status.is_success() {
            Ok(response)
        } else {
            Err(HttpError::status(response))
        }
    }
}
