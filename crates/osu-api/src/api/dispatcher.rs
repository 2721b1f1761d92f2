//! Request dispatcher with rate limiting and outcome classification.
//!
//! Turns a [`Request`] into an HTTP call, waits for a rate limiter admission
//! and sorts the result into success, network error (status >= 400) or local
//! error (transport or decoding). Nothing is retried here.

use super::rate_limiter::RateLimiter;
use super::request::Request;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// User agent sent when neither the options nor the request override it
pub const DEFAULT_USER_AGENT: &str = concat!("osu-api/", env!("CARGO_PKG_VERSION"));

/// Something that can carry a [`Request`] to the API
///
/// Returns the raw response body, or `None` when the request asked for its
/// output to be discarded.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_raw(&self, request: Request) -> Result<Option<String>>;
}

/// Dispatcher settings
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    /// URL scheme
    pub scheme: String,
    /// Host used when a request has no override
    pub host: String,
    /// Port
    pub port: u16,
    /// User agent override
    pub user_agent: Option<String>,
    /// Transport timeout
    pub timeout: Duration,
    /// Admissions per rate limit window
    pub rate_limit: usize,
    /// Rate limit window
    pub rate_interval: Duration,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "osu.ppy.sh".to_string(),
            port: 443,
            user_agent: None,
            timeout: Duration::from_secs(30),
            rate_limit: 50,
            rate_interval: Duration::from_secs(10),
        }
    }
}

impl DispatcherOptions {
    /// Build dispatcher options from the workspace configuration
    pub fn from_config(config: &shared::Config) -> Self {
        Self {
            scheme: config.api.scheme.clone(),
            host: config.api.host.clone(),
            port: config.api.port,
            user_agent: config.api.user_agent.clone(),
            timeout: Duration::from_secs(config.api.timeout_secs),
            rate_limit: config.rate_limit.limit,
            rate_interval: Duration::from_millis(config.rate_limit.interval_ms),
        }
    }
}

/// A request ready to go on the wire
#[derive(Debug, Clone)]
pub struct SerializedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl SerializedRequest {
    /// Path plus query string
    pub fn path(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    /// Look up a header, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Rate-limited HTTP dispatcher
pub struct RequestDispatcher {
    /// HTTP client
    client: Client,
    /// Host, port and header defaults
    options: DispatcherOptions,
    /// Admission control, one admission per request sent
    rate_limiter: RateLimiter,
}

impl RequestDispatcher {
    /// Create a new dispatcher
    pub fn new(options: DispatcherOptions) -> Result<Self> {
        let client = Client::builder().timeout(options.timeout).build()?;
        let rate_limiter = RateLimiter::new(options.rate_limit, options.rate_interval)?;

        Ok(Self {
            client,
            options,
            rate_limiter,
        })
    }

    /// The dispatcher's rate limiter
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Resolve the endpoint, query, headers and body of a request
    pub fn serialize(&self, request: &Request) -> Result<SerializedRequest> {
        let path = request.resolve_path()?;
        let host = request.host.as_deref().unwrap_or(&self.options.host);

        let base = format!("{}://{}:{}", self.options.scheme, host, self.options.port);
        let mut url = Url::parse(&base)
            .map_err(|e| Error::InvalidArgument(format!("invalid host {}: {}", host, e)))?;
        url.set_path(&path);
        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let user_agent = request
            .user_agent
            .as_deref()
            .or(self.options.user_agent.as_deref())
            .unwrap_or(DEFAULT_USER_AGENT);

        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), user_agent.to_string()),
        ];

        if let Some(token) = &request.bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let body = match (&request.body, request.is_mutating()) {
            (Some(body), true) => Some(serde_json::to_vec(body)?),
            _ => None,
        };
        if let Some(body) = &body {
            headers.push(("Content-Length".to_string(), body.len().to_string()));
        }

        for (name, value) in &request.headers {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        Ok(SerializedRequest {
            method: request.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Send a request and parse the JSON response
    ///
    /// Resolves to `None` when the request discards its output.
    pub async fn send<T: DeserializeOwned>(&self, request: Request) -> Result<Option<T>> {
        let raw = self.send_raw(request).await?;
        raw.map(|body| decode(&body)).transpose()
    }
}

#[async_trait]
impl Transport for RequestDispatcher {
    async fn send_raw(&self, request: Request) -> Result<Option<String>> {
        let serialized = self.serialize(&request)?;

        self.rate_limiter.acquire().await;

        debug!(
            method = %serialized.method,
            url = %serialized.url,
            "Making API request"
        );

        let mut builder = self
            .client
            .request(serialized.method.clone(), serialized.url.clone());
        for (name, value) in &serialized.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = serialized.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url = %serialized.url, error = %e, "Request error");
            Error::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if status.as_u16() >= 400 {
            warn!(
                url = %serialized.url,
                status = %status,
                "Request failed"
            );
            return Err(Error::network(
                status.as_u16(),
                status.canonical_reason().unwrap_or("No message"),
                text,
            ));
        }

        debug!(url = %serialized.url, status = %status, "Request successful");

        if request.discard_output {
            return Ok(None);
        }
        Ok(Some(text))
    }
}

/// Parse a JSON response body
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}
