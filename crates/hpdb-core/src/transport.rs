//! HTTP transport boundary.
//!
//! The invoker talks to the network only through [`Transport`], which lets tests swap
//! in mocks and keeps authentication and retry logic independent of reqwest.

use crate::config::ClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use tracing::warn;
use url::Url;

/// Outbound request as handed to the transport, authentication included.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including the query string
    pub url: Url,
    /// Headers to send
    pub headers: HeaderMap,
    /// Serialized body
    pub body: Option<Vec<u8>>,
}

/// Completed HTTP exchange, whatever the status code.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one HTTP request and returns the response.
///
/// Implementations return `Ok` for every completed exchange, including non-2xx
/// statuses, and `Err` only when no response was received.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on connection, timeout or I/O failures.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Build a transport using the timeouts, pool and TLS settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .user_agent(config.user_agent())
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(config.pool_idle_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host())
            .gzip(config.compression_enabled());

        if !config.tls_verify() {
            warn!(url = %config.base_url(), "TLS verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|err| Error::config("http_client", format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client.
    #[must_use]
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
