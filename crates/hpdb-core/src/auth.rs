//! Authenticators.
//!
//! An [`Authenticator`] adds credentials to the outgoing headers immediately before
//! each attempt is sent, so requests never carry authentication material themselves
//! and a token can be refreshed between calls without rebuilding anything.

use crate::client::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use crate::error::{ApiError, TransportErrorKind};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Default IAM token service.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

/// Grant type used to exchange an API key for an access token.
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Fallback token lifetime when the token service does not report one.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Supported authentication schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    /// No credentials
    NoAuth,
    /// HTTP basic authentication
    Basic,
    /// Static bearer token
    BearerToken,
    /// IAM API key exchanged for short-lived bearer tokens
    Iam,
}

impl AuthScheme {
    /// Canonical property value for the scheme.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NoAuth => "noauth",
            Self::Basic => "basic",
            Self::BearerToken => "bearerToken",
            Self::Iam => "iam",
        }
    }
}

impl FromStr for AuthScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "noauth" | "none" => Ok(Self::NoAuth),
            "basic" => Ok(Self::Basic),
            "bearertoken" | "bearer" => Ok(Self::BearerToken),
            "iam" => Ok(Self::Iam),
            _ => Err(Error::config(
                "AUTH_TYPE",
                format!("unsupported authentication type `{s}`"),
            )),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Adds authentication material to outgoing requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// The scheme this authenticator implements.
    fn scheme(&self) -> AuthScheme;

    /// Add credentials to `headers`.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials cannot be obtained (for example an IAM token
    /// exchange failure).
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()>;
}

/// Sends requests without credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::NoAuth
    }

    async fn authenticate(&self, _headers: &mut HeaderMap) -> Result<()> {
        Ok(())
    }
}

/// HTTP basic authentication.
#[derive(Debug)]
pub struct BasicAuthenticator {
    username: String,
    password: SecretString,
}

impl BasicAuthenticator {
    /// Create a basic authenticator.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the username is empty or contains `:`.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        if username.is_empty() || username.contains(':') {
            return Err(Error::config(
                "USERNAME",
                "username must be non-empty and must not contain `:`",
            ));
        }
        Ok(Self {
            username,
            password: SecretString::from(password.into()),
        })
    }

    /// The configured username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::Basic
    }

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let encoded = STANDARD.encode(format!(
            "{}:{}",
            self.username,
            self.password.expose_secret()
        ));
        headers.insert(AUTHORIZATION, sensitive(&format!("Basic {encoded}"), "PASSWORD")?);
        Ok(())
    }
}

/// Static bearer token.
#[derive(Debug)]
pub struct BearerTokenAuthenticator {
    token: SecretString,
}

impl BearerTokenAuthenticator {
    /// Create a bearer token authenticator.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::config("BEARER_TOKEN", "bearer token must not be empty"));
        }
        Ok(Self {
            token: SecretString::from(token),
        })
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::BearerToken
    }

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let value = format!("Bearer {}", self.token.expose_secret());
        headers.insert(AUTHORIZATION, sensitive(&value, "BEARER_TOKEN")?);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug)]
struct CachedToken {
    access_token: SecretString,
    refresh_at: Instant,
}

/// Exchanges an IAM API key for bearer tokens and caches them.
///
/// A cached token is reused until 80% of its lifetime has passed. Concurrent callers
/// that find the cache stale wait on a single refresh.
///
/// The token exchange gets its own HTTP client. Give it the same timeouts and TLS
/// settings as the service calls with [`with_http_settings`](Self::with_http_settings).
#[derive(Debug)]
pub struct IamAuthenticator {
    api_key: SecretString,
    key_field: String,
    token_url: Url,
    http: Client,
    token: RwLock<Option<CachedToken>>,
}

impl IamAuthenticator {
    /// Create an IAM authenticator against the default token service.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_url(api_key, DEFAULT_IAM_URL)
    }

    /// Create an IAM authenticator against a specific token service.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is empty or the URL is invalid.
    pub fn with_url(api_key: impl Into<String>, auth_url: impl AsRef<str>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("APIKEY", "IAM API key must not be empty"));
        }

        let base = Url::parse(auth_url.as_ref())
            .map_err(|err| Error::config("AUTH_URL", format!("invalid IAM URL: {err}")))?;
        let token_url = if base.path().ends_with("/identity/token") {
            base
        } else {
            let mut url = base.clone();
            url.set_path(&format!("{}/identity/token", base.path().trim_end_matches('/')));
            url
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            key_field: "APIKEY".to_string(),
            token_url,
            http: token_client(
                Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
                true,
            )?,
            token: RwLock::new(None),
        })
    }

    /// Rebuild the token client with the given timeouts and TLS verification.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be constructed.
    pub fn with_http_settings(
        mut self,
        timeout: Duration,
        connect_timeout: Duration,
        tls_verify: bool,
    ) -> Result<Self> {
        self.http = token_client(timeout, connect_timeout, tls_verify)?;
        Ok(self)
    }

    /// Property name reported when the token service rejects the API key.
    #[must_use]
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }

    /// Token endpoint the API key is exchanged at.
    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Return a valid access token, fetching a new one if the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token service rejects the API key, or a
    /// transport error if it cannot be reached or fails.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.expose_secret().to_string());
            }
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.expose_secret().to_string());
            }
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        let lifetime = fresh.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let refresh_after = Duration::from_secs(lifetime.saturating_mul(8) / 10);
        debug!(?refresh_after, "Fetched IAM access token");

        *cached = Some(CachedToken {
            access_token: SecretString::from(fresh.access_token),
            refresh_at: Instant::now() + refresh_after,
        });

        Ok(access_token)
    }

    async fn request_token(&self) -> Result<TokenResponse> {
        let form = [
            ("grant_type", IAM_GRANT_TYPE),
            ("apikey", self.api_key.expose_secret()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::Api(ApiError::from_response(status, text)));
        }
        if status.is_client_error() {
            return Err(Error::config(
                self.key_field.clone(),
                format!("IAM token request rejected with status {status}: {text}"),
            ));
        }
        if !status.is_success() {
            return Err(Error::transport(
                TransportErrorKind::Io,
                format!("IAM token service returned status {status}: {text}"),
            ));
        }

        serde_json::from_str(&text).map_err(|err| Error::Decode {
            status: status.as_u16(),
            message: format!("Failed to parse IAM token response: {err}"),
            body: text,
        })
    }
}

#[async_trait]
impl Authenticator for IamAuthenticator {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::Iam
    }

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let token = self.access_token().await?;
        headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {token}"), &self.key_field)?);
        Ok(())
    }
}

fn token_client(timeout: Duration, connect_timeout: Duration, tls_verify: bool) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(connect_timeout);
    if !tls_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder
        .build()
        .map_err(|err| Error::config("http_client", format!("Failed to build IAM HTTP client: {err}")))
}

fn sensitive(value: &str, field: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| Error::config(field, "credential contains characters not allowed in a header"))?;
    header.set_sensitive(true);
    Ok(header)
}
