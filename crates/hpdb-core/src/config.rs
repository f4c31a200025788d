//! Client configuration and its resolution.
//!
//! [`ConfigResolver`] produces an immutable [`ClientConfig`] from explicit overrides,
//! environment variables, a `KEY=VALUE` credentials file and built-in defaults, in that
//! order of precedence. Resolution never touches the network.

use crate::auth::{
    AuthScheme, Authenticator, BasicAuthenticator, BearerTokenAuthenticator, IamAuthenticator,
    NoAuth, DEFAULT_IAM_URL,
};
use crate::client::{
    RetryPolicy, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_POOL_IDLE_TIMEOUT,
    DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_TIMEOUT_SECS,
};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable naming a shared credentials file.
pub const SHARED_CREDENTIALS_FILE_ENV: &str = "IBM_CREDENTIALS_FILE";

/// Default user agent sent by the reqwest transport.
pub const DEFAULT_USER_AGENT: &str = concat!("hpdb-core/", env!("CARGO_PKG_VERSION"));

/// Immutable configuration shared by every call a client makes.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    authenticator: Arc<dyn Authenticator>,
    default_headers: HeaderMap,
    timeout: Duration,
    connect_timeout: Duration,
    retry_policy: RetryPolicy,
    pool_idle_timeout: Duration,
    pool_max_idle_per_host: usize,
    tls_verify: bool,
    enable_compression: bool,
    user_agent: String,
}

impl ClientConfig {
    /// Start building a configuration for `base_url`.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Service base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Authenticator applied before each attempt.
    #[must_use]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Headers added to every request.
    #[must_use]
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Per-attempt request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Retry policy for idempotent requests.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Connection pool idle timeout.
    #[must_use]
    pub const fn pool_idle_timeout(&self) -> Duration {
        self.pool_idle_timeout
    }

    /// Maximum idle connections per host.
    #[must_use]
    pub const fn pool_max_idle_per_host(&self) -> usize {
        self.pool_max_idle_per_host
    }

    /// Whether TLS certificates are verified.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Whether gzip response compression is negotiated.
    #[must_use]
    pub const fn compression_enabled(&self) -> bool {
        self.enable_compression
    }

    /// User agent string.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("auth_scheme", &self.authenticator.scheme())
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("tls_verify", &self.tls_verify)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Clone)]
pub struct ClientConfigBuilder {
    base_url: String,
    authenticator: Arc<dyn Authenticator>,
    default_headers: HeaderMap,
    timeout: Duration,
    connect_timeout: Duration,
    retry_policy: RetryPolicy,
    pool_idle_timeout: Duration,
    pool_max_idle_per_host: usize,
    tls_verify: bool,
    enable_compression: bool,
    user_agent: String,
}

impl ClientConfigBuilder {
    /// Create a builder with default settings and no authentication.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            authenticator: Arc::new(NoAuth),
            default_headers: HeaderMap::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            retry_policy: RetryPolicy::new(),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            tls_verify: true,
            enable_compression: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set the authenticator.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Arc::new(authenticator);
        self
    }

    /// Set a shared authenticator.
    #[must_use]
    pub fn with_shared_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Add a header sent with every request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name or value is not a valid header.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| Error::config(name, format!("invalid header name: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| Error::config(name, format!("invalid header value: {err}")))?;
        self.default_headers.insert(header, value);
        Ok(self)
    }

    /// Set the per-attempt request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Disable retries.
    #[must_use]
    pub const fn without_retries(mut self) -> Self {
        self.retry_policy = RetryPolicy::no_retry();
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Finalise the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is not an absolute http(s) URL or the
    /// timeout is zero.
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = parse_service_url(&self.base_url, "url")?;

        if self.timeout.is_zero() {
            return Err(Error::config("timeout", "timeout must be greater than zero"));
        }

        Ok(ClientConfig {
            base_url,
            authenticator: self.authenticator,
            default_headers: self.default_headers,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            retry_policy: self.retry_policy,
            pool_idle_timeout: self.pool_idle_timeout,
            pool_max_idle_per_host: self.pool_max_idle_per_host,
            tls_verify: self.tls_verify,
            enable_compression: self.enable_compression,
            user_agent: self.user_agent,
        })
    }
}

fn parse_service_url(raw: &str, field: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|err| Error::config(field, format!("invalid service URL `{raw}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::config(
            field,
            format!("service URL `{raw}` must be an absolute http or https URL"),
        ));
    }
    Ok(url)
}

/// Configuration properties understood by the resolver.
///
/// Each is looked up as `<SERVICE>_<KEY>`, e.g. `HPDB_URL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Service base URL
    Url,
    /// Authentication scheme (`noauth`, `basic`, `bearerToken`, `iam`)
    AuthType,
    /// IAM API key
    ApiKey,
    /// Static bearer token
    BearerToken,
    /// Basic auth username
    Username,
    /// Basic auth password
    Password,
    /// IAM token service URL
    AuthUrl,
    /// Disable TLS verification (`true`/`false`)
    DisableSsl,
    /// Request timeout in seconds
    Timeout,
    /// Maximum retries for idempotent requests
    MaxRetries,
}

impl Property {
    /// Suffix appended to the service prefix.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Url => "URL",
            Self::AuthType => "AUTH_TYPE",
            Self::ApiKey => "APIKEY",
            Self::BearerToken => "BEARER_TOKEN",
            Self::Username => "USERNAME",
            Self::Password => "PASSWORD",
            Self::AuthUrl => "AUTH_URL",
            Self::DisableSsl => "DISABLE_SSL",
            Self::Timeout => "TIMEOUT",
            Self::MaxRetries => "MAX_RETRIES",
        }
    }
}

/// Source of environment variables.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The real process environment
    #[default]
    Process,
    /// A fixed set of variables
    Pairs(HashMap<String, String>),
}

impl EnvSource {
    /// Read from the process environment.
    #[must_use]
    pub const fn process() -> Self {
        Self::Process
    }

    /// Use a fixed set of variables.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// An empty environment.
    #[must_use]
    pub fn empty() -> Self {
        Self::Pairs(HashMap::new())
    }

    /// Look up a variable, treating empty values as unset.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match self {
            Self::Process => std::env::var(key).ok(),
            Self::Pairs(map) => map.get(key).cloned(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// Parse a `KEY=VALUE` credentials file.
///
/// Blank lines and `#` comments are skipped, keys and values are trimmed, and a value
/// wrapped in matching single or double quotes is unquoted.
#[must_use]
pub fn parse_credentials(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim()).to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Read and parse a credentials file.
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read.
pub fn load_credentials_file(path: &Path) -> Result<HashMap<String, String>> {
    let contents = std::fs::read_to_string(path).map_err(|err| {
        Error::config(
            "CREDENTIALS_FILE",
            format!("failed to read credentials file {}: {err}", path.display()),
        )
    })?;
    Ok(parse_credentials(&contents))
}

/// Resolved numeric and URL settings, range-checked before use.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceProperties {
    /// Service base URL
    #[validate(url)]
    pub url: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub timeout: u64,

    /// Maximum retry attempts
    #[validate(range(max = 10))]
    pub max_retries: u32,
}

/// Resolves a [`ClientConfig`] for one service.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    service_name: String,
    overrides: HashMap<Property, String>,
    env: EnvSource,
    credentials_file: Option<PathBuf>,
    default_url: Option<String>,
    retry_policy: RetryPolicy,
    user_agent: Option<String>,
}

impl ConfigResolver {
    /// Create a resolver for `service_name`, reading the process environment.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            overrides: HashMap::new(),
            env: EnvSource::Process,
            credentials_file: None,
            default_url: None,
            retry_policy: RetryPolicy::new(),
            user_agent: None,
        }
    }

    /// Set an explicit value that wins over every other source.
    #[must_use]
    pub fn with_override(mut self, property: Property, value: impl Into<String>) -> Self {
        self.overrides.insert(property, value.into());
        self
    }

    /// Replace the environment source.
    #[must_use]
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// Read this credentials file instead of the one named by the environment.
    #[must_use]
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Built-in URL used when no source provides one.
    #[must_use]
    pub fn with_default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = Some(url.into());
        self
    }

    /// Base retry policy; `MAX_RETRIES` overrides its retry count.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// User agent for the resulting configuration.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Variable prefix, e.g. `HPDB_` for service `hpdb`.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}_", self.service_name.to_uppercase().replace('-', "_"))
    }

    fn field(&self, property: Property) -> String {
        format!("{}{}", self.prefix(), property.key())
    }

    fn credentials_path(&self) -> Option<PathBuf> {
        self.credentials_file.clone().or_else(|| {
            self.env
                .get(&format!("{}CREDENTIALS_FILE", self.prefix()))
                .or_else(|| self.env.get(SHARED_CREDENTIALS_FILE_ENV))
                .map(PathBuf::from)
        })
    }

    /// Resolve the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the offending property when a required
    /// value is missing or malformed, or when the credentials file cannot be read.
    pub fn resolve(&self) -> Result<ClientConfig> {
        let file = match self.credentials_path() {
            Some(path) => load_credentials_file(&path)?,
            None => HashMap::new(),
        };

        let lookup = |property: Property| -> Option<String> {
            let name = self.field(property);
            self.overrides
                .get(&property)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .or_else(|| self.env.get(&name))
                .or_else(|| file.get(&name).filter(|v| !v.trim().is_empty()).cloned())
        };

        let url = lookup(Property::Url)
            .or_else(|| self.default_url.clone())
            .ok_or_else(|| Error::config(self.field(Property::Url), "no service URL configured"))?;

        let timeout = match lookup(Property::Timeout) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::config(
                    self.field(Property::Timeout),
                    format!("`{raw}` is not a number of seconds"),
                )
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let max_retries = match lookup(Property::MaxRetries) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::config(
                    self.field(Property::MaxRetries),
                    format!("`{raw}` is not a retry count"),
                )
            })?,
            None => self.retry_policy.max_retries,
        };

        let disable_ssl = match lookup(Property::DisableSsl) {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| Error::config(self.field(Property::DisableSsl), format!("`{raw}` is not a boolean")))?,
            None => false,
        };

        let properties = ServiceProperties {
            url,
            timeout,
            max_retries,
        };
        properties.validate().map_err(|errors| {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|f| format!("{}{}", self.prefix(), f.to_uppercase()))
                .collect();
            fields.sort();
            Error::config(fields.join(", "), errors.to_string())
        })?;
        parse_service_url(&properties.url, &self.field(Property::Url))?;

        let timeout = Duration::from_secs(properties.timeout);
        let authenticator = self.resolve_authenticator(&lookup, timeout, !disable_ssl)?;

        let mut builder = ClientConfig::builder(properties.url)
            .with_shared_authenticator(authenticator)
            .with_timeout(timeout)
            .with_retry_policy(self.retry_policy.with_max_retries(properties.max_retries))
            .with_tls_verify(!disable_ssl);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.with_user_agent(user_agent.clone());
        }

        builder.build()
    }

    fn resolve_authenticator(
        &self,
        lookup: &dyn Fn(Property) -> Option<String>,
        timeout: Duration,
        tls_verify: bool,
    ) -> Result<Arc<dyn Authenticator>> {
        let scheme = match lookup(Property::AuthType) {
            Some(raw) => raw.parse::<AuthScheme>().map_err(|_| {
                Error::config(
                    self.field(Property::AuthType),
                    format!("unsupported authentication type `{raw}`"),
                )
            })?,
            None if lookup(Property::ApiKey).is_some() => AuthScheme::Iam,
            None if lookup(Property::BearerToken).is_some() => AuthScheme::BearerToken,
            None if lookup(Property::Username).is_some() && lookup(Property::Password).is_some() => {
                AuthScheme::Basic
            }
            None => {
                return Err(Error::config(
                    self.field(Property::AuthType),
                    "no authentication type configured and none could be inferred",
                ))
            }
        };

        let require = |property: Property| -> Result<String> {
            lookup(property).ok_or_else(|| {
                Error::config(
                    self.field(property),
                    format!("required for `{scheme}` authentication"),
                )
            })
        };
        // Authenticator errors name the bare property; add the service prefix.
        let qualify = |err: Error| match err {
            Error::Configuration { field, message } => {
                Error::config(format!("{}{field}", self.prefix()), message)
            }
            other => other,
        };

        let authenticator: Arc<dyn Authenticator> = match scheme {
            AuthScheme::NoAuth => Arc::new(NoAuth),
            AuthScheme::Basic => Arc::new(
                BasicAuthenticator::new(require(Property::Username)?, require(Property::Password)?)
                    .map_err(qualify)?,
            ),
            AuthScheme::BearerToken => Arc::new(
                BearerTokenAuthenticator::new(require(Property::BearerToken)?).map_err(qualify)?,
            ),
            AuthScheme::Iam => {
                let auth_url =
                    lookup(Property::AuthUrl).unwrap_or_else(|| DEFAULT_IAM_URL.to_string());
                let connect_timeout = timeout.min(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
                Arc::new(
                    IamAuthenticator::with_url(require(Property::ApiKey)?, auth_url)
                        .and_then(|auth| auth.with_http_settings(timeout, connect_timeout, tls_verify))
                        .map_err(qualify)?
                        .with_key_field(self.field(Property::ApiKey)),
                )
            }
        };

        Ok(authenticator)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
