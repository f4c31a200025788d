//! HTTP client defaults, retry policy and the composed service client.
//!
//! [`ServiceClient`] ties an immutable [`ClientConfig`] to a [`Transport`] and the
//! [`Invoker`]; service crates wrap it and expose one typed method per operation.

use crate::config::ClientConfig;
use crate::invoker::{CallContext, Invoker};
use crate::operation::{OperationDescriptor, RequestOptions};
use crate::request;
use crate::response::Response;
use crate::transport::{ReqwestTransport, Transport};
use crate::Result;
use rand::Rng;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

// Retry settings

/// Default maximum number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default initial retry delay in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Default maximum retry delay in milliseconds (for exponential backoff)
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;

/// Default jitter applied to retry delays (fraction of the delay, either direction)
pub const DEFAULT_JITTER_FACTOR: f64 = 0.1;

/// Retry policy with capped exponential backoff and jitter.
///
/// Only idempotent requests are retried, and only on transport failures and
/// 429/5xx responses; the invoker enforces that, the policy only shapes the delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first one
    pub max_retries: u32,

    /// Initial delay before first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,

    /// Backoff multiplier (typically 2 for exponential backoff)
    pub backoff_multiplier: u32,

    /// Random spread applied to each delay, 0.0 to 1.0
    pub jitter_factor: f64,
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            backoff_multiplier: 2,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }

    /// Create a retry policy with no retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1,
            jitter_factor: 0.0,
        }
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set the jitter factor, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Disable jitter so delays are deterministic.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter_factor = 0.0;
        self
    }

    /// Total attempts allowed for an idempotent request.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: delay = min(initial_delay * multiplier^(attempt-1), max_delay)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let multiplier = self.backoff_multiplier.saturating_pow(attempt - 1);
        let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(initial_ms.saturating_mul(u64::from(multiplier)));

        std::cmp::min(delay, self.max_delay)
    }

    /// Delay before retry `attempt`, with jitter and an optional server hint.
    ///
    /// A `Retry-After` hint raises the delay but never past `max_delay`.
    #[must_use]
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let base = self.delay_for_attempt(attempt);
        let jittered = if self.jitter_factor > 0.0 && !base.is_zero() {
            let spread = base.as_secs_f64() * self.jitter_factor;
            let offset = rand::thread_rng().gen_range(-spread..=spread);
            Duration::from_secs_f64((base.as_secs_f64() + offset).max(0.0))
        } else {
            base
        };

        let delay = retry_after.map_or(jittered, |hint| jittered.max(hint));
        std::cmp::min(delay, self.max_delay)
    }

    /// Check if retries are enabled.
    #[must_use]
    pub const fn has_retries(&self) -> bool {
        self.max_retries > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ServiceClient`].
#[derive(Clone)]
pub struct ServiceClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl ServiceClientBuilder {
    /// Start from a resolved configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Use a custom transport instead of the default reqwest one.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the default HTTP transport cannot be built.
    pub fn build(self) -> Result<ServiceClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(&self.config)?),
        };

        Ok(ServiceClient {
            config: self.config,
            invoker: Invoker::new(transport),
        })
    }
}

/// Client bound to one service configuration.
///
/// Cheap to clone; clones share the transport and configuration. Safe for unbounded
/// concurrent calls since nothing is mutated after construction.
#[derive(Clone)]
pub struct ServiceClient {
    config: ClientConfig,
    invoker: Invoker,
}

impl ServiceClient {
    /// Construct a client with the default transport.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP transport cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ServiceClientBuilder::new(config).build()
    }

    /// Start a builder.
    #[must_use]
    pub fn builder(config: ClientConfig) -> ServiceClientBuilder {
        ServiceClientBuilder::new(config)
    }

    /// The configuration every call uses.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.config.base_url()
    }

    /// Build, send and decode one operation.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any I/O if required options are missing,
    /// otherwise whatever the invoker surfaces.
    pub async fn call<T>(
        &self,
        descriptor: &OperationDescriptor,
        options: &RequestOptions,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        self.call_with_context(descriptor, options, &CallContext::default())
            .await
    }

    /// Like [`call`](Self::call), honoring the cancellation token and deadline in `ctx`.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call); additionally returns [`crate::Error::Cancelled`].
    pub async fn call_with_context<T>(
        &self,
        descriptor: &OperationDescriptor,
        options: &RequestOptions,
        ctx: &CallContext,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        debug!(operation = descriptor.name, "Building request");
        let request = request::build(descriptor, options)?;
        self.invoker.invoke(&request, &self.config, ctx).await
    }

    /// Build and send one operation, returning the body as text.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call); a body that is not UTF-8 is a decode error.
    pub async fn call_text(
        &self,
        descriptor: &OperationDescriptor,
        options: &RequestOptions,
        ctx: &CallContext,
    ) -> Result<Response<String>> {
        debug!(operation = descriptor.name, "Building request");
        let request = request::build(descriptor, options)?;
        self.invoker.invoke_text(&request, &self.config, ctx).await
    }
}
