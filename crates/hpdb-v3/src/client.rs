//! Asynchronous HPDB v3 client implementation.

use crate::models::{
    Cluster, Configuration, DatabaseList, Log, LogList, Task, TaskAccepted, TaskList,
    UserDetails, UserList,
};
use crate::operations::{
    DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_URL, GET_CLUSTER, GET_CONFIGURATION, GET_LOG, GET_TASK,
    GET_USER, LIST_DATABASES, LIST_NODE_LOGS, LIST_TASKS, LIST_USERS, SCALE_RESOURCES,
    UPDATE_CONFIGURATION,
};
use crate::Result;
use hpdb_core::config::{EnvSource, Property};
use hpdb_core::transport::Transport;
use hpdb_core::{
    CallContext, ClientConfig, ConfigResolver, OperationDescriptor, RequestOptions, Response,
    RetryPolicy, ServiceClient,
};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("hpdb-v3/", env!("CARGO_PKG_VERSION"));

/// Builder for [`HpdbClient`].
///
/// Configuration is resolved for service name `hpdb` from explicit overrides, the
/// environment and the credentials file, unless a ready [`ClientConfig`] is supplied.
#[derive(Clone)]
pub struct HpdbClientBuilder {
    resolver: ConfigResolver,
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl HpdbClientBuilder {
    /// Create a builder reading the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver: ConfigResolver::new(DEFAULT_SERVICE_NAME)
                .with_default_url(DEFAULT_SERVICE_URL)
                .with_user_agent(USER_AGENT),
            config: None,
            transport: None,
        }
    }

    /// Set the service URL.
    #[must_use]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.with_override(Property::Url, url)
    }

    /// Set a configuration property, taking precedence over every other source.
    #[must_use]
    pub fn with_override(mut self, property: Property, value: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_override(property, value);
        self
    }

    /// Read variables from `env` instead of the process environment.
    #[must_use]
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.resolver = self.resolver.with_env(env);
        self
    }

    /// Read this credentials file.
    #[must_use]
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolver = self.resolver.with_credentials_file(path);
        self
    }

    /// Override the retry policy; `HPDB_MAX_RETRIES` still sets the retry count.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.resolver = self.resolver.with_retry_policy(retry);
        self
    }

    /// Use a fully built configuration and skip resolution.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending property if configuration
    /// cannot be resolved, or if the HTTP transport cannot be built.
    pub fn build(self) -> Result<HpdbClient> {
        let config = match self.config {
            Some(config) => config,
            None => self.resolver.resolve()?,
        };
        debug!(url = %config.base_url(), auth = %config.authenticator().scheme(), "Creating HPDB client");

        let mut builder = ServiceClient::builder(config);
        if let Some(transport) = self.transport {
            builder = builder.with_transport(transport);
        }

        Ok(HpdbClient {
            inner: builder.build()?,
        })
    }
}

impl Default for HpdbClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Asynchronous HPDB v3 client.
///
/// Cheap to clone; clones share configuration and the connection pool.
#[derive(Clone)]
pub struct HpdbClient {
    inner: ServiceClient,
}

impl HpdbClient {
    /// Construct a client from a ready configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP transport cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        HpdbClientBuilder::new().with_config(config).build()
    }

    /// Construct a client from `HPDB_*` environment variables and the credentials file
    /// named by `HPDB_CREDENTIALS_FILE` or `IBM_CREDENTIALS_FILE`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the missing or malformed property.
    pub fn from_env() -> Result<Self> {
        HpdbClientBuilder::new().build()
    }

    /// Start a builder.
    #[must_use]
    pub fn builder() -> HpdbClientBuilder {
        HpdbClientBuilder::new()
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// Configuration every call uses.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    /// Get database cluster details. Requires `cluster_id`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `cluster_id` is unbound, otherwise the API,
    /// transport or decode error of the call.
    pub async fn get_cluster(&self, options: &RequestOptions) -> Result<Response<Cluster>> {
        self.inner.call(&GET_CLUSTER, options).await
    }

    /// List database users. Requires `cluster_id`.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn list_users(&self, options: &RequestOptions) -> Result<Response<UserList>> {
        self.inner.call(&LIST_USERS, options).await
    }

    /// Get database user details. Requires `cluster_id` and `db_user_id`.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn get_user(&self, options: &RequestOptions) -> Result<Response<UserDetails>> {
        self.inner.call(&GET_USER, options).await
    }

    /// List databases. Requires `cluster_id`.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn list_databases(&self, options: &RequestOptions) -> Result<Response<DatabaseList>> {
        self.inner.call(&LIST_DATABASES, options).await
    }

    /// Scale cluster resources. Requires `cluster_id`; `resource` takes a
    /// [`ScaleResourcesResource`](crate::models::ScaleResourcesResource).
    ///
    /// Never retried.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn scale_resources(&self, options: &RequestOptions) -> Result<Response<TaskAccepted>> {
        self.inner.call(&SCALE_RESOURCES, options).await
    }

    /// Get database configuration. Requires `cluster_id`.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn get_configuration(
        &self,
        options: &RequestOptions,
    ) -> Result<Response<Configuration>> {
        self.inner.call(&GET_CONFIGURATION, options).await
    }

    /// Update database configuration. Requires `cluster_id`; `configuration` takes an
    /// [`UpdateConfigurationData`](crate::models::UpdateConfigurationData).
    ///
    /// Never retried.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn update_configuration(
        &self,
        options: &RequestOptions,
    ) -> Result<Response<TaskAccepted>> {
        self.inner.call(&UPDATE_CONFIGURATION, options).await
    }

    /// List tasks. Requires `cluster_id`.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn list_tasks(&self, options: &RequestOptions) -> Result<Response<TaskList>> {
        self.inner.call(&LIST_TASKS, options).await
    }

    /// Show one task. Requires `cluster_id` and `task_id`.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn get_task(&self, options: &RequestOptions) -> Result<Response<Task>> {
        self.inner.call(&GET_TASK, options).await
    }

    /// List the log files of a node. Requires `node_id`.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn list_node_logs(&self, options: &RequestOptions) -> Result<Response<LogList>> {
        self.inner.call(&LIST_NODE_LOGS, options).await
    }

    /// Get a log file as JSON. Requires `node_id` and `log_name`; `Accept` defaults to
    /// `application/json`.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn get_log(&self, options: &RequestOptions) -> Result<Response<Log>> {
        self.inner.call(&GET_LOG, options).await
    }

    /// Get a log file as raw text, sending `Accept: text/plain` unless set.
    ///
    /// # Errors
    ///
    /// See [`get_cluster`](Self::get_cluster).
    pub async fn get_log_text(&self, options: &RequestOptions) -> Result<Response<String>> {
        self.get_log_text_with_context(options, &CallContext::default())
            .await
    }

    /// [`get_log_text`](Self::get_log_text) bounded by a cancellation token or deadline.
    ///
    /// # Errors
    ///
    /// As [`get_log_text`](Self::get_log_text), plus [`hpdb_core::Error::Cancelled`].
    pub async fn get_log_text_with_context(
        &self,
        options: &RequestOptions,
        ctx: &CallContext,
    ) -> Result<Response<String>> {
        let options = if options.is_bound("Accept") {
            options.clone()
        } else {
            options.clone().with("Accept", "text/plain")
        };
        self.inner.call_text(&GET_LOG, &options, ctx).await
    }

    /// Run any operation with a cancellation token or deadline.
    ///
    /// # Errors
    ///
    /// As the matching typed method, plus [`hpdb_core::Error::Cancelled`].
    pub async fn call_with_context<T>(
        &self,
        descriptor: &OperationDescriptor,
        options: &RequestOptions,
        ctx: &CallContext,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        self.inner.call_with_context(descriptor, options, ctx).await
    }
}
