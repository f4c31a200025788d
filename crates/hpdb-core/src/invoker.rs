//! Sends built requests, retrying transient failures and decoding the result.
//!
//! The invoker owns no per-call state: every [`Invoker::invoke`] gets its own request
//! id, header copy and attempt counter, so one invoker is shared by every call a
//! client makes.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::request::Request;
use crate::response::Response;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use serde::de::DeserializeOwned;
use std::future::{pending, Future};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Header carrying the per-call request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const JSON: &str = "application/json";

/// Cancellation and deadline for one call.
///
/// Both are optional; the default context never cancels. When either fires, the call
/// stops at once (in-flight request or backoff sleep alike) and returns
/// [`Error::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: Option<CancellationToken>,
    timeout: Option<Duration>,
}

impl CallContext {
    /// A context that never cancels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the call when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Abort the call once `timeout` has elapsed, retries and backoff included.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The cancellation token, if any.
    #[must_use]
    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// The overall deadline, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `work`, abandoning it if the context is cancelled or its deadline passes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`], or whatever `work` returns.
    pub async fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => pending::<()>().await,
            }
        };
        let deadline = async {
            match self.timeout {
                Some(timeout) => {
                    tokio::time::sleep(timeout).await;
                    timeout
                }
                None => pending::<Duration>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => Err(Error::Cancelled("call cancelled by caller".to_string())),
            timeout = deadline => Err(Error::Cancelled(format!("deadline of {timeout:?} exceeded"))),
            result = work => result,
        }
    }
}

/// Executes requests against a [`Transport`].
#[derive(Clone)]
pub struct Invoker {
    transport: Arc<dyn Transport>,
}

impl Invoker {
    /// Create an invoker over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send `request` and decode a JSON success body into `T`.
    ///
    /// An empty body decodes as JSON `null`, so operations without a payload can use
    /// `()` or `Option<_>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for non-2xx responses, [`Error::Transport`] when no
    /// response arrived, [`Error::Decode`] when the body does not match `T`, and
    /// [`Error::Cancelled`] when `ctx` fires.
    pub async fn invoke<T>(
        &self,
        request: &Request,
        config: &ClientConfig,
        ctx: &CallContext,
    ) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.invoke_raw(request, config, ctx).await?;
        let result = decode_json(&response)?;
        Ok(Response::new(result, response.status, response.headers))
    }

    /// Send `request` and return the success body as text.
    ///
    /// # Errors
    ///
    /// As [`invoke`](Self::invoke); a body that is not UTF-8 is a decode error.
    pub async fn invoke_text(
        &self,
        request: &Request,
        config: &ClientConfig,
        ctx: &CallContext,
    ) -> Result<Response<String>> {
        let response = self.invoke_raw(request, config, ctx).await?;
        let status = response.status;
        let headers = response.headers;
        let text = String::from_utf8(response.body).map_err(|err| Error::Decode {
            status: status.as_u16(),
            message: format!("response body is not UTF-8: {err}"),
            body: String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })?;
        Ok(Response::new(text, status, headers))
    }

    /// Send `request`, retrying as the configuration allows, and return the raw 2xx
    /// response.
    ///
    /// # Errors
    ///
    /// See [`invoke`](Self::invoke).
    pub async fn invoke_raw(
        &self,
        request: &Request,
        config: &ClientConfig,
        ctx: &CallContext,
    ) -> Result<HttpResponse> {
        ctx.run(self.send_with_retries(request, config)).await
    }

    async fn send_with_retries(&self, request: &Request, config: &ClientConfig) -> Result<HttpResponse> {
        let url = request.url(config.base_url());
        let request_id = Uuid::new_v4().to_string();
        let headers = base_headers(request, config, &request_id)?;
        let body = request
            .body()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| Error::invalid_parameter(request.operation(), "body", err))?;

        let policy = config.retry_policy();
        let max_attempts = if request.is_idempotent() {
            policy.max_attempts()
        } else {
            1
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            info!(
                operation = request.operation(),
                method = %request.method(),
                url = %url,
                attempt,
                request_id = %request_id,
                "HPDB request"
            );

            let mut attempt_headers = headers.clone();
            let outcome = match config.authenticator().authenticate(&mut attempt_headers).await {
                Ok(()) => {
                    self.transport
                        .send(HttpRequest {
                            method: request.method().clone(),
                            url: url.clone(),
                            headers: attempt_headers,
                            body: body.clone(),
                        })
                        .await
                }
                Err(err) => Err(err),
            };

            let (err, retry_after) = match outcome {
                Ok(response) if response.status.is_success() => {
                    debug!(
                        operation = request.operation(),
                        status = response.status.as_u16(),
                        attempt,
                        "HPDB response"
                    );
                    return Ok(response);
                }
                Ok(response) => {
                    let hint = retry_after(&response.headers);
                    let err = Error::Api(ApiError::from_response(response.status, response.text()));
                    (err, hint)
                }
                Err(err) => (err, None),
            };

            if attempt >= max_attempts || !err.is_retryable() {
                if attempt > 1 && err.is_retryable() {
                    warn!(operation = request.operation(), attempt, error = %err, "HPDB retries exhausted");
                } else if err.should_log() {
                    warn!(operation = request.operation(), attempt, error = %err, "HPDB request failed");
                } else {
                    debug!(operation = request.operation(), attempt, error = %err, "HPDB request failed");
                }
                return Err(err);
            }

            let delay = policy.backoff(attempt, retry_after);
            debug!(
                operation = request.operation(),
                attempt,
                error = %err,
                "Retrying after {:?}",
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn base_headers(request: &Request, config: &ClientConfig, request_id: &str) -> Result<HeaderMap> {
    let mut headers = config.default_headers().clone();
    for (name, value) in request.headers() {
        headers.insert(name.clone(), value.clone());
    }

    if !headers.contains_key(ACCEPT) {
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
    }
    if request.body().is_some() && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    }

    let value = HeaderValue::from_str(request_id)
        .map_err(|err| Error::invalid_parameter(request.operation(), REQUEST_ID_HEADER, err))?;
    headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);

    Ok(headers)
}

/// Parse a `Retry-After` header given in seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn decode_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };

    serde_json::from_slice(body).map_err(|err| Error::Decode {
        status: response.status.as_u16(),
        message: err.to_string(),
        body: response.text(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthenticator;
    use crate::client::RetryPolicy;
    use crate::operation::{OperationDescriptor, ParamSpec, RequestOptions};
    use crate::request;
    use crate::transport::MockTransport;
    use reqwest::header::AUTHORIZATION;
    use reqwest::{Method, StatusCode};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    static GET_CLUSTER: OperationDescriptor = OperationDescriptor::new(
        "GetCluster",
        Method::GET,
        "/clusters/{cluster_id}",
        &[ParamSpec::path("cluster_id")],
    );

    static SCALE: OperationDescriptor = OperationDescriptor::new(
        "ScaleResources",
        Method::POST,
        "/clusters/{cluster_id}/resource",
        &[ParamSpec::path("cluster_id"), ParamSpec::body("resource", false)],
    );

    static RESTART: OperationDescriptor = OperationDescriptor::new(
        "Restart",
        Method::POST,
        "/clusters/{cluster_id}/restart",
        &[ParamSpec::path("cluster_id")],
    )
    .mark_idempotent();

    #[derive(Debug, Deserialize)]
    struct Cluster {
        id: String,
        status: String,
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(5))
            .with_max_delay(Duration::from_millis(20))
            .without_jitter()
    }

    fn config_with(policy: RetryPolicy) -> ClientConfig {
        ClientConfig::builder("https://hpdb.example.com/api/v3")
            .with_retry_policy(policy)
            .build()
            .unwrap()
    }

    fn cluster_request() -> Request {
        request::build(&GET_CLUSTER, &RequestOptions::new().with("cluster_id", "abc")).unwrap()
    }

    fn reply(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn decodes_success_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::GET
                    && req.url.as_str() == "https://hpdb.example.com/api/v3/clusters/abc"
                    && req.headers.get(ACCEPT).unwrap() == JSON
                    && req.headers.contains_key(REQUEST_ID_HEADER)
                    && req.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(reply(200, r#"{"id":"abc","status":"active"}"#)));

        let invoker = Invoker::new(Arc::new(transport));
        let response: Response<Cluster> = invoker
            .invoke(&cluster_request(), &config_with(fast_policy()), &CallContext::new())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.result().id, "abc");
        assert_eq!(response.result().status, "active");
    }

    #[tokio::test]
    async fn retries_idempotent_request_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen_ids = Arc::new(Mutex::new(Vec::new()));

        let mut transport = MockTransport::new();
        let counter = calls.clone();
        let ids = seen_ids.clone();
        transport.expect_send().times(3).returning(move |req| {
            let id = req.headers.get(REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string();
            ids.lock().unwrap().push(id);
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(reply(503, "unavailable"))
            } else {
                Ok(reply(200, r#"{"id":"abc","status":"active"}"#))
            }
        });

        let invoker = Invoker::new(Arc::new(transport));
        let response: Response<Cluster> = invoker
            .invoke(&cluster_request(), &config_with(fast_policy()), &CallContext::new())
            .await
            .unwrap();

        assert_eq!(response.result().id, "abc");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let ids = seen_ids.lock().unwrap();
        assert!(ids.iter().all(|id| id == &ids[0]));
    }

    #[tokio::test]
    async fn retries_transport_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut transport = MockTransport::new();
        transport.expect_send().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::transport(crate::error::TransportErrorKind::Connect, "refused"))
            } else {
                Ok(reply(200, r#"{"id":"abc","status":"active"}"#))
            }
        });

        let invoker = Invoker::new(Arc::new(transport));
        let result: Result<Response<Cluster>> = invoker
            .invoke(&cluster_request(), &config_with(fast_policy()), &CallContext::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn non_idempotent_request_is_sent_once() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.headers.get(CONTENT_TYPE).unwrap() == JSON
                    && req.body.as_deref() == Some(br#"{"resource":{"members":3}}"#.as_slice())
            })
            .times(1)
            .returning(|_| Ok(reply(503, r#"{"errors":[{"code":"busy","message":"try later"}]}"#)));

        let request = request::build(
            &SCALE,
            &RequestOptions::new()
                .with("cluster_id", "abc")
                .with("resource", serde_json::json!({"members": 3})),
        )
        .unwrap();

        let invoker = Invoker::new(Arc::new(transport));
        let err = invoker
            .invoke::<serde_json::Value>(&request, &config_with(fast_policy()), &CallContext::new())
            .await
            .unwrap_err();

        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 503);
                assert_eq!(api.code.as_deref(), Some("busy"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn marked_idempotent_post_is_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(4)
            .returning(|_| Ok(reply(500, "boom")));

        let request =
            request::build(&RESTART, &RequestOptions::new().with("cluster_id", "abc")).unwrap();
        let invoker = Invoker::new(Arc::new(transport));
        let err = invoker
            .invoke::<serde_json::Value>(&request, &config_with(fast_policy()), &CallContext::new())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(reply(404, r#"{"message":"cluster not found"}"#)));

        let invoker = Invoker::new(Arc::new(transport));
        let err = invoker
            .invoke::<Cluster>(&cluster_request(), &config_with(fast_policy()), &CallContext::new())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("cluster not found"));
    }

    #[tokio::test]
    async fn decode_failures_are_not_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(reply(200, "<html>gateway</html>")));

        let invoker = Invoker::new(Arc::new(transport));
        let err = invoker
            .invoke::<Cluster>(&cluster_request(), &config_with(fast_policy()), &CallContext::new())
            .await
            .unwrap_err();

        match err {
            Error::Decode { status, body, .. } => {
                assert_eq!(status, 200);
                assert_eq!(body, "<html>gateway</html>");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_body_decodes_as_null() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(reply(204, "")));

        let invoker = Invoker::new(Arc::new(transport));
        let response: Response<Option<Cluster>> = invoker
            .invoke(&cluster_request(), &config_with(fast_policy()), &CallContext::new())
            .await
            .unwrap();

        assert_eq!(response.status_code(), 204);
        assert!(response.result().is_none());
    }

    #[tokio::test]
    async fn authenticates_every_attempt() {
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate().times(2).returning(|headers| {
            headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer t"));
            Ok(())
        });

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.headers.get(AUTHORIZATION).is_some_and(|v| v == "Bearer t"))
            .times(2)
            .returning(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(reply(429, "slow down"))
                } else {
                    Ok(reply(200, r#"{"id":"abc","status":"active"}"#))
                }
            });

        let config = ClientConfig::builder("https://hpdb.example.com/api/v3")
            .with_authenticator(auth)
            .with_retry_policy(fast_policy())
            .build()
            .unwrap();

        let invoker = Invoker::new(Arc::new(transport));
        let response: Response<Cluster> = invoker
            .invoke(&cluster_request(), &config, &CallContext::new())
            .await
            .unwrap();
        assert_eq!(response.result().id, "abc");
    }

    #[tokio::test]
    async fn authentication_failure_stops_the_call() {
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate()
            .times(1)
            .returning(|_| Err(Error::config("APIKEY", "rejected")));

        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let config = ClientConfig::builder("https://hpdb.example.com/api/v3")
            .with_authenticator(auth)
            .build()
            .unwrap();

        let invoker = Invoker::new(Arc::new(transport));
        let err = invoker
            .invoke::<Cluster>(&cluster_request(), &config, &CallContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        let trigger = token.clone();

        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(move |_| {
            trigger.cancel();
            Ok(reply(503, "unavailable"))
        });

        let slow = RetryPolicy::new()
            .with_initial_delay(Duration::from_secs(30))
            .with_max_delay(Duration::from_secs(30))
            .without_jitter();

        let invoker = Invoker::new(Arc::new(transport));
        let ctx = CallContext::new().with_cancellation(token);
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            invoker.invoke::<Cluster>(&cluster_request(), &config_with(slow), &ctx),
        )
        .await
        .expect("cancellation should end the call promptly");

        assert!(matches!(outcome, Err(Error::Cancelled(_))));
    }

    #[tokio::test]
    async fn cancelled_token_prevents_any_attempt() {
        let token = CancellationToken::new();
        token.cancel();

        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let invoker = Invoker::new(Arc::new(transport));
        let err = invoker
            .invoke::<Cluster>(
                &cluster_request(),
                &config_with(fast_policy()),
                &CallContext::new().with_cancellation(token),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CANCELLED");
    }

    #[tokio::test]
    async fn deadline_bounds_the_whole_call() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(reply(503, "unavailable")));

        let slow = RetryPolicy::new()
            .with_initial_delay(Duration::from_secs(30))
            .with_max_delay(Duration::from_secs(30))
            .without_jitter();

        let invoker = Invoker::new(Arc::new(transport));
        let err = invoker
            .invoke::<Cluster>(
                &cluster_request(),
                &config_with(slow),
                &CallContext::new().with_timeout(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled(ref msg) if msg.contains("deadline")));
    }

    #[test]
    fn parses_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }

    #[tokio::test]
    async fn retries_over_http_with_wiremock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/clusters/abc"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/clusters/abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "abc", "status": "active"})),
            )
            .mount(&server)
            .await;

        let config = ClientConfig::builder(format!("{}/api/v3", server.uri()))
            .with_retry_policy(fast_policy())
            .build()
            .unwrap();
        let transport = crate::transport::ReqwestTransport::from_config(&config).unwrap();
        let invoker = Invoker::new(Arc::new(transport));

        let response: Response<Cluster> = invoker
            .invoke(&cluster_request(), &config, &CallContext::new())
            .await
            .unwrap();

        assert_eq!(response.result().id, "abc");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rate_limited_token_service_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "iam-token", "expires_in": 3600})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/clusters/abc"))
            .and(wiremock::matchers::header("authorization", "Bearer iam-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "abc", "status": "active"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = crate::auth::IamAuthenticator::with_url("key", server.uri()).unwrap();
        let config = ClientConfig::builder(format!("{}/api/v3", server.uri()))
            .with_authenticator(auth)
            .with_retry_policy(fast_policy())
            .build()
            .unwrap();
        let transport = crate::transport::ReqwestTransport::from_config(&config).unwrap();
        let invoker = Invoker::new(Arc::new(transport));

        let response: Response<Cluster> = invoker
            .invoke(&cluster_request(), &config, &CallContext::new())
            .await
            .unwrap();
        assert_eq!(response.result().status, "active");

        let token_requests = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|req| req.url.path() == "/identity/token")
            .count();
        assert_eq!(token_requests, 2);
    }
}
