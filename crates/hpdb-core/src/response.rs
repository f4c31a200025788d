//! Typed responses paired with transport metadata.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;

/// Decoded payload of a completed call plus the status and headers it arrived with.
#[derive(Debug, Clone)]
pub struct Response<T> {
    result: T,
    status: StatusCode,
    headers: HeaderMap,
}

impl<T> Response<T> {
    /// Create a response.
    #[must_use]
    pub fn new(result: T, status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            result,
            status,
            headers,
        }
    }

    /// The decoded payload.
    #[must_use]
    pub fn result(&self) -> &T {
        &self.result
    }

    /// Consume the response and return the payload.
    #[must_use]
    pub fn into_result(self) -> T {
        self.result
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Numeric HTTP status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Convenience accessor for a header value that is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Split into payload, status and headers.
    #[must_use]
    pub fn into_parts(self) -> (T, StatusCode, HeaderMap) {
        (self.result, self.status, self.headers)
    }

    /// Transform the payload, keeping the metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            result: f(self.result),
            status: self.status,
            headers: self.headers,
        }
    }
}
