//! Request construction from operation descriptors.
//!
//! [`build`] validates the bound options against the descriptor and produces a
//! [`Request`] with the path template filled in, query pairs in declaration order,
//! header parameters attached and body parameters serialized. No authentication
//! material is ever stored on a [`Request`].

use crate::operation::{value_text, OperationDescriptor, ParamLocation, RequestOptions};
use crate::query::QueryParams;
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

/// Fully-formed outbound request, minus authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    operation: &'static str,
    method: Method,
    path: String,
    query: QueryParams,
    headers: HeaderMap,
    body: Option<Value>,
    idempotent: bool,
}

impl Request {
    /// Name of the operation this request was built for.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Percent-encoded path relative to the service URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query pairs in declaration order.
    #[must_use]
    pub fn query(&self) -> &[(&'static str, String)] {
        self.query.as_pairs()
    }

    /// Headers from header parameters.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// JSON body, if any body parameter was bound.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Whether the invoker may retry this request.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    /// Resolve the request against a service base URL.
    ///
    /// The request path is appended to the base URL's path, so a base of
    /// `https://host/api/v3` and a path of `/clusters/abc` give
    /// `https://host/api/v3/clusters/abc`.
    #[must_use]
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let joined = format!("{}{}", base.path().trim_end_matches('/'), self.path);
        url.set_path(&joined);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.as_pairs());
        }
        url
    }
}

/// Build a request for `descriptor` from `options`.
///
/// # Errors
///
/// Returns [`Error::Validation`] listing every unbound required parameter, or naming a
/// parameter whose value cannot be used (for example an invalid header value).
pub fn build(descriptor: &OperationDescriptor, options: &RequestOptions) -> Result<Request> {
    let missing: Vec<String> = descriptor
        .params
        .iter()
        .filter(|p| (p.required || p.location == ParamLocation::Path) && !options.is_bound(p.name))
        .map(|p| p.name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(Error::missing_parameters(descriptor.name, missing));
    }

    let path = expand_path(descriptor, options)?;

    let mut query = QueryParams::new();
    for spec in descriptor.params_at(ParamLocation::Query) {
        if let Some(value) = options.get(spec.name) {
            query.push_value(spec.name, value);
        }
    }

    let mut headers = HeaderMap::new();
    for spec in descriptor.params_at(ParamLocation::Header) {
        if let Some(value) = options.get(spec.name) {
            let name = HeaderName::from_bytes(spec.name.as_bytes())
                .map_err(|err| Error::invalid_parameter(descriptor.name, spec.name, err))?;
            let value = HeaderValue::from_str(&value_text(value))
                .map_err(|err| Error::invalid_parameter(descriptor.name, spec.name, err))?;
            headers.insert(name, value);
        }
    }

    Ok(Request {
        operation: descriptor.name,
        method: descriptor.method.clone(),
        path,
        query,
        headers,
        body: build_body(descriptor, options),
        idempotent: descriptor.is_idempotent(),
    })
}

fn expand_path(descriptor: &OperationDescriptor, options: &RequestOptions) -> Result<String> {
    let template = descriptor.path;
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            Error::invalid_parameter(descriptor.name, template, "unterminated path placeholder")
        })?;
        let name = &after[..close];

        let declared = descriptor
            .param(name)
            .is_some_and(|p| p.location == ParamLocation::Path);
        let value = options.get(name).filter(|_| declared).ok_or_else(|| {
            Error::invalid_parameter(descriptor.name, name, "path placeholder is not a declared path parameter")
        })?;

        path.push_str(&urlencoding::encode(&value_text(value)));
        rest = &after[close + 1..];
    }
    path.push_str(rest);

    Ok(path)
}

fn build_body(descriptor: &OperationDescriptor, options: &RequestOptions) -> Option<Value> {
    let mut specs = descriptor.params_at(ParamLocation::Body).peekable();
    specs.peek()?;

    let specs: Vec<_> = specs.collect();
    if let [only] = specs.as_slice() {
        if only.name == "body" {
            return options.get(only.name).cloned();
        }
    }

    let mut body = Map::new();
    for spec in specs {
        if let Some(value) = options.get(spec.name) {
            body.insert(spec.name.to_string(), value.clone());
        }
    }

    if body.is_empty() {
        None
    } else {
        Some(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ParamSpec;
    use serde_json::json;

    static GET_CLUSTER: OperationDescriptor = OperationDescriptor::new(
        "GetCluster",
        Method::GET,
        "/clusters/{cluster_id}",
        &[ParamSpec::path("cluster_id")],
    );

    static GET_USER: OperationDescriptor = OperationDescriptor::new(
        "GetUser",
        Method::GET,
        "/clusters/{cluster_id}/users/{db_user_id}",
        &[ParamSpec::path("cluster_id"), ParamSpec::path("db_user_id")],
    );

    static LIST_TASKS: OperationDescriptor = OperationDescriptor::new(
        "ListTasks",
        Method::GET,
        "/clusters/{cluster_id}/tasks",
        &[
            ParamSpec::path("cluster_id"),
            ParamSpec::query("state", false),
            ParamSpec::query("limit", false),
            ParamSpec::query("offset", false),
        ],
    );

    static SCALE: OperationDescriptor = OperationDescriptor::new(
        "ScaleResources",
        Method::POST,
        "/clusters/{cluster_id}/resource",
        &[ParamSpec::path("cluster_id"), ParamSpec::body("resource", true)],
    );

    static GET_LOG: OperationDescriptor = OperationDescriptor::new(
        "GetLog",
        Method::GET,
        "/nodes/{node_id}/logs/{log_name}",
        &[
            ParamSpec::path("node_id"),
            ParamSpec::path("log_name"),
            ParamSpec::header("Accept", false),
        ],
    );

    #[test]
    fn build_substitutes_path_parameter() {
        let request = build(&GET_CLUSTER, &RequestOptions::new().with("cluster_id", "abc")).unwrap();
        assert_eq!(request.path(), "/clusters/abc");
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.operation(), "GetCluster");
        assert!(request.is_idempotent());
        assert!(request.body().is_none());
        assert!(request.query().is_empty());
    }

    #[test]
    fn build_percent_encodes_path_values() {
        let options = RequestOptions::new()
            .with("cluster_id", "a/b c")
            .with("db_user_id", "admin?x=1");
        let request = build(&GET_USER, &options).unwrap();
        assert_eq!(request.path(), "/clusters/a%2Fb%20c/users/admin%3Fx%3D1");
    }

    #[test]
    fn build_reports_every_missing_parameter() {
        let err = build(&GET_USER, &RequestOptions::new()).unwrap_err();
        match err {
            Error::Validation { operation, missing, .. } => {
                assert_eq!(operation, "GetUser");
                assert_eq!(missing, vec!["cluster_id", "db_user_id"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = build(&GET_USER, &RequestOptions::new().with("cluster_id", "abc")).unwrap_err();
        assert!(matches!(err, Error::Validation { ref missing, .. } if missing == &vec!["db_user_id".to_string()]));
    }

    #[test]
    fn build_orders_query_and_omits_unset() {
        let options = RequestOptions::new()
            .with("offset", 20)
            .with("cluster_id", "abc")
            .with("state", "running");
        let request = build(&LIST_TASKS, &options).unwrap();
        assert_eq!(
            request.query(),
            &[("state", "running".to_string()), ("offset", "20".to_string())]
        );
    }

    #[test]
    fn build_assembles_body_object() {
        let options = RequestOptions::new()
            .with("cluster_id", "abc")
            .with("resource", json!({"cpu": 2, "memory": "2GiB"}));
        let request = build(&SCALE, &options).unwrap();
        assert!(!request.is_idempotent());
        assert_eq!(
            request.body(),
            Some(&json!({"resource": {"cpu": 2, "memory": "2GiB"}}))
        );
    }

    #[test]
    fn build_requires_body_parameter() {
        let err = build(&SCALE, &RequestOptions::new().with("cluster_id", "abc")).unwrap_err();
        assert!(matches!(err, Error::Validation { ref missing, .. } if missing == &vec!["resource".to_string()]));
    }

    #[test]
    fn build_attaches_header_parameters() {
        let options = RequestOptions::new()
            .with("node_id", "c5ff")
            .with("log_name", "audit.log")
            .with("Accept", "text/plain");
        let request = build(&GET_LOG, &options).unwrap();
        assert_eq!(request.path(), "/nodes/c5ff/logs/audit.log");
        assert_eq!(request.headers().get("accept").unwrap(), "text/plain");
    }

    #[test]
    fn build_rejects_invalid_header_value() {
        let options = RequestOptions::new()
            .with("node_id", "c5ff")
            .with("log_name", "audit.log")
            .with("Accept", "text/plain\nx");
        let err = build(&GET_LOG, &options).unwrap_err();
        assert!(matches!(err, Error::Validation { ref missing, .. } if missing.is_empty()));
    }

    #[test]
    fn build_rejects_undeclared_placeholder() {
        static BROKEN: OperationDescriptor =
            OperationDescriptor::new("Broken", Method::GET, "/nodes/{node_id}", &[]);
        let err = build(&BROKEN, &RequestOptions::new().with("node_id", "x")).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn whole_body_parameter_is_sent_as_is() {
        static REPLACE: OperationDescriptor = OperationDescriptor::new(
            "Replace",
            Method::PUT,
            "/things",
            &[ParamSpec::body("body", true)],
        )
        .mark_idempotent();
        let request = build(&REPLACE, &RequestOptions::new().with("body", json!([1, 2]))).unwrap();
        assert_eq!(request.body(), Some(&json!([1, 2])));
        assert!(request.is_idempotent());
    }

    #[test]
    fn url_appends_to_base_path() {
        let base = Url::parse("https://api.example.com/api/v3/").unwrap();
        let options = RequestOptions::new().with("cluster_id", "abc").with("limit", 5);
        let request = build(&LIST_TASKS, &options).unwrap();
        assert_eq!(
            request.url(&base).as_str(),
            "https://api.example.com/api/v3/clusters/abc/tasks?limit=5"
        );

        let plain = build(&GET_CLUSTER, &RequestOptions::new().with("cluster_id", "a b")).unwrap();
        assert_eq!(
            plain.url(&Url::parse("http://localhost:8080").unwrap()).as_str(),
            "http://localhost:8080/clusters/a%20b"
        );
    }
}
