//! Operation descriptors and per-call request options.
//!
//! An [`OperationDescriptor`] is the static shape of one REST endpoint: method, path
//! template and the parameters it declares. [`RequestOptions`] binds concrete values to
//! those parameters for a single call.

use crate::{Error, Result};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Where a parameter is carried in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// Substituted into the path template
    Path,
    /// Appended to the query string
    Query,
    /// Sent as a request header
    Header,
    /// Field of the JSON request body
    Body,
}

/// Declaration of one operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name; for path parameters this matches the `{name}` placeholder
    pub name: &'static str,
    /// Where the value goes
    pub location: ParamLocation,
    /// Whether the call fails validation when the value is unbound
    pub required: bool,
}

impl ParamSpec {
    /// Required path parameter.
    #[must_use]
    pub const fn path(name: &'static str) -> Self {
        Self {
            name,
            location: ParamLocation::Path,
            required: true,
        }
    }

    /// Query parameter.
    #[must_use]
    pub const fn query(name: &'static str, required: bool) -> Self {
        Self {
            name,
            location: ParamLocation::Query,
            required,
        }
    }

    /// Header parameter.
    #[must_use]
    pub const fn header(name: &'static str, required: bool) -> Self {
        Self {
            name,
            location: ParamLocation::Header,
            required,
        }
    }

    /// Body parameter.
    #[must_use]
    pub const fn body(name: &'static str, required: bool) -> Self {
        Self {
            name,
            location: ParamLocation::Body,
            required,
        }
    }
}

/// Static description of a REST operation.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    /// Operation name used in errors and logs (e.g. `GetCluster`)
    pub name: &'static str,
    /// HTTP method
    pub method: Method,
    /// Path template relative to the service URL, e.g. `/clusters/{cluster_id}`
    pub path: &'static str,
    /// Declared parameters, in the order they are serialized
    pub params: &'static [ParamSpec],
    /// Marks a non-GET operation as safe to retry
    pub idempotent: bool,
}

impl OperationDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub const fn new(
        name: &'static str,
        method: Method,
        path: &'static str,
        params: &'static [ParamSpec],
    ) -> Self {
        Self {
            name,
            method,
            path,
            params,
            idempotent: false,
        }
    }

    /// Mark the operation as idempotent so the invoker may retry it.
    #[must_use]
    pub const fn mark_idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }

    /// Returns true if the operation may be retried (GET, HEAD, or explicitly marked).
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        self.idempotent || self.method == Method::GET || self.method == Method::HEAD
    }

    /// Iterate the parameters declared at a location, in declaration order.
    pub fn params_at(&self, location: ParamLocation) -> impl Iterator<Item = &'static ParamSpec> {
        self.params.iter().filter(move |p| p.location == location)
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Values bound to an operation's parameters for one call.
///
/// Values are JSON values so numeric body fields travel without conversion. A value
/// bound to JSON `null` counts as unbound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    values: HashMap<String, Value>,
}

impl RequestOptions {
    /// Create an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Bind a value when present.
    #[must_use]
    pub fn with_opt<V>(mut self, name: impl Into<String>, value: Option<V>) -> Self
    where
        V: Into<Value>,
    {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    /// Bind a serializable model, typically a request body parameter.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the model cannot be serialized to JSON.
    pub fn with_json<T>(mut self, name: impl Into<String>, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let name = name.into();
        let value = serde_json::to_value(value)
            .map_err(|err| Error::invalid_parameter("RequestOptions", &name, err))?;
        self.values.insert(name, value);
        Ok(self)
    }

    /// Bind a value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove a binding.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Return the bound value, ignoring `null`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    /// Returns true when a non-null value is bound.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Render a bound value for the path, query string or a header.
///
/// Strings are used verbatim; every other value uses its JSON text.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
