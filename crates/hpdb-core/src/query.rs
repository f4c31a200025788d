//! Ordered builder for HTTP query parameters.
//!
//! Pairs keep the order they were pushed in, so two builds of the same operation with
//! the same options produce identical URLs.

use crate::operation::value_text;
use serde_json::Value;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a bound option value. Arrays become one pair per element.
    pub fn push_value(&mut self, key: &'static str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    self.pairs.push((key, value_text(item)));
                }
            }
            other => self.pairs.push((key, value_text(other))),
        }
    }

    /// Borrow the collected pairs.
    #[must_use]
    pub fn as_pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
