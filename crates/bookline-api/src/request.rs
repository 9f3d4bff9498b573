//! Per-call request description handed to [`crate::ApiClient::call`].

use std::time::Duration;

use serde::Serialize;

use crate::endpoint::Endpoint;
use crate::error::ApiError;

/// A query parameter value. Lists expand into repeated keys
/// (`?tag=a&tag=b`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Many(values)
    }
}

impl From<&[&str]> for QueryValue {
    fn from(values: &[&str]) -> Self {
        QueryValue::Many(values.iter().map(|v| (*v).to_string()).collect())
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub body: Option<serde_json::Value>,
    pub query: Vec<(String, QueryValue)>,
    /// Merged over the client defaults; these win on conflict.
    pub extra_headers: Vec<(String, String)>,
    /// `None` picks the endpoint's timeout class from the client config.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            body: None,
            query: Vec::new(),
            extra_headers: Vec::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize a typed payload into the loosely-typed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unknown`] if `payload` cannot be represented as JSON.
    pub fn json<B: Serialize>(self, payload: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| ApiError::Unknown(format!("request body serialization: {e}")))?;
        Ok(self.body(value))
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Flattened `(key, value)` pairs with list values expanded.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.query {
            match value {
                QueryValue::Single(v) => pairs.push((key.as_str(), v.as_str())),
                QueryValue::Many(vs) => {
                    pairs.extend(vs.iter().map(|v| (key.as_str(), v.as_str())));
                }
            }
        }
        pairs
    }
}
