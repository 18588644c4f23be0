use reqwest::Method;
use serde::Serialize;

use crate::{LendTrackerError, Result};

/// Immutable description of one logical API call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<serde_json::Value>,
    pub(crate) authenticated: bool,
    pub(crate) idempotency_key: Option<String>,
}

impl RequestDescriptor {
    /// Creates a descriptor for `path`, relative to the client base URL.
    ///
    /// The bearer token is attached by default.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
            idempotency_key: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends one query pair.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Appends a query pair only when `value` is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Serializes `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| LendTrackerError::unknown(format!("invalid request body: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Sends the request without the `Authorization` header.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Sends `key` as the `Idempotency-Key` header.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Attaches a freshly generated UUID v4 idempotency key.
    pub(crate) fn idempotent(self) -> Self {
        self.with_idempotency_key(uuid::Uuid::new_v4().to_string())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    /// Whether repeating this request is free of side effects.
    pub fn is_read(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }
}

/// Raw response of a single attempt: status plus body text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Decodes the body as JSON; failures surface as `Unknown`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| LendTrackerError::decode(err, &self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::{RawResponse, RequestDescriptor};
    use crate::ErrorKind;

    #[test]
    fn query_opt_skips_missing_values() {
        let descriptor = RequestDescriptor::get("/loans/search")
            .query_opt("q", Some("kit"))
            .query_opt::<f64>("minAmount", None)
            .query_opt("maxRate", Some(12.5));

        assert_eq!(
            descriptor.query_pairs(),
            &[
                ("q".to_owned(), "kit".to_owned()),
                ("maxRate".to_owned(), "12.5".to_owned())
            ]
        );
        assert!(descriptor.is_read());
    }

    #[test]
    fn idempotent_generates_distinct_keys() {
        let a = RequestDescriptor::post("/loans").idempotent();
        let b = RequestDescriptor::post("/loans").idempotent();
        assert!(a.idempotency_key().is_some());
        assert_ne!(a.idempotency_key(), b.idempotency_key());
        assert!(!a.is_read());
    }

    #[test]
    fn raw_response_decode_failure_is_unknown() {
        let response = RawResponse {
            status: 200,
            body: "<html>".to_owned(),
        };
        let err = response
            .json::<serde_json::Value>()
            .expect_err("html must not decode");
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }
}
