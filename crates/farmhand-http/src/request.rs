//! Request descriptors.

use std::fmt::Display;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use farmhand_core::Result;

/// A logical call to the backend, independent of credentials.
///
/// The descriptor never carries a token; the transport attaches the current
/// one on each dispatch, so a retried request always goes out with the
/// refreshed credential.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append several query parameters.
    pub fn query_all<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Display,
    {
        for (key, value) in params {
            self.query.push((key.into(), value.to_string()));
        }
        self
    }

    /// Set a JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON body.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        Ok(self.body(serde_json::to_value(body)?))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body_value(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// One dispatch of an [`ApiRequest`].
///
/// Attempts are immutable; [`RequestAttempt::retry`] derives the next one and
/// returns `None` once the single permitted retry has been used.
#[derive(Debug, Clone, Copy)]
pub struct RequestAttempt<'a> {
    request: &'a ApiRequest,
    number: u32,
}

impl<'a> RequestAttempt<'a> {
    /// Total dispatches allowed for one logical request.
    pub const MAX_ATTEMPTS: u32 = 2;

    pub fn first(request: &'a ApiRequest) -> Self {
        Self { request, number: 1 }
    }

    /// The follow-up attempt, if one is still permitted.
    pub fn retry(&self) -> Option<Self> {
        (self.number < Self::MAX_ATTEMPTS).then(|| Self {
            request: self.request,
            number: self.number + 1,
        })
    }

    pub fn is_retry(&self) -> bool {
        self.number > 1
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn request(&self) -> &'a ApiRequest {
        self.request
    }
}
