//! Declarative request descriptions.
//!
//! A [`Request`] says what to call; the dispatcher decides how. Endpoint
//! templates use `{name}` placeholders filled from the endpoint arguments.

use crate::error::{Error, Result};
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;

/// Description of one API call
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP verb
    pub method: Method,
    /// Endpoint template, e.g. `/api/v2/beatmaps/{beatmap}`
    pub endpoint: String,
    /// Values for the `{name}` placeholders in the endpoint
    pub endpoint_arguments: BTreeMap<String, String>,
    /// Query parameters, in insertion order
    pub query: Vec<(String, String)>,
    /// Extra headers; these win over the dispatcher's defaults
    pub headers: Vec<(String, String)>,
    /// JSON body, sent only for mutating verbs
    pub body: Option<Value>,
    /// Access token sent as a bearer credential
    pub bearer: Option<String>,
    /// Host override
    pub host: Option<String>,
    /// Resolve to nothing instead of parsing the response body
    pub discard_output: bool,
    /// User agent override
    pub user_agent: Option<String>,
}

impl Request {
    /// Create a request for the given verb and endpoint template
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            endpoint_arguments: BTreeMap::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            bearer: None,
            host: None,
            discard_output: false,
            user_agent: None,
        }
    }

    /// Create a GET request
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// Create a POST request
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// Set a placeholder value
    pub fn argument(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.endpoint_arguments.insert(name.into(), value.to_string());
        self
    }

    /// Set a query parameter, replacing any previous value for the key
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set_query(key, value);
        self
    }

    /// Append a query parameter, keeping previous values (for `key[]` lists)
    pub fn append_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Set a query parameter in place
    pub fn set_query(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
    }

    /// Look up a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the JSON body
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the bearer token
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Override the host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Skip parsing the response body
    pub fn discard_output(mut self) -> Self {
        self.discard_output = true;
        self
    }

    /// Override the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Whether this verb carries a body
    pub fn is_mutating(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    /// Substitute every `{name}` placeholder in the endpoint
    pub fn resolve_path(&self) -> Result<String> {
        let mut path = String::with_capacity(self.endpoint.len());
        let mut rest = self.endpoint.as_str();

        while let Some(open) = rest.find('{') {
            path.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                return Err(Error::InvalidArgument(format!(
                    "unterminated placeholder in endpoint {}",
                    self.endpoint
                )));
            };

            let name = &after[..close];
            let value = self.endpoint_arguments.get(name).ok_or_else(|| {
                Error::UnresolvedPlaceholder {
                    name: name.to_string(),
                    endpoint: self.endpoint.clone(),
                }
            })?;
            path.push_str(value);
            rest = &after[close + 1..];
        }
        path.push_str(rest);

        Ok(path)
    }
}
