//! Test doubles shared by the unit tests.

use crate::api::dispatcher::Transport;
use crate::api::request::Request;
use crate::auth::{Credentials, Token};
use crate::client::Client;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&Request) -> Result<Option<String>> + Send + Sync>;

/// Transport answering from a closure and recording every request
pub(crate) struct FakeTransport {
    responder: Responder,
    requests: Mutex<Vec<Request>>,
}

impl FakeTransport {
    pub(crate) fn new(
        responder: impl Fn(&Request) -> Result<Option<String>> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_raw(&self, request: Request) -> Result<Option<String>> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(&request)
    }
}

pub(crate) fn test_token() -> Token {
    Token {
        access_token: "test-access".to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 86400,
        refresh_token: None,
    }
}

/// Body of a successful token response
pub(crate) fn token_response(access_token: &str, expires_in: u64) -> Result<Option<String>> {
    Ok(Some(
        json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": expires_in
        })
        .to_string(),
    ))
}

/// Application client that already holds [`test_token`]
pub(crate) fn app_client(transport: Arc<FakeTransport>) -> Client {
    let client = Client::with_transport(transport, Credentials::new("1", "secret"));
    client.set_token(test_token());
    client
}
