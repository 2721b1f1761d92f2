//! OAuth tokens and grants.

use crate::api::endpoints;
use crate::api::enums::GrantType;
use crate::api::request::Request;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Seconds before expiry at which a token is refreshed
pub const REFRESH_MARGIN_SECS: u64 = 100;

/// Token returned by the OAuth token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    /// Only issued for user grants
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Token {
    /// How long to wait before refreshing this token
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_secs(self.expires_in.saturating_sub(REFRESH_MARGIN_SECS))
    }
}

/// OAuth application credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Required by the API for the authorization code grant
    pub redirect_uri: Option<String>,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: None,
        }
    }

    /// Read credentials from the `[credentials]` config section
    pub fn from_config(config: &shared::Config) -> Result<Self> {
        let section = &config.credentials;
        if section.client_id.is_empty() || section.client_secret.is_empty() {
            return Err(Error::Config(
                "client_id and client_secret must be set".to_string(),
            ));
        }

        Ok(Self {
            client_id: section.client_id.clone(),
            client_secret: section.client_secret.clone(),
            redirect_uri: section.redirect_uri.clone(),
        })
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }
}

/// What kind of secret a user client is created from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserGrant {
    /// An authorization code from the OAuth redirect
    Authorization,
    /// A refresh token from an earlier session
    Refresh,
}

/// How a client obtains its tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Grant {
    ClientCredentials,
    User,
}

/// Announcement on a client's token channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenUpdate {
    /// A new token was installed
    Refreshed(Token),
    /// A scheduled refresh failed; the old token stays until it expires
    RefreshFailed(String),
}

/// Build a token request for the given grant
///
/// `secret` is the authorization code or refresh token; it is ignored for the
/// client credentials grant.
pub(crate) fn token_request(
    credentials: &Credentials,
    grant: GrantType,
    secret: Option<&str>,
) -> Result<Request> {
    let mut body = Map::new();
    body.insert("grant_type".into(), json!(grant.as_str()));
    body.insert("client_id".into(), json!(credentials.client_id));
    body.insert("client_secret".into(), json!(credentials.client_secret));

    match grant {
        GrantType::ClientCredentials => {
            body.insert("scope".into(), json!("public"));
        }
        GrantType::RefreshToken => {
            let token = secret.ok_or_else(|| {
                Error::MissingToken("no refresh token to renew the session with".to_string())
            })?;
            body.insert("refresh_token".into(), json!(token));
        }
        GrantType::AuthorizationCode => {
            let code = secret.ok_or_else(|| {
                Error::InvalidArgument("authorization code grant needs a code".to_string())
            })?;
            body.insert("code".into(), json!(code));
            if let Some(redirect_uri) = &credentials.redirect_uri {
                body.insert("redirect_uri".into(), json!(redirect_uri));
            }
        }
    }

    Ok(Request::post(endpoints::TOKEN).body(Value::Object(body)))
}
