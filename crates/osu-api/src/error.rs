//! Error types for the osu! API client.
//!
//! Every failure is surfaced to the immediate caller; nothing in this crate
//! retries on its own.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid setup (no token, bad rate limit settings).
    Configuration,
    /// The API answered with a status code of 400 or above.
    Network,
    /// The request never produced a usable response (transport or decoding).
    Local,
    /// The caller passed an argument that can never succeed.
    Misuse,
}

/// Errors that can occur while talking to the osu! API.
#[derive(Debug, Error)]
pub enum Error {
    /// An authenticated request was attempted without a token.
    #[error("Missing token: {0}")]
    MissingToken(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API returned an error status.
    #[error("API error ({code} {message})")]
    Network {
        /// HTTP status code.
        code: u16,
        /// Status text.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// Connection, TLS or timeout failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// An argument that can never produce a valid request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The endpoint template still contains a `{name}` placeholder.
    #[error("Unresolved placeholder {{{name}}} in endpoint {endpoint}")]
    UnresolvedPlaceholder {
        /// Placeholder name without braces.
        name: String,
        /// The endpoint template.
        endpoint: String,
    },
}

impl Error {
    /// Returns the broad class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingToken(_) | Self::Config(_) => ErrorKind::Configuration,
            Self::Network { .. } => ErrorKind::Network,
            Self::Transport(_) | Self::Decode(_) => ErrorKind::Local,
            Self::InvalidArgument(_) | Self::UnresolvedPlaceholder { .. } => ErrorKind::Misuse,
        }
    }

    /// Returns the HTTP status for network errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Creates a network error from a status code, status text and body.
    #[must_use]
    pub fn network(code: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Network {
            code,
            message: message.into(),
            body: body.into(),
        }
    }
}

/// Maps a 404 into absence, keeping every other error.
pub(crate) fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
