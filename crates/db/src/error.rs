use std::error::Error as StdError;

use hub_kernel::ConfigError;
use thiserror::Error;

/// Failures talking to the token endpoint, Firestore, or the Realtime Database.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign token assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token exchange failed with status {status}: {body}")]
    TokenExchange { status: u16, body: String },

    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("connectivity check failed: {0}")]
    Connectivity(String),
}

impl ClientError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenExchange { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// The two kinds of initialization failure reported to callers.
#[derive(Debug, Error)]
pub enum InitError {
    /// Bad or missing configuration keys.
    #[error("invalid Firebase configuration: {0}")]
    Configuration(#[source] ConfigError),

    /// Anything else: unreadable files, key parsing, token exchange, transport.
    #[error("failed to initialize Firebase: {0}")]
    Runtime(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl InitError {
    pub fn runtime(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Runtime(err.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether the credentials file itself was absent.
    pub fn is_file_not_found(&self) -> bool {
        match self {
            Self::Runtime(source) => matches!(
                source.downcast_ref::<ConfigError>(),
                Some(ConfigError::FileNotFound { .. })
            ),
            Self::Configuration(_) => false,
        }
    }
}

impl From<ConfigError> for InitError {
    fn from(err: ConfigError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err)
        } else {
            Self::runtime(err)
        }
    }
}

impl From<ClientError> for InitError {
    fn from(err: ClientError) -> Self {
        Self::runtime(err)
    }
}

/// Turn non-success statuses into [`ClientError::Status`], keeping the body for diagnostics.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        url,
        status: status.as_u16(),
        body,
    })
}
