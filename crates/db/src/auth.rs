//! OAuth2 access tokens for service accounts.
//!
//! A service account proves its identity by signing a short-lived RS256 JWT
//! assertion with its private key and exchanging it at the token endpoint for
//! a bearer token. Tokens are cached and refreshed shortly before they expire.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hub_kernel::ServiceAccountConfig;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::ClientError;

/// Scopes needed for Firestore and the Realtime Database.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/datastore",
    "https://www.googleapis.com/auth/firebase.database",
    "https://www.googleapis.com/auth/userinfo.email",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the server-reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Source of bearer tokens for outgoing requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, ClientError>;
}

/// Fixed token, for emulators and tests.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, ClientError> {
        Ok(self.0.clone())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken([REDACTED])")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "TokenResponse::default_expires_in")]
    expires_in: i64,
}

impl TokenResponse {
    fn default_expires_in() -> i64 {
        ASSERTION_LIFETIME_SECS
    }
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        Duration::try_seconds(EXPIRY_MARGIN_SECS)
            .and_then(|margin| now.checked_add_signed(margin))
            .is_some_and(|deadline| deadline < self.expires_at)
    }
}

/// Certificate credential built from a [`ServiceAccountConfig`].
pub struct ServiceAccountCredential {
    http: reqwest::Client,
    client_email: String,
    private_key_id: String,
    token_uri: String,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountCredential {
    /// Parse the descriptor's PEM key. No network traffic happens until the
    /// first token is requested.
    pub fn from_descriptor(
        config: &ServiceAccountConfig,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(ClientError::InvalidKey)?;

        Ok(Self {
            http,
            client_email: config.client_email.clone(),
            private_key_id: config.private_key_id.clone(),
            token_uri: config.token_uri.clone(),
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    /// Send token requests somewhere other than the descriptor's `token_uri`.
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    pub(crate) fn assertion(&self, now: DateTime<Utc>) -> Result<String, ClientError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.private_key_id.clone());

        encode(&header, &claims, &self.encoding_key).map_err(ClientError::Signing)
    }

    async fn fetch_token(&self) -> Result<CachedToken, ClientError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| ClientError::Decode(format!("token response: {err}")))?;

        tracing::debug!(
            client_email = %self.client_email,
            expires_in = token.expires_in,
            "obtained access token"
        );

        let expires_at = Some(token.expires_in)
            .filter(|secs| *secs >= 0)
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                ClientError::Decode(format!(
                    "token response: expires_in {} is out of range",
                    token.expires_in
                ))
            })?;

        Ok(CachedToken {
            value: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountCredential {
    async fn access_token(&self) -> Result<String, ClientError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

impl fmt::Debug for ServiceAccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredential")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}
