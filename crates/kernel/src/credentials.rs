use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config_file::{
    ConfigMap, CLIENT_EMAIL, CLIENT_ID, CLIENT_X509_CERT_URL, PRIVATE_KEY, PRIVATE_KEY_ID,
    PROJECT_ID,
};
use crate::error::ConfigError;

pub const SERVICE_ACCOUNT_TYPE: &str = "service_account";
pub const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const AUTH_PROVIDER_X509_CERT_URL: &str = "https://www.googleapis.com/oauth2/v1/certs";

/// Service-account credential descriptor, serializable to the standard
/// Google service-account JSON shape.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountConfig {
    #[serde(rename = "type")]
    pub account_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
}

impl ServiceAccountConfig {
    /// Build the descriptor from a validated [`ConfigMap`].
    ///
    /// Literal `\n` sequences in the private key are turned into newlines so
    /// the PEM block survives being stored on a single line.
    pub fn from_config_map(map: &ConfigMap) -> Result<Self, ConfigError> {
        map.validate()?;

        let project_id = map.require(PROJECT_ID)?.to_string();
        if project_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: PROJECT_ID.to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            account_type: SERVICE_ACCOUNT_TYPE.to_string(),
            project_id,
            private_key_id: map.require(PRIVATE_KEY_ID)?.to_string(),
            private_key: unescape_newlines(map.require(PRIVATE_KEY)?),
            client_email: map.require(CLIENT_EMAIL)?.to_string(),
            client_id: map.require(CLIENT_ID)?.to_string(),
            auth_uri: AUTH_URI.to_string(),
            token_uri: TOKEN_URI.to_string(),
            auth_provider_x509_cert_url: AUTH_PROVIDER_X509_CERT_URL.to_string(),
            client_x509_cert_url: map.require(CLIENT_X509_CERT_URL)?.to_string(),
        })
    }

    /// Load and validate a credentials file in one step.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let map = ConfigMap::load(path)?;
        Self::from_config_map(&map)
    }

    /// Parse a downloaded service-account JSON key.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::InvalidValue {
                key: "service_account_json".to_string(),
                reason: err.to_string(),
            })?;

        if config.account_type != SERVICE_ACCOUNT_TYPE {
            return Err(ConfigError::InvalidValue {
                key: "type".to_string(),
                reason: format!(
                    "expected '{SERVICE_ACCOUNT_TYPE}', found '{}'",
                    config.account_type
                ),
            });
        }

        Ok(config)
    }

    /// Realtime Database URL derived from the project id.
    pub fn default_database_url(&self) -> String {
        format!("https://{}.firebaseio.com", self.project_id)
    }
}

impl fmt::Debug for ServiceAccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountConfig")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[REDACTED]")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn unescape_newlines(value: &str) -> String {
    value.replace("\\n", "\n")
}
