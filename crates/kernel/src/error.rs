use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while reading or validating the credentials file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    /// Whether this error belongs to the "bad or missing configuration" kind,
    /// as opposed to an environmental failure such as an unreadable file.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingKeys(_) | Self::InvalidValue { .. })
    }

    /// Keys reported as absent, if this is a missing-keys error.
    pub fn missing_keys(&self) -> &[String] {
        match self {
            Self::MissingKeys(keys) => keys,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_message_lists_every_key() {
        let err = ConfigError::MissingKeys(vec![
            "FIREBASE_PROJECT_ID".to_string(),
            "FIREBASE_CLIENT_ID".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "missing keys: FIREBASE_PROJECT_ID, FIREBASE_CLIENT_ID"
        );
        assert!(err.is_configuration());
        assert_eq!(err.missing_keys().len(), 2);
    }

    #[test]
    fn file_not_found_is_not_a_configuration_error() {
        let err = ConfigError::FileNotFound {
            path: PathBuf::from("/nope/.env"),
        };
        assert!(!err.is_configuration());
        assert!(err.missing_keys().is_empty());
        assert!(err.to_string().contains("/nope/.env"));
    }
}
