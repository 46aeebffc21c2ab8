//! Loader for the flat `KEY=VALUE` credentials file.
//!
//! The format is deliberately simpler than a full dotenv dialect: one pair per
//! line, `#` comments, blank lines ignored, the first `=` separates key from
//! value, and surrounding quote characters are stripped from values. There is
//! no variable expansion and no multi-line values; private keys carry literal
//! `\n` sequences instead.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Conventional credentials file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".env";

pub const PROJECT_ID: &str = "FIREBASE_PROJECT_ID";
pub const PRIVATE_KEY_ID: &str = "FIREBASE_PRIVATE_KEY_ID";
pub const PRIVATE_KEY: &str = "FIREBASE_PRIVATE_KEY";
pub const CLIENT_EMAIL: &str = "FIREBASE_CLIENT_EMAIL";
pub const CLIENT_ID: &str = "FIREBASE_CLIENT_ID";
pub const CLIENT_X509_CERT_URL: &str = "FIREBASE_CLIENT_X509_CERT_URL";

/// Keys that must be present for a credentials file to be usable.
/// Missing keys are reported in this order.
pub const REQUIRED_KEYS: [&str; 6] = [
    PROJECT_ID,
    PRIVATE_KEY_ID,
    PRIVATE_KEY,
    CLIENT_EMAIL,
    CLIENT_ID,
    CLIENT_X509_CERT_URL,
];

/// Key/value pairs parsed from a credentials file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: HashMap<String, String>,
}

impl ConfigMap {
    /// Read `path`, parse it, and check that every required key is present.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                tracing::error!(path = %path.display(), "configuration file not found");
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let map = Self::parse(&contents);
        map.validate()?;

        tracing::debug!(
            path = %path.display(),
            keys = map.len(),
            "loaded credentials file"
        );

        Ok(map)
    }

    /// Parse file contents without validating required keys.
    pub fn parse(contents: &str) -> Self {
        let mut entries = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            let key = key.trim();
            if key.is_empty() {
                continue;
            }

            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            entries.insert(key.to_string(), value.to_string());
        }

        Self { entries }
    }

    /// Fail with every absent required key, in canonical order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|key| !self.entries.contains_key(**key))
            .map(|key| key.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a key that must exist.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKeys(vec![key.to_string()]))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Key names in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

// Values hold key material, so only the key names are printed.
impl fmt::Debug for ConfigMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigMap")
            .field("keys", &self.keys())
            .finish()
    }
}
