use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::config_file::DEFAULT_CONFIG_PATH;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "HUB_ENV";
const CONFIG_DIR_ENV: &str = "HUB_CONFIG_DIR";
const ENV_PREFIX: &str = "HUB";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(name: &str) -> anyhow::Result<Self> {
        match name {
            "local" => Ok(Self::Local),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub firebase: FirebaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and `HUB_*` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .context("unable to resolve current directory")?,
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let environment_kind = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = environment_kind;

        tracing::debug!(
            env = ?settings.environment,
            config_dir = %config_dir.display(),
            "settings loaded"
        );

        Ok(settings)
    }
}

/// Where the credentials live and how the remote clients are reached.
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseSettings {
    #[serde(default = "FirebaseSettings::default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Overrides `https://{project_id}.firebaseio.com`.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "FirebaseSettings::default_firestore_endpoint")]
    pub firestore_endpoint: String,
    /// Overrides the token endpoint from the credential descriptor.
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default = "FirebaseSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "FirebaseSettings::default_verify_connection")]
    pub verify_connection: bool,
    #[serde(default = "FirebaseSettings::default_app_name")]
    pub app_name: String,
}

impl FirebaseSettings {
    fn default_credentials_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    fn default_firestore_endpoint() -> String {
        "https://firestore.googleapis.com/v1".to_string()
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }

    fn default_verify_connection() -> bool {
        true
    }

    fn default_app_name() -> String {
        "[DEFAULT]".to_string()
    }
}

impl Default for FirebaseSettings {
    fn default() -> Self {
        Self {
            credentials_path: Self::default_credentials_path(),
            database_url: None,
            firestore_endpoint: Self::default_firestore_endpoint(),
            token_uri: None,
            request_timeout_ms: Self::default_request_timeout_ms(),
            verify_connection: Self::default_verify_connection(),
            app_name: Self::default_app_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
