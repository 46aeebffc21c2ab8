pub mod config_file;
pub mod credentials;
pub mod error;
pub mod settings;

pub use config_file::{ConfigMap, REQUIRED_KEYS};
pub use credentials::ServiceAccountConfig;
pub use error::ConfigError;
pub use settings::Settings;
