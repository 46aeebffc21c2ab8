use anyhow::Context;
use hub_db::{AppRegistry, FirebaseManager};
use hub_kernel::settings::Settings;

/// Everything the rest of the application needs, built once at startup and
/// passed by reference from there on.
#[derive(Debug)]
pub struct Hub {
    settings: Settings,
    registry: AppRegistry,
    firebase: FirebaseManager,
}

impl Hub {
    /// Initialize Firebase from `settings` with a fresh app registry.
    pub async fn start(settings: Settings) -> anyhow::Result<Self> {
        Self::start_with_registry(settings, AppRegistry::new()).await
    }

    pub async fn start_with_registry(
        settings: Settings,
        registry: AppRegistry,
    ) -> anyhow::Result<Self> {
        let firebase = FirebaseManager::initialize(&settings.firebase, &registry)
            .await
            .with_context(|| {
                format!(
                    "failed to initialize Firebase from {}",
                    settings.firebase.credentials_path.display()
                )
            })?;

        Ok(Self {
            settings,
            registry,
            firebase,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn firebase(&self) -> &FirebaseManager {
        &self.firebase
    }
}
