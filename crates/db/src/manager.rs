use std::sync::Arc;
use std::time::Duration;

use hub_kernel::settings::FirebaseSettings;
use hub_kernel::ServiceAccountConfig;

use crate::app::{AppOptions, AppRegistry, FirebaseApp};
use crate::auth::ServiceAccountCredential;
use crate::connectivity::{check_connection, ConnectionReport};
use crate::error::{ClientError, InitError};
use crate::firestore::FirestoreClient;
use crate::realtime::DatabaseReference;

/// The initialized database handles: a Firestore client and the Realtime
/// Database root reference, both bound to one registered app.
#[derive(Debug, Clone)]
pub struct FirebaseManager {
    app: Arc<FirebaseApp>,
    firestore: FirestoreClient,
    realtime: DatabaseReference,
}

impl FirebaseManager {
    /// Load credentials from `settings.credentials_path`, register the app in
    /// `registry` unless it is already there, and optionally verify
    /// connectivity.
    pub async fn initialize(
        settings: &FirebaseSettings,
        registry: &AppRegistry,
    ) -> Result<Self, InitError> {
        let result = match ServiceAccountConfig::from_file(&settings.credentials_path) {
            Ok(config) => Self::initialize_inner(&config, settings, registry).await,
            Err(err) => Err(err.into()),
        };
        Self::log_outcome(result)
    }

    /// Same as [`initialize`](Self::initialize) for a descriptor obtained some
    /// other way.
    pub async fn initialize_with_descriptor(
        config: &ServiceAccountConfig,
        settings: &FirebaseSettings,
        registry: &AppRegistry,
    ) -> Result<Self, InitError> {
        Self::log_outcome(Self::initialize_inner(config, settings, registry).await)
    }

    async fn initialize_inner(
        config: &ServiceAccountConfig,
        settings: &FirebaseSettings,
        registry: &AppRegistry,
    ) -> Result<Self, InitError> {
        let (app, _created) = registry
            .get_or_try_init(&settings.app_name, || build_app(config, settings))?;

        let manager = Self::from_app(app)?;

        if settings.verify_connection {
            manager.test_connection().await?;
        }

        Ok(manager)
    }

    fn log_outcome(result: Result<Self, InitError>) -> Result<Self, InitError> {
        match &result {
            Ok(manager) => tracing::info!(
                app = manager.app.name(),
                project_id = %manager.app.project_id(),
                "FirebaseManager initialized successfully"
            ),
            Err(err) => tracing::error!(error = %err, "Firebase initialization failed"),
        }
        result
    }

    /// Wrap an already registered app.
    pub fn from_app(app: Arc<FirebaseApp>) -> Result<Self, ClientError> {
        let firestore = app.firestore();
        let realtime = app.reference("/")?;
        Ok(Self {
            app,
            firestore,
            realtime,
        })
    }

    pub fn app(&self) -> &Arc<FirebaseApp> {
        &self.app
    }

    pub fn firestore(&self) -> &FirestoreClient {
        &self.firestore
    }

    /// Root of the Realtime Database tree.
    pub fn realtime(&self) -> &DatabaseReference {
        &self.realtime
    }

    /// Round-trip a marker document through Firestore.
    pub async fn test_connection(&self) -> Result<ConnectionReport, InitError> {
        Ok(check_connection(&self.firestore).await?)
    }
}

fn build_app(
    config: &ServiceAccountConfig,
    settings: &FirebaseSettings,
) -> Result<FirebaseApp, ClientError> {
    let request_timeout = Duration::from_millis(settings.request_timeout_ms);
    let http = reqwest::Client::builder().timeout(request_timeout).build()?;

    let mut credential = ServiceAccountCredential::from_descriptor(config, http.clone())?;
    if let Some(token_uri) = &settings.token_uri {
        credential = credential.with_token_uri(token_uri.clone());
    }

    let options = AppOptions {
        database_url: settings
            .database_url
            .clone()
            .unwrap_or_else(|| config.default_database_url()),
        firestore_endpoint: settings.firestore_endpoint.clone(),
        request_timeout,
    };

    Ok(FirebaseApp::with_http(
        settings.app_name.clone(),
        config.project_id.clone(),
        Arc::new(credential),
        options,
        http,
    ))
}
