use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::auth::TokenSource;
use crate::error::ClientError;
use crate::firestore::FirestoreClient;
use crate::realtime::DatabaseReference;

/// Name used when the caller does not pick one.
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Endpoints and transport settings for one app.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub database_url: String,
    pub firestore_endpoint: String,
    pub request_timeout: Duration,
}

/// An initialized app: a project, a credential, and the endpoints to reach it.
pub struct FirebaseApp {
    name: String,
    project_id: String,
    options: AppOptions,
    http: reqwest::Client,
    credential: Arc<dyn TokenSource>,
}

impl FirebaseApp {
    pub fn new(
        name: impl Into<String>,
        project_id: impl Into<String>,
        credential: Arc<dyn TokenSource>,
        options: AppOptions,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self::with_http(name, project_id, credential, options, http))
    }

    /// Build an app around an existing HTTP client (shared with the credential).
    pub fn with_http(
        name: impl Into<String>,
        project_id: impl Into<String>,
        credential: Arc<dyn TokenSource>,
        options: AppOptions,
        http: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            options,
            http,
            credential,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    /// Structured-document client for this app's project.
    pub fn firestore(&self) -> FirestoreClient {
        FirestoreClient::new(
            self.http.clone(),
            Arc::clone(&self.credential),
            &self.options.firestore_endpoint,
            &self.project_id,
        )
    }

    /// Hierarchical reference at `path` in this app's Realtime Database.
    pub fn reference(&self, path: &str) -> Result<DatabaseReference, ClientError> {
        DatabaseReference::new(
            self.http.clone(),
            Arc::clone(&self.credential),
            &self.options.database_url,
            path,
        )
    }
}

impl fmt::Debug for FirebaseApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseApp")
            .field("name", &self.name)
            .field("project_id", &self.project_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Registry of initialized apps, keyed by name.
///
/// The composition root owns one registry and hands it to whatever needs to
/// initialize apps. Lookup and creation happen under a single lock, so an app
/// name is only ever initialized once per registry.
#[derive(Default)]
pub struct AppRegistry {
    apps: Mutex<HashMap<String, Arc<FirebaseApp>>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the app registered as `name`, or build and register it with
    /// `init`. `init` only runs when the name is absent, so credentials are
    /// not constructed for an app that already exists.
    ///
    /// The boolean is `true` when this call created the app.
    pub fn get_or_try_init<F, E>(&self, name: &str, init: F) -> Result<(Arc<FirebaseApp>, bool), E>
    where
        F: FnOnce() -> Result<FirebaseApp, E>,
    {
        let mut apps = self.apps.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(app) = apps.get(name) {
            return Ok((Arc::clone(app), false));
        }

        let app = Arc::new(init()?);
        apps.insert(name.to_string(), Arc::clone(&app));
        tracing::info!(app = name, project_id = %app.project_id(), "Firebase app initialized");

        Ok((app, true))
    }

    pub fn get(&self, name: &str) -> Option<Arc<FirebaseApp>> {
        self.apps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Drop an app so the name can be initialized again. Existing handles
    /// keep working until they are dropped.
    pub fn remove(&self, name: &str) -> Option<Arc<FirebaseApp>> {
        self.apps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn len(&self) -> usize {
        self.apps.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered app names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .apps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppRegistry")
            .field("apps", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn options() -> AppOptions {
        AppOptions {
            database_url: "https://proj1.firebaseio.com".to_string(),
            firestore_endpoint: "https://firestore.googleapis.com/v1".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }

    fn build(name: &str) -> Result<FirebaseApp, ClientError> {
        FirebaseApp::new(name, "proj1", Arc::new(StaticToken::new("t")), options())
    }

    #[test]
    fn registry_starts_empty() {
        let registry = AppRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(DEFAULT_APP_NAME).is_none());
    }

    #[test]
    fn second_initialization_reuses_the_first_app() {
        let registry = AppRegistry::new();
        let calls = AtomicUsize::new(0);

        let init = || {
            calls.fetch_add(1, Ordering::SeqCst);
            build(DEFAULT_APP_NAME)
        };

        let (first, created_first) = registry.get_or_try_init(DEFAULT_APP_NAME, init).unwrap();
        let (second, created_second) = registry
            .get_or_try_init(DEFAULT_APP_NAME, || {
                calls.fetch_add(1, Ordering::SeqCst);
                build(DEFAULT_APP_NAME)
            })
            .unwrap();

        assert!(created_first);
        assert!(!created_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_initialization_registers_nothing() {
        let registry = AppRegistry::new();
        let result: Result<_, &str> = registry.get_or_try_init("broken", || Err("boom"));

        assert_eq!(result.unwrap_err(), "boom");
        assert!(!registry.contains("broken"));
    }

    #[test]
    fn concurrent_initializers_converge_on_one_app() {
        let registry = Arc::new(AppRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    registry
                        .get_or_try_init(DEFAULT_APP_NAME, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            build(DEFAULT_APP_NAME)
                        })
                        .unwrap()
                        .0
                })
            })
            .collect();

        let apps: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(apps.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn removed_apps_can_be_initialized_again() {
        let registry = AppRegistry::new();
        registry.get_or_try_init("secondary", || build("secondary")).unwrap();
        registry.get_or_try_init("other", || build("other")).unwrap();
        assert_eq!(registry.names(), vec!["other", "secondary"]);

        assert!(registry.remove("secondary").is_some());
        let (_, created) = registry.get_or_try_init("secondary", || build("secondary")).unwrap();
        assert!(created);
    }

    #[test]
    fn app_hands_out_clients_for_its_project() {
        let app = build(DEFAULT_APP_NAME).unwrap();
        assert_eq!(app.firestore().project_id(), "proj1");
        assert_eq!(app.reference("/").unwrap().path(), "/");
        assert_eq!(
            app.reference("agents").unwrap().database_url(),
            "https://proj1.firebaseio.com"
        );
    }
}
