//! Firebase client factory: service-account credentials, an app registry, and
//! the Firestore and Realtime Database handles built on top of them.

pub mod app;
pub mod auth;
pub mod connectivity;
mod endpoint;
pub mod error;
pub mod firestore;
pub mod manager;
pub mod realtime;

pub use app::{AppOptions, AppRegistry, FirebaseApp, DEFAULT_APP_NAME};
pub use auth::{ServiceAccountCredential, StaticToken, TokenSource};
pub use connectivity::{check_connection, ConnectionReport};
pub use error::{ClientError, InitError};
pub use firestore::{CollectionReference, Document, DocumentReference, FirestoreClient};
pub use manager::FirebaseManager;
pub use realtime::DatabaseReference;
