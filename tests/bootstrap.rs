use std::io::Write;

use hub_app::Hub;
use hub_db::InitError;
use hub_kernel::settings::Settings;

const TEST_KEY: &str = include_str!("../crates/db/tests/fixtures/test_key.pem");

fn credentials_file() -> tempfile::NamedTempFile {
    let escaped = TEST_KEY.trim_end().replace('\n', "\\n");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "FIREBASE_PROJECT_ID=proj1\n\
         FIREBASE_PRIVATE_KEY_ID=kid-1\n\
         FIREBASE_PRIVATE_KEY=\"{escaped}\"\n\
         FIREBASE_CLIENT_EMAIL=svc@proj1.iam.gserviceaccount.com\n\
         FIREBASE_CLIENT_ID=1234\n\
         FIREBASE_CLIENT_X509_CERT_URL=https://example.invalid/x509/svc"
    )
    .unwrap();
    file
}

#[tokio::test]
async fn starts_with_one_registered_app() {
    let file = credentials_file();
    let mut settings = Settings::default();
    settings.firebase.credentials_path = file.path().to_path_buf();
    settings.firebase.verify_connection = false;

    let hub = Hub::start(settings).await.unwrap();

    assert_eq!(hub.registry().len(), 1);
    assert_eq!(hub.firebase().app().project_id(), "proj1");
    assert_eq!(
        hub.firebase().realtime().database_url(),
        "https://proj1.firebaseio.com"
    );
}

#[tokio::test]
async fn start_reports_missing_credentials_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.firebase.credentials_path = dir.path().join("missing.env");

    let err = Hub::start(settings).await.unwrap_err();

    assert!(err.to_string().contains("missing.env"));
    let init = err.downcast_ref::<InitError>().unwrap();
    assert!(init.is_file_not_found());
}

#[tokio::test]
async fn start_fails_when_connectivity_check_cannot_reach_firestore() {
    let mut server = mockito::Server::new_async().await;
    let _token = server
        .mock("POST", "/token")
        .with_status(200)
        .with_body(r#"{"access_token":"ya29.mock","expires_in":3600}"#)
        .create_async()
        .await;
    let _write = server
        .mock("PATCH", mockito::Matcher::Any)
        .with_status(503)
        .with_body("backend unavailable")
        .create_async()
        .await;

    let file = credentials_file();
    let mut settings = Settings::default();
    settings.firebase.credentials_path = file.path().to_path_buf();
    settings.firebase.firestore_endpoint = server.url();
    settings.firebase.token_uri = Some(format!("{}/token", server.url()));

    let err = Hub::start(settings).await.unwrap_err();
    let init = err.downcast_ref::<InitError>().unwrap();

    assert!(!init.is_configuration());
    assert!(format!("{err:#}").contains("503"));
}
