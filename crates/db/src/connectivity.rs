//! Write/read round-trip against Firestore to prove the credentials work.

use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{json, Value};
use uuid::{Timestamp, Uuid};

use crate::error::ClientError;
use crate::firestore::FirestoreClient;

pub const CONNECTION_TEST_COLLECTION: &str = "_connection_test";

/// Outcome of a successful check.
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    pub document_path: String,
    pub round_trip: Duration,
}

/// Write a marker document, read it back, compare, and clean up.
pub async fn check_connection(firestore: &FirestoreClient) -> Result<ConnectionReport, ClientError> {
    let marker = Uuid::new_v7(Timestamp::now(uuid::NoContext)).to_string();
    check_connection_with_marker(firestore, &marker).await
}

/// Same as [`check_connection`] with a caller-chosen marker, which doubles as
/// the document id.
pub async fn check_connection_with_marker(
    firestore: &FirestoreClient,
    marker: &str,
) -> Result<ConnectionReport, ClientError> {
    let started = Instant::now();
    let document = firestore
        .collection(CONNECTION_TEST_COLLECTION)?
        .document(marker)?;

    let payload = json!({
        "status": "connected",
        "marker": marker,
        "checked_at": Utc::now().to_rfc3339(),
    });
    let fields = payload
        .as_object()
        .ok_or_else(|| ClientError::Decode("marker payload is not an object".to_string()))?;

    document.set(fields).await?;

    let read_back = document
        .get()
        .await?
        .ok_or_else(|| ClientError::Connectivity("marker document missing after write".to_string()))?;

    match read_back.get("marker") {
        Some(Value::String(found)) if found == marker => {}
        other => {
            return Err(ClientError::Connectivity(format!(
                "marker mismatch: wrote {marker}, read {}",
                other.map(Value::to_string).unwrap_or_else(|| "nothing".to_string())
            )));
        }
    }

    // Cleanup failures are logged, not returned.
    if let Err(err) = document.delete().await {
        tracing::warn!(path = %document.path(), error = %err, "failed to remove connection marker");
    }

    let report = ConnectionReport {
        document_path: document.path().to_string(),
        round_trip: started.elapsed(),
    };

    tracing::info!(
        path = %report.document_path,
        round_trip_ms = report.round_trip.as_millis() as u64,
        "Firestore connectivity verified"
    );

    Ok(report)
}
