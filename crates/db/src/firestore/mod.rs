//! Structured-document client over the Firestore REST API.

pub mod value;

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::TokenSource;
use crate::endpoint::join_segments;
use crate::error::{ensure_success, ClientError};

const DEFAULT_DATABASE: &str = "(default)";

/// Handle to one project's default Firestore database.
#[derive(Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    token: Arc<dyn TokenSource>,
    project_id: String,
    documents_url: String,
}

impl FirestoreClient {
    pub fn new(
        http: reqwest::Client,
        token: Arc<dyn TokenSource>,
        endpoint: &str,
        project_id: &str,
    ) -> Self {
        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            endpoint.trim_end_matches('/'),
            project_id,
            DEFAULT_DATABASE
        );

        Self {
            http,
            token,
            project_id: project_id.to_string(),
            documents_url,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Reference a collection by slash-separated path (`users` or `users/alice/posts`).
    pub fn collection(&self, path: &str) -> Result<CollectionReference, ClientError> {
        let segments = split_path(path)?;
        if segments.len() % 2 == 0 {
            return Err(ClientError::invalid_path(
                path,
                "collection paths need an odd number of segments",
            ));
        }

        Ok(CollectionReference {
            client: self.clone(),
            path: segments.join("/"),
        })
    }

    /// Reference a document by slash-separated path (`users/alice`).
    pub fn document(&self, path: &str) -> Result<DocumentReference, ClientError> {
        let segments = split_path(path)?;
        if segments.len() % 2 != 0 {
            return Err(ClientError::invalid_path(
                path,
                "document paths need an even number of segments",
            ));
        }

        Ok(DocumentReference {
            client: self.clone(),
            path: segments.join("/"),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        join_segments(&self.documents_url, path.split('/'))
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, ClientError> {
        let token = self.token.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }
}

impl fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("project_id", &self.project_id)
            .field("documents_url", &self.documents_url)
            .finish_non_exhaustive()
    }
}

/// A collection of documents.
#[derive(Debug, Clone)]
pub struct CollectionReference {
    client: FirestoreClient,
    path: String,
}

impl CollectionReference {
    pub fn id(&self) -> &str {
        last_segment(&self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn document(&self, id: &str) -> Result<DocumentReference, ClientError> {
        self.client.document(&format!("{}/{}", self.path, id))
    }

    /// Create a document with a server-assigned id.
    pub async fn add(&self, data: &Map<String, Value>) -> Result<Document, ClientError> {
        let url = self.client.url(&self.path)?;
        let response = self
            .client
            .request(Method::POST, url)
            .await?
            .json(&json!({ "fields": value::encode_fields(data) }))
            .send()
            .await?;

        let document = read_document(response).await?;
        tracing::debug!(collection = %self.path, id = %document.id, "document added");
        Ok(document)
    }
}

/// A single document location, which may or may not exist yet.
#[derive(Debug, Clone)]
pub struct DocumentReference {
    client: FirestoreClient,
    path: String,
}

impl DocumentReference {
    pub fn id(&self) -> &str {
        last_segment(&self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn collection(&self, id: &str) -> Result<CollectionReference, ClientError> {
        self.client.collection(&format!("{}/{}", self.path, id))
    }

    /// Create or overwrite the document with `data`.
    pub async fn set(&self, data: &Map<String, Value>) -> Result<Document, ClientError> {
        let url = self.client.url(&self.path)?;
        let response = self
            .client
            .request(Method::PATCH, url)
            .await?
            .json(&json!({ "fields": value::encode_fields(data) }))
            .send()
            .await?;

        read_document(response).await
    }

    /// Fetch the document; `None` when it does not exist.
    pub async fn get(&self) -> Result<Option<Document>, ClientError> {
        let url = self.client.url(&self.path)?;
        let response = self
            .client
            .request(Method::GET, url)
            .await?
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        read_document(response).await.map(Some)
    }

    pub async fn delete(&self) -> Result<(), ClientError> {
        let url = self.client.url(&self.path)?;
        let response = self
            .client
            .request(Method::DELETE, url)
            .await?
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// A document snapshot with its fields decoded to plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Full resource name, `projects/{p}/databases/{d}/documents/{path}`.
    pub name: String,
    pub id: String,
    pub fields: Map<String, Value>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    create_time: Option<String>,
    update_time: Option<String>,
}

impl TryFrom<RawDocument> for Document {
    type Error = ClientError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: last_segment(&raw.name).to_string(),
            fields: value::decode_fields(&raw.fields)?,
            name: raw.name,
            create_time: raw.create_time,
            update_time: raw.update_time,
        })
    }
}

async fn read_document(response: reqwest::Response) -> Result<Document, ClientError> {
    let raw: RawDocument = ensure_success(response)
        .await?
        .json()
        .await
        .map_err(|err| ClientError::Decode(format!("document: {err}")))?;
    Document::try_from(raw)
}

fn split_path(path: &str) -> Result<Vec<&str>, ClientError> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ClientError::invalid_path(path, "empty path segment"));
    }
    Ok(segments)
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use mockito::{Matcher, Server};

    const DOCS: &str = "/projects/proj1/databases/(default)/documents";

    fn client(endpoint: &str) -> FirestoreClient {
        FirestoreClient::new(
            reqwest::Client::new(),
            Arc::new(StaticToken::new("test-token")),
            endpoint,
            "proj1",
        )
    }

    #[test]
    fn validates_collection_and_document_paths() {
        let firestore = client("http://localhost");

        assert_eq!(firestore.collection("users").unwrap().id(), "users");
        assert_eq!(
            firestore.document("/users/alice/").unwrap().path(),
            "users/alice"
        );
        assert!(firestore.collection("users/alice").is_err());
        assert!(firestore.document("users").is_err());
        assert!(firestore.document("users//alice").is_err());

        let posts = firestore
            .document("users/alice")
            .unwrap()
            .collection("posts")
            .unwrap();
        assert_eq!(posts.path(), "users/alice/posts");
        assert_eq!(posts.document("p1").unwrap().id(), "p1");
    }

    #[tokio::test]
    async fn set_patches_encoded_fields_with_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", format!("{DOCS}/users/alice").as_str())
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::Json(json!({
                "fields": {"name": {"stringValue": "Alice"}, "age": {"integerValue": "30"}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "name": "projects/proj1/databases/(default)/documents/users/alice",
                    "fields": {"name": {"stringValue": "Alice"}, "age": {"integerValue": "30"}},
                    "createTime": "2024-01-01T00:00:00Z",
                    "updateTime": "2024-01-01T00:00:00Z"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let data = json!({"name": "Alice", "age": 30});
        let document = client(&server.url())
            .document("users/alice")
            .unwrap()
            .set(data.as_object().unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(document.id, "alice");
        assert_eq!(document.get("age"), Some(&json!(30)));
        assert_eq!(document.update_time.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn reserved_characters_in_ids_are_percent_encoded() {
        let mut server = Server::new_async().await;
        let exact = server
            .mock("GET", format!("{DOCS}/notes/a%23b").as_str())
            .with_status(200)
            .with_body(
                json!({
                    "name": "projects/proj1/databases/(default)/documents/notes/a#b",
                    "fields": {"text": {"stringValue": "right"}}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let truncated = server
            .mock("GET", format!("{DOCS}/notes/a").as_str())
            .with_status(200)
            .with_body(
                json!({
                    "name": "projects/proj1/databases/(default)/documents/notes/a",
                    "fields": {"text": {"stringValue": "wrong"}}
                })
                .to_string(),
            )
            .expect(0)
            .create_async()
            .await;
        let write = server
            .mock("PATCH", format!("{DOCS}/notes/what%3Fnow%20then").as_str())
            .match_query(Matcher::Missing)
            .with_status(200)
            .with_body(
                json!({
                    "name": "projects/proj1/databases/(default)/documents/notes/what?now then",
                    "fields": {"text": {"stringValue": "kept"}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let firestore = client(&server.url());
        let document = firestore
            .document("notes/a#b")
            .unwrap()
            .get()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(document.get("text"), Some(&json!("right")));

        let data = json!({"text": "kept"});
        firestore
            .collection("notes")
            .unwrap()
            .document("what?now then")
            .unwrap()
            .set(data.as_object().unwrap())
            .await
            .unwrap();

        exact.assert_async().await;
        truncated.assert_async().await;
        write.assert_async().await;
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_documents() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", format!("{DOCS}/users/ghost").as_str())
            .with_status(404)
            .with_body(r#"{"error":{"code":404,"status":"NOT_FOUND"}}"#)
            .create_async()
            .await;

        let result = client(&server.url())
            .document("users/ghost")
            .unwrap()
            .get()
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn get_surfaces_server_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", format!("{DOCS}/users/alice").as_str())
            .with_status(403)
            .with_body("PERMISSION_DENIED")
            .create_async()
            .await;

        let err = client(&server.url())
            .document("users/alice")
            .unwrap()
            .get()
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn add_posts_to_collection_and_reads_assigned_id() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", format!("{DOCS}/notes").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "name": "projects/proj1/databases/(default)/documents/notes/AbC123",
                    "fields": {"text": {"stringValue": "hello"}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let data = json!({"text": "hello"});
        let document = client(&server.url())
            .collection("notes")
            .unwrap()
            .add(data.as_object().unwrap())
            .await
            .unwrap();

        assert_eq!(document.id, "AbC123");
        assert_eq!(document.get("text"), Some(&json!("hello")));
    }

    #[tokio::test]
    async fn delete_issues_delete_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", format!("{DOCS}/users/alice").as_str())
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client(&server.url())
            .document("users/alice")
            .unwrap()
            .delete()
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
