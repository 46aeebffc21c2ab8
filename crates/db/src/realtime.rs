//! Hierarchical references into the Realtime Database REST API.
//!
//! Every node is addressed as `{database_url}/{path}.json`. References are
//! cheap values; nothing touches the network until a read or write is issued.

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::TokenSource;
use crate::endpoint::join_segments;
use crate::error::{ensure_success, ClientError};

/// Characters Firebase refuses in keys.
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '#', '$', '[', ']'];

#[derive(Clone)]
pub struct DatabaseReference {
    http: reqwest::Client,
    token: Arc<dyn TokenSource>,
    database_url: String,
    segments: Vec<String>,
}

impl DatabaseReference {
    pub fn new(
        http: reqwest::Client,
        token: Arc<dyn TokenSource>,
        database_url: &str,
        path: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            token,
            database_url: database_url.trim_end_matches('/').to_string(),
            segments: parse_path(path)?,
        })
    }

    /// Last path segment; `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Absolute path, `/` for the root.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn child(&self, path: &str) -> Result<Self, ClientError> {
        let mut child = self.clone();
        child.segments.extend(parse_path(path)?);
        Ok(child)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.segments.pop();
        Some(parent)
    }

    pub fn root(&self) -> Self {
        let mut root = self.clone();
        root.segments.clear();
        root
    }

    fn url(&self) -> Result<Url, ClientError> {
        let (leaf, parents) = match self.segments.split_last() {
            Some((leaf, parents)) => (format!("{leaf}.json"), parents),
            None => (".json".to_string(), &[][..]),
        };
        let segments = parents
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(leaf.as_str()));

        join_segments(&self.database_url, segments)
    }

    async fn request(&self, method: Method) -> Result<RequestBuilder, ClientError> {
        let url = self.url()?;
        let token = self.token.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Read the value at this location; `Value::Null` when nothing is stored.
    pub async fn get(&self) -> Result<Value, ClientError> {
        let response = self.request(Method::GET).await?.send().await?;
        ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| ClientError::Decode(format!("realtime value: {err}")))
    }

    /// Replace the value at this location.
    pub async fn set(&self, value: &Value) -> Result<(), ClientError> {
        let response = self.request(Method::PUT).await?.json(value).send().await?;
        ensure_success(response).await?;
        tracing::debug!(path = %self.path(), "realtime value set");
        Ok(())
    }

    /// Merge `values` into the children of this location.
    pub async fn update(&self, values: &Map<String, Value>) -> Result<(), ClientError> {
        let response = self
            .request(Method::PATCH)
            .await?
            .json(values)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Append `value` under a server-generated key and return its reference.
    pub async fn push(&self, value: &Value) -> Result<Self, ClientError> {
        #[derive(Deserialize)]
        struct PushResponse {
            name: String,
        }

        let response = self.request(Method::POST).await?.json(value).send().await?;
        let pushed: PushResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| ClientError::Decode(format!("push response: {err}")))?;

        self.child(&pushed.name)
    }

    pub async fn delete(&self) -> Result<(), ClientError> {
        let response = self.request(Method::DELETE).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

impl fmt::Debug for DatabaseReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseReference")
            .field("database_url", &self.database_url)
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

fn parse_path(path: &str) -> Result<Vec<String>, ClientError> {
    let mut segments = Vec::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment.contains(FORBIDDEN_KEY_CHARS) {
            return Err(ClientError::invalid_path(
                path,
                "keys may not contain '.', '#', '$', '[' or ']'",
            ));
        }
        segments.push(segment.to_string());
    }
    Ok(segments)
}
