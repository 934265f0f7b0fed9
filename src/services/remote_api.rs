//! HTTP client for the Shelfmark persistence service.
//!
//! Speaks the JSON REST contract under a configurable base URL
//! (`http://localhost:3000/api` by default).

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::services::backend::PersistenceBackend;
use crate::types::bookmark::{Bookmark, Category};
use crate::types::errors::PersistError;
use crate::types::snapshot::{Snapshot, StoredState};

/// Characters left unescaped in path ids, matching `encodeURIComponent`.
const PATH_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `PersistenceBackend` over HTTP.
pub struct RemoteApi {
    base_url: String,
    client: Client,
}

impl RemoteApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<reqwest::Response, PersistError> {
        debug!(%method, path, "persistence request");
        let response = builder.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "persistence service unreachable");
            PersistError::Unavailable(e.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!(%method, path, status = status.as_u16(), "persistence request rejected");
            return Err(PersistError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PersistError> {
        let response = self.send(Method::GET, path, self.request(Method::GET, path)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PersistError::Serialization(e.to_string()))
    }

    async fn send_json<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Result<(), PersistError> {
        let builder = self.request(method.clone(), path).json(body);
        self.send(method, path, builder).await.map(|_| ())
    }

    async fn delete(&self, path: &str) -> Result<(), PersistError> {
        self.send(Method::DELETE, path, self.request(Method::DELETE, path))
            .await
            .map(|_| ())
    }
}

/// `/<collection>/<percent-encoded id>`
pub fn item_path(collection: &str, id: &str) -> String {
    format!("/{}/{}", collection, utf8_percent_encode(id, PATH_ID))
}

#[async_trait]
impl PersistenceBackend for RemoteApi {
    fn name(&self) -> &str {
        "remote"
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, PersistError> {
        self.get_json("/categories").await
    }

    async fn fetch_bookmarks(&self) -> Result<Vec<Bookmark>, PersistError> {
        self.get_json("/bookmarks").await
    }

    async fn create_bookmark(&self, bookmark: &Bookmark) -> Result<(), PersistError> {
        self.send_json(Method::POST, "/bookmarks", bookmark).await
    }

    async fn update_bookmark(&self, bookmark: &Bookmark) -> Result<(), PersistError> {
        self.send_json(Method::PUT, &item_path("bookmarks", &bookmark.id), bookmark)
            .await
    }

    async fn delete_bookmark(&self, id: &str) -> Result<(), PersistError> {
        self.delete(&item_path("bookmarks", id)).await
    }

    async fn create_category(&self, category: &Category) -> Result<(), PersistError> {
        self.send_json(Method::POST, "/categories", category).await
    }

    async fn update_category(&self, category: &Category) -> Result<(), PersistError> {
        self.send_json(Method::PUT, &item_path("categories", &category.id), category)
            .await
    }

    async fn delete_category(&self, id: &str) -> Result<(), PersistError> {
        self.delete(&item_path("categories", id)).await
    }

    async fn save_snapshot(&self, state: &StoredState) -> Result<(), PersistError> {
        self.send_json(Method::POST, "/snapshot", state).await
    }

    async fn import(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        self.send_json(Method::POST, "/import", snapshot).await
    }
}
