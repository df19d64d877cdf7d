//! Direct PUTs to object storage through presigned URLs.
//!
//! The URL already carries its authorization, so no bearer token is attached.

use async_trait::async_trait;
use pagedrop_core::contract::ObjectStore;
use pagedrop_core::TransferError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, error};

#[derive(Debug, Clone, Default)]
pub struct HttpObjectStore {
    http: Client,
}

impl HttpObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, url: &str, body: Vec<u8>, content_type: &str) -> Result<(), TransferError> {
        let size = body.len();
        let response = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Object store request failed");
                TransferError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), size, content_type, "Object stored");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransferError::Status {
            status: status.as_u16(),
            body: if body.trim().is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                body
            },
        })
    }
}
