//! Upload orchestration: moves file bytes to object storage using the presigned URLs issued
//! by a sync request.
//!
//! Transfers are independent. A failed or un-credentialed file produces a failed
//! [`UploadOutcome`] and never stops the others. Nothing is retried within one invocation;
//! re-running `sync` picks up whatever did not land.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::content_type::content_type_for;
use crate::contract::{ObjectStore, UploadGrant};
use crate::discovery::DiscoveredFile;

/// Result of transferring one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub path: String,
    pub success: bool,
    pub error: Option<String>,
}

impl UploadOutcome {
    fn ok(path: String) -> Self {
        Self {
            path,
            success: true,
            error: None,
        }
    }

    fn failed(path: String, error: impl Into<String>) -> Self {
        Self {
            path,
            success: false,
            error: Some(error.into()),
        }
    }
}

pub struct UploadOrchestrator<'a, S: ObjectStore> {
    store: &'a S,
    concurrency: usize,
}

impl<'a, S: ObjectStore> UploadOrchestrator<'a, S> {
    /// `concurrency` is clamped to at least one transfer.
    pub fn new(store: &'a S, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Transfer `files` using `grants` (one per target path). Outcomes keep the order of `files`.
    pub async fn upload(
        &self,
        site_id: Uuid,
        files: Vec<DiscoveredFile>,
        grants: &[UploadGrant],
    ) -> Vec<UploadOutcome> {
        if files.is_empty() {
            return Vec::new();
        }
        let urls: HashMap<&str, &str> = grants
            .iter()
            .map(|g| (g.path.as_str(), g.url.as_str()))
            .collect();

        info!(
            %site_id,
            files = files.len(),
            concurrency = self.concurrency,
            "Uploading files"
        );

        let outcomes: Vec<UploadOutcome> = stream::iter(files)
            .map(|file| {
                let url = urls.get(file.target_path.as_str()).copied();
                self.transfer(file, url)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| !o.success).count();
        if failed > 0 {
            warn!(%site_id, failed, total = outcomes.len(), "Some uploads failed");
        } else {
            info!(%site_id, total = outcomes.len(), "All uploads succeeded");
        }
        outcomes
    }

    async fn transfer(&self, file: DiscoveredFile, url: Option<&str>) -> UploadOutcome {
        let Some(url) = url else {
            error!(path = %file.target_path, "No upload URL issued for file");
            return UploadOutcome::failed(file.target_path, "no upload URL was issued for this file");
        };
        let content_type = content_type_for(&file.extension);
        let size = file.size_bytes;
        match self.store.put(url, file.content, content_type).await {
            Ok(()) => {
                debug!(path = %file.target_path, size, content_type, "Uploaded");
                UploadOutcome::ok(file.target_path)
            }
            Err(e) => {
                error!(path = %file.target_path, error = ?e, "Upload failed");
                UploadOutcome::failed(file.target_path, e.to_string())
            }
        }
    }
}
