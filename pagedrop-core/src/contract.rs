//! # contract: interfaces to the collaborators pagedrop drives
//!
//! This module defines the traits the pipeline consumes and the plain data types that cross
//! them:
//!
//! - [`RemoteApi`]: the pagedrop API service (sites, sync requests, processing status).
//! - [`ObjectStore`]: direct writes to object storage using a presigned URL.
//! - [`Clock`]: time source and cooperative sleep for the convergence poller.
//!
//! Concrete HTTP implementations live in the `pagedrop` binary crate. The remote traits are
//! annotated for `mockall` (exported behind the default `test-export-mocks` feature) so
//! dependents can build deterministic mocks for their own tests.
//!
//! All remote types serialise as camelCase JSON.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{RemoteError, TransferError};
use crate::fingerprint::Fingerprint;

/// The authenticated user, as reported by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A remote site: a named collection of published files with a public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub project_name: String,
    pub url: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub file_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Remote asynchronous processing state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Pending,
    Success,
    Error,
}

impl ProcessingStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessingStatus::Pending)
    }
}

/// One previously-published file as known to the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCatalogEntry {
    pub path: String,
    pub hash: Fingerprint,
    pub size: u64,
    pub status: ProcessingStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// Local fingerprint of one file, as submitted in a sync request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileManifestEntry {
    pub path: String,
    pub hash: Fingerprint,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub files: Vec<FileManifestEntry>,
    pub dry_run: bool,
}

/// Short-lived, single-use write credential for one target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrant {
    pub path: String,
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// The server's view of a sync, including credentials for every file needing transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    #[serde(default)]
    pub to_upload: Vec<String>,
    #[serde(default)]
    pub to_update: Vec<String>,
    #[serde(default)]
    pub unchanged: Vec<String>,
    #[serde(default)]
    pub deleted: Vec<String>,
    #[serde(default)]
    pub upload_urls: Vec<UploadGrant>,
}

/// Full processing-status snapshot of a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub site_id: Uuid,
    #[serde(default)]
    pub files: Vec<RemoteCatalogEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub success: usize,
    pub error: usize,
}

impl SiteStatus {
    pub fn counts(&self) -> StatusCounts {
        self.files
            .iter()
            .fold(StatusCounts::default(), |mut counts, entry| {
                counts.total += 1;
                match entry.status {
                    ProcessingStatus::Pending => counts.pending += 1,
                    ProcessingStatus::Success => counts.success += 1,
                    ProcessingStatus::Error => counts.error += 1,
                }
                counts
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReceipt {
    #[serde(default)]
    pub deleted_files: u64,
}

/// Operations pagedrop needs from the remote API service.
///
/// Implementations attach authorization to every request. `get_site_by_name` maps a
/// missing site to `Ok(None)`; `create_site` maps a name clash to [`RemoteError::Conflict`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// The currently authenticated user.
    async fn whoami(&self) -> Result<Identity, RemoteError>;

    /// Create a site for `project_name`. With `overwrite`, an existing site of that name is
    /// deleted and recreated by the server.
    async fn create_site(&self, project_name: &str, overwrite: bool)
        -> Result<Site, RemoteError>;

    async fn get_site_by_name(&self, project_name: &str) -> Result<Option<Site>, RemoteError>;

    async fn list_sites(&self) -> Result<Vec<Site>, RemoteError>;

    /// Submit local fingerprints. Unless `dry_run`, the server records new and changed files
    /// as pending, removes files absent locally, and returns upload URLs.
    async fn submit_sync(
        &self,
        site_id: Uuid,
        request: &SyncRequest,
    ) -> Result<SyncResponse, RemoteError>;

    async fn site_status(&self, site_id: Uuid) -> Result<SiteStatus, RemoteError>;

    async fn delete_site(&self, site_id: Uuid) -> Result<DeleteReceipt, RemoteError>;
}

/// Direct write to object storage through a presigned URL. No retry contract.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, url: &str, body: Vec<u8>, content_type: &str)
        -> Result<(), TransferError>;
}

/// Monotonic time source with a cooperative sleep.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by the tokio timer.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
