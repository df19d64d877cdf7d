//! High-level pipeline: discover → plan → upload → wait, against injected collaborators.
//!
//! This module sequences the components for each user-facing operation:
//!   - [`Publisher::publish`] creates (or, with `overwrite`, recreates) the site named after the
//!     first input and uploads everything.
//!   - [`Publisher::sync`] updates an existing site, transferring only new and changed files and
//!     letting the server drop files that no longer exist locally.
//!   - [`Publisher::delete`], [`Publisher::list`], [`Publisher::status`] are thin lookups.
//!
//! # Error Handling
//! Conditions that invalidate the whole operation (bad input path, missing auth, site
//! conflict, remote transport failure) abort with a [`PublishError`]. Per-file transfer
//! failures, processing errors and convergence timeouts never abort; they are collected into
//! the [`PublishReport`]. Only files whose transfer succeeded are waited on.
//!
//! # Dry runs
//! With `dry_run` nothing is created, uploaded or deleted. A publish dry run plans locally
//! against an empty catalog, since the site may not exist yet. A sync dry run submits the
//! manifest with `dryRun: true` and reports the server's plan.

use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::PublishConfig;
use crate::contract::{
    Clock, DeleteReceipt, FileManifestEntry, Identity, ObjectStore, RemoteApi, RemoteCatalogEntry,
    Site, SiteStatus, SyncRequest, SyncResponse,
};
use crate::convergence::{ConvergencePoller, ConvergenceReport};
use crate::discovery::{discover, Discovery};
use crate::error::{PublishError, PublishResult, RemoteError};
use crate::planner::{plan, SyncPlan};
use crate::upload::{UploadOrchestrator, UploadOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Replace an existing site of the same name.
    pub overwrite: bool,
    pub dry_run: bool,
    /// Wait for remote processing to converge after uploading.
    pub wait: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub wait: bool,
}

/// Everything a publish or sync did, for rendering.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub project_name: String,
    /// `None` only for a dry-run publish of a site that does not exist yet.
    pub site: Option<Site>,
    pub plan: SyncPlan,
    pub uploads: Vec<UploadOutcome>,
    /// `None` when the run was a dry run, transferred nothing, or did not wait.
    pub convergence: Option<ConvergenceReport>,
    /// False when no markdown file was discovered.
    pub has_content: bool,
}

impl PublishReport {
    pub fn failed_uploads(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.uploads.iter().filter(|u| !u.success)
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploads.iter().filter(|u| u.success).count()
    }

    /// Every upload landed and processing (if awaited) finished without errors.
    pub fn is_clean(&self) -> bool {
        self.failed_uploads().next().is_none()
            && self
                .convergence
                .as_ref()
                .map_or(true, |c| c.success && !c.timed_out)
    }
}

pub struct Publisher<'a, R: RemoteApi, S: ObjectStore, C: Clock> {
    remote: &'a R,
    store: &'a S,
    clock: &'a C,
    config: PublishConfig,
}

impl<'a, R: RemoteApi, S: ObjectStore, C: Clock> Publisher<'a, R, S, C> {
    pub fn new(remote: &'a R, store: &'a S, clock: &'a C, config: PublishConfig) -> Self {
        Self {
            remote,
            store,
            clock,
            config,
        }
    }

    /// The authenticated user; fails the command when the remote rejects the credentials.
    pub async fn whoami(&self) -> PublishResult<Identity> {
        match self.remote.whoami().await {
            Ok(identity) => {
                info!(user = %identity.username, "Authenticated");
                Ok(identity)
            }
            Err(RemoteError::Unauthorized(msg)) => {
                error!(error = %msg, "Authentication rejected");
                Err(PublishError::Unauthenticated(msg))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Publish `inputs` as a new site named after the first input.
    pub async fn publish<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        options: PublishOptions,
    ) -> PublishResult<PublishReport> {
        info!(inputs = inputs.len(), ?options, "[PUBLISH] Starting");
        let discovery = discover(inputs)?;
        self.whoami().await?;

        let name = discovery.project_identity.clone();
        let existing = self.remote.get_site_by_name(&name).await?;
        if existing.is_some() && !options.overwrite {
            error!(project = %name, "[PUBLISH] Site already exists");
            return Err(PublishError::SiteConflict { name });
        }

        if options.dry_run {
            // A publish always lands on an empty site (new, or recreated by overwrite).
            let plan = plan(&discovery.manifest(), &[], true);
            info!(project = %name, summary = ?plan.summary(), "[PUBLISH] Dry run complete");
            return Ok(PublishReport {
                project_name: name,
                site: existing,
                plan,
                uploads: Vec::new(),
                convergence: None,
                has_content: discovery.has_content(),
            });
        }

        let site = match self.remote.create_site(&name, options.overwrite).await {
            Ok(site) => site,
            Err(RemoteError::Conflict(msg)) => {
                error!(project = %name, error = %msg, "[PUBLISH] Site creation conflicted");
                return Err(PublishError::SiteConflict { name });
            }
            Err(e) => return Err(e.into()),
        };
        info!(site_id = %site.id, url = %site.url, "[PUBLISH] Site ready");

        self.apply(site, discovery, &[], options.wait).await
    }

    /// Bring an existing site in line with `inputs`.
    pub async fn sync<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        options: SyncOptions,
    ) -> PublishResult<PublishReport> {
        info!(inputs = inputs.len(), ?options, "[SYNC] Starting");
        let discovery = discover(inputs)?;
        self.whoami().await?;

        let site = self.find_site(&discovery.project_identity).await?;
        let catalog = self.remote.site_status(site.id).await?.files;

        if options.dry_run {
            let (_, plan) = self
                .submit(&site, discovery.manifest(), &catalog, true)
                .await?;
            info!(site_id = %site.id, summary = ?plan.summary(), "[SYNC] Dry run complete");
            return Ok(PublishReport {
                project_name: discovery.project_identity.clone(),
                site: Some(site),
                plan,
                uploads: Vec::new(),
                convergence: None,
                has_content: discovery.has_content(),
            });
        }

        self.apply(site, discovery, &catalog, options.wait).await
    }

    pub async fn delete(&self, project_name: &str) -> PublishResult<(Site, DeleteReceipt)> {
        self.whoami().await?;
        let site = self.find_site(project_name).await?;
        let receipt = self.remote.delete_site(site.id).await?;
        info!(site_id = %site.id, deleted_files = receipt.deleted_files, "Deleted site");
        Ok((site, receipt))
    }

    pub async fn list(&self) -> PublishResult<Vec<Site>> {
        self.whoami().await?;
        let sites = self.remote.list_sites().await?;
        info!(count = sites.len(), "Listed sites");
        Ok(sites)
    }

    pub async fn status(&self, project_name: &str) -> PublishResult<(Site, SiteStatus)> {
        self.whoami().await?;
        let site = self.find_site(project_name).await?;
        let status = self.remote.site_status(site.id).await?;
        Ok((site, status))
    }

    async fn find_site(&self, project_name: &str) -> PublishResult<Site> {
        self.remote
            .get_site_by_name(project_name)
            .await?
            .ok_or_else(|| PublishError::SiteNotFound {
                name: project_name.to_string(),
            })
    }

    /// Plan locally against `catalog`, then submit the manifest and adopt the server's plan.
    async fn submit(
        &self,
        site: &Site,
        manifest: Vec<FileManifestEntry>,
        catalog: &[RemoteCatalogEntry],
        dry_run: bool,
    ) -> PublishResult<(SyncResponse, SyncPlan)> {
        let local_plan = plan(&manifest, catalog, dry_run);
        info!(site_id = %site.id, dry_run, summary = ?local_plan.summary(), "Computed sync plan");

        let request = SyncRequest {
            files: manifest,
            dry_run,
        };
        let response = self.remote.submit_sync(site.id, &request).await?;
        let server_plan = SyncPlan::from_response(&response, dry_run);
        if server_plan.drift_from(&local_plan) {
            warn!(
                site_id = %site.id,
                local = ?local_plan.summary(),
                server = ?server_plan.summary(),
                "Server plan differs from local plan; following the server"
            );
        }
        Ok((response, server_plan))
    }

    /// Submit the sync, upload what needs transfer and optionally wait for the files that
    /// made it.
    async fn apply(
        &self,
        site: Site,
        discovery: Discovery,
        catalog: &[RemoteCatalogEntry],
        wait: bool,
    ) -> PublishResult<PublishReport> {
        let has_content = discovery.has_content();
        let (response, server_plan) = self
            .submit(&site, discovery.manifest(), catalog, false)
            .await?;

        let to_transfer: Vec<_> = {
            let wanted: HashSet<&String> = server_plan.needs_transfer().collect();
            discovery
                .files
                .into_iter()
                .filter(|f| wanted.contains(&f.target_path))
                .collect()
        };

        let uploads = UploadOrchestrator::new(self.store, self.config.upload_concurrency)
            .upload(site.id, to_transfer, &response.upload_urls)
            .await;

        // A failed transfer never reaches the processor, so it would stay pending forever.
        let delivered: Vec<String> = uploads
            .iter()
            .filter(|u| u.success)
            .map(|u| u.path.clone())
            .collect();

        let convergence = if wait && !delivered.is_empty() {
            let poller = ConvergencePoller::from_config(self.remote, self.clock, &self.config)
                .tracking(delivered);
            Some(poller.wait(site.id).await?)
        } else {
            if wait && !uploads.is_empty() {
                warn!(site_id = %site.id, "No file was uploaded; skipping the processing wait");
            }
            None
        };

        Ok(PublishReport {
            project_name: discovery.project_identity,
            site: Some(site),
            plan: server_plan,
            uploads,
            convergence,
            has_content,
        })
    }
}
