//! Convergence polling: waits for the remote processor to finish every content file of a site.
//!
//! Each tick fetches the full status snapshot (level-triggered), so a file that reached a
//! terminal state between two polls is handled like any other. Only markdown-class entries
//! are tracked, optionally narrowed to the paths given to [`ConvergencePoller::tracking`];
//! other files are stored as already successful.

use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PublishConfig;
use crate::content_type::is_content_path;
use crate::contract::{Clock, ProcessingStatus, RemoteApi, SiteStatus};
use crate::error::PublishResult;

/// A content file the remote processor rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingFailure {
    pub path: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvergenceReport {
    /// Every tracked file finished with `SUCCESS`.
    pub success: bool,
    /// The deadline passed with files still pending.
    pub timed_out: bool,
    pub errors: Vec<ProcessingFailure>,
    /// Still `PENDING` when polling stopped; empty unless `timed_out`.
    pub pending: Vec<String>,
    /// Number of status snapshots fetched.
    pub polls: u32,
}

/// Where a snapshot leaves the wait. Errors already seen are kept while waiting so a
/// timeout still reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollState {
    Waiting {
        pending: Vec<String>,
        errors: Vec<ProcessingFailure>,
    },
    Converged {
        errors: Vec<ProcessingFailure>,
    },
}

fn evaluate(status: &SiteStatus, tracked: Option<&HashSet<String>>) -> PollState {
    let mut pending = Vec::new();
    let mut errors = Vec::new();
    let watched = status.files.iter().filter(|f| {
        is_content_path(&f.path) && tracked.map_or(true, |paths| paths.contains(&f.path))
    });
    for entry in watched {
        match entry.status {
            ProcessingStatus::Pending => pending.push(entry.path.clone()),
            ProcessingStatus::Error => errors.push(ProcessingFailure {
                path: entry.path.clone(),
                detail: entry
                    .error
                    .clone()
                    .unwrap_or_else(|| "processing failed".to_string()),
            }),
            ProcessingStatus::Success => {}
        }
    }
    if pending.is_empty() {
        PollState::Converged { errors }
    } else {
        PollState::Waiting { pending, errors }
    }
}

pub struct ConvergencePoller<'a, R: RemoteApi, C: Clock> {
    remote: &'a R,
    clock: &'a C,
    interval: Duration,
    deadline: Duration,
    tracked: Option<HashSet<String>>,
}

impl<'a, R: RemoteApi, C: Clock> ConvergencePoller<'a, R, C> {
    pub fn new(remote: &'a R, clock: &'a C, interval: Duration, deadline: Duration) -> Self {
        Self {
            remote,
            clock,
            interval,
            deadline,
            tracked: None,
        }
    }

    pub fn from_config(remote: &'a R, clock: &'a C, config: &PublishConfig) -> Self {
        Self::new(remote, clock, config.poll_interval, config.poll_timeout)
    }

    /// Only wait on these paths; other entries of the site are ignored. Without this, every
    /// content file of the site is tracked.
    pub fn tracking<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.tracked = Some(paths.into_iter().collect());
        self
    }

    /// Poll until no tracked content file is pending or the deadline elapses.
    ///
    /// A remote error while polling aborts the wait.
    pub async fn wait(&self, site_id: Uuid) -> PublishResult<ConvergenceReport> {
        let started = self.clock.now();
        let mut polls = 0u32;

        loop {
            let status = self.remote.site_status(site_id).await?;
            polls += 1;

            match evaluate(&status, self.tracked.as_ref()) {
                PollState::Converged { errors } => {
                    if errors.is_empty() {
                        info!(%site_id, polls, "All content files processed");
                    } else {
                        warn!(%site_id, polls, errors = errors.len(), "Processing finished with errors");
                    }
                    return Ok(ConvergenceReport {
                        success: errors.is_empty(),
                        timed_out: false,
                        errors,
                        pending: Vec::new(),
                        polls,
                    });
                }
                PollState::Waiting { pending, errors } => {
                    let elapsed = self.clock.now().saturating_sub(started);
                    if elapsed >= self.deadline {
                        warn!(
                            %site_id,
                            pending = pending.len(),
                            errors = errors.len(),
                            elapsed_secs = elapsed.as_secs(),
                            "Timed out waiting for processing"
                        );
                        return Ok(ConvergenceReport {
                            success: false,
                            timed_out: true,
                            errors,
                            pending,
                            polls,
                        });
                    }
                    debug!(%site_id, pending = pending.len(), "Waiting for processing");
                    let remaining = self.deadline - elapsed;
                    self.clock.sleep(self.interval.min(remaining)).await;
                }
            }
        }
    }
}
