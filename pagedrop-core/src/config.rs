use std::time::Duration;
use tracing::{debug, info};

/// Transfers in flight at once unless configured otherwise.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Tunables for the publish pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    pub upload_concurrency: usize,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            upload_concurrency = self.upload_concurrency,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            poll_timeout_secs = self.poll_timeout.as_secs(),
            "Loaded PublishConfig"
        );
        debug!(?self, "PublishConfig loaded (full debug)");
    }
}
