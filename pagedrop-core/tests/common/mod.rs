#![allow(dead_code)]

use async_trait::async_trait;
use pagedrop_core::contract::{Clock, ProcessingStatus, RemoteCatalogEntry, Site, SiteStatus};
use pagedrop_core::fingerprint::Fingerprint;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Clock that only moves when slept on, so polling tests run without wall-clock delay.
#[derive(Default)]
pub struct FakeClock {
    now_ms: AtomicU64,
    sleeps: AtomicU64,
}

impl FakeClock {
    pub fn sleeps(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.now_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

pub fn site(name: &str) -> Site {
    Site {
        id: Uuid::new_v4(),
        project_name: name.to_string(),
        url: format!("https://{name}.pagedrop.test"),
        owner: Some("ada".into()),
        file_count: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn entry(path: &str, hash: &str, status: ProcessingStatus) -> RemoteCatalogEntry {
    RemoteCatalogEntry {
        path: path.to_string(),
        hash: Fingerprint::new(hash),
        size: 1,
        status,
        error: None,
    }
}

pub fn snapshot(site_id: Uuid, files: Vec<RemoteCatalogEntry>) -> SiteStatus {
    SiteStatus { site_id, files }
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
