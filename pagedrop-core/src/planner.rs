//! Sync planning
//!
//! Pure diff between the local file set and the remote catalog. No I/O: the caller fetches
//! the catalog and decides what to do with the plan.

use std::collections::{BTreeMap, BTreeSet};

use crate::contract::{FileManifestEntry, RemoteCatalogEntry, SyncResponse};
use crate::fingerprint::Fingerprint;

/// Four disjoint sets of relative paths, each sorted.
///
/// Every local path is in exactly one of `to_upload`, `to_update`, `unchanged`; every
/// remote path is in exactly one of `to_update`, `unchanged`, `deleted`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Local only.
    pub to_upload: Vec<String>,
    /// In both, fingerprints differ.
    pub to_update: Vec<String>,
    /// In both, fingerprints equal.
    pub unchanged: Vec<String>,
    /// Remote only.
    pub deleted: Vec<String>,
    /// Computed for preview; nothing remote is mutated on its behalf.
    pub dry_run: bool,
}

/// Per-bucket counts of a [`SyncPlan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub to_upload: usize,
    pub to_update: usize,
    pub unchanged: usize,
    pub deleted: usize,
}

impl SyncSummary {
    pub fn transfers(&self) -> usize {
        self.to_upload + self.to_update
    }
}

impl SyncPlan {
    /// Adopt the plan the server returned for a sync request.
    pub fn from_response(response: &SyncResponse, dry_run: bool) -> Self {
        let sorted = |paths: &[String]| {
            let mut paths = paths.to_vec();
            paths.sort();
            paths
        };
        Self {
            to_upload: sorted(&response.to_upload),
            to_update: sorted(&response.to_update),
            unchanged: sorted(&response.unchanged),
            deleted: sorted(&response.deleted),
            dry_run,
        }
    }

    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            to_upload: self.to_upload.len(),
            to_update: self.to_update.len(),
            unchanged: self.unchanged.len(),
            deleted: self.deleted.len(),
        }
    }

    /// Paths whose bytes must be transferred: new and changed files.
    pub fn needs_transfer(&self) -> impl Iterator<Item = &String> {
        self.to_upload.iter().chain(self.to_update.iter())
    }

    /// True when applying the plan would change nothing remotely.
    pub fn is_noop(&self) -> bool {
        self.to_upload.is_empty() && self.to_update.is_empty() && self.deleted.is_empty()
    }

    /// True when two plans place any path in different buckets.
    pub fn drift_from(&self, other: &SyncPlan) -> bool {
        self.to_upload != other.to_upload
            || self.to_update != other.to_update
            || self.unchanged != other.unchanged
            || self.deleted != other.deleted
    }
}

/// Diff `local` against `remote` by relative path and fingerprint.
pub fn plan(
    local: &[FileManifestEntry],
    remote: &[RemoteCatalogEntry],
    dry_run: bool,
) -> SyncPlan {
    let local: BTreeMap<&str, &Fingerprint> =
        local.iter().map(|f| (f.path.as_str(), &f.hash)).collect();
    let remote: BTreeMap<&str, &Fingerprint> =
        remote.iter().map(|f| (f.path.as_str(), &f.hash)).collect();

    let mut out = SyncPlan {
        dry_run,
        ..SyncPlan::default()
    };

    let all_paths: BTreeSet<&str> = local.keys().chain(remote.keys()).copied().collect();
    for path in all_paths {
        let bucket = match (local.get(path), remote.get(path)) {
            (Some(_), None) => &mut out.to_upload,
            (Some(ours), Some(theirs)) if ours != theirs => &mut out.to_update,
            (Some(_), Some(_)) => &mut out.unchanged,
            (None, Some(_)) => &mut out.deleted,
            (None, None) => continue,
        };
        bucket.push(path.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ProcessingStatus;

    fn local(path: &str, hash: &str) -> FileManifestEntry {
        FileManifestEntry {
            path: path.into(),
            hash: Fingerprint::new(hash),
            size: 1,
        }
    }

    fn remote(path: &str, hash: &str) -> RemoteCatalogEntry {
        RemoteCatalogEntry {
            path: path.into(),
            hash: Fingerprint::new(hash),
            size: 1,
            status: ProcessingStatus::Success,
            error: None,
        }
    }

    #[test]
    fn first_publish_uploads_everything() {
        let plan = plan(&[local("b.md", "2"), local("a.md", "1")], &[], false);
        assert_eq!(plan.to_upload, vec!["a.md", "b.md"]);
        assert!(plan.to_update.is_empty() && plan.unchanged.is_empty() && plan.deleted.is_empty());
    }

    #[test]
    fn changed_and_new_files_are_separated() {
        let plan = plan(
            &[local("a.md", "Y"), local("b.md", "Z")],
            &[remote("a.md", "X")],
            false,
        );
        assert_eq!(plan.to_update, vec!["a.md"]);
        assert_eq!(plan.to_upload, vec!["b.md"]);
        assert!(plan.unchanged.is_empty());
        assert!(plan.deleted.is_empty());
    }

    #[test]
    fn remote_only_paths_are_deleted_and_matches_unchanged() {
        let plan = plan(
            &[local("keep.md", "k")],
            &[remote("keep.md", "k"), remote("gone.png", "g")],
            true,
        );
        assert_eq!(plan.unchanged, vec!["keep.md"]);
        assert_eq!(plan.deleted, vec!["gone.png"]);
        assert!(plan.dry_run);
        assert!(!plan.is_noop());
    }

    #[test]
    fn summary_counts_buckets() {
        let plan = plan(
            &[local("a", "1"), local("b", "2"), local("c", "3")],
            &[remote("b", "2"), remote("c", "x"), remote("d", "4")],
            false,
        );
        let summary = plan.summary();
        assert_eq!(
            summary,
            SyncSummary {
                to_upload: 1,
                to_update: 1,
                unchanged: 1,
                deleted: 1
            }
        );
        assert_eq!(summary.transfers(), 2);
        assert_eq!(plan.needs_transfer().cloned().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn server_plan_is_sorted_and_compared() {
        let response = SyncResponse {
            to_upload: vec!["z.md".into(), "a.md".into()],
            ..SyncResponse::default()
        };
        let server = SyncPlan::from_response(&response, false);
        assert_eq!(server.to_upload, vec!["a.md", "z.md"]);

        let ours = plan(&[local("a.md", "1"), local("z.md", "2")], &[], false);
        assert!(!ours.drift_from(&server));
        let other = plan(&[local("a.md", "1")], &[], false);
        assert!(other.drift_from(&server));
    }
}
