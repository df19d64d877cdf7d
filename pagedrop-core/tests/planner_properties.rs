//! Property tests for the sync planner's partition guarantees.

use pagedrop_core::contract::{FileManifestEntry, ProcessingStatus, RemoteCatalogEntry};
use pagedrop_core::fingerprint::Fingerprint;
use pagedrop_core::planner::plan;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn fingerprint_maps() -> impl Strategy<Value = (BTreeMap<String, u8>, BTreeMap<String, u8>)> {
    let path = "[a-e]{1,2}(/[a-e]{1,2})?\\.md";
    (
        prop::collection::btree_map(path, 0u8..3, 0..12),
        prop::collection::btree_map(path, 0u8..3, 0..12),
    )
}

fn to_local(map: &BTreeMap<String, u8>) -> Vec<FileManifestEntry> {
    map.iter()
        .map(|(path, hash)| FileManifestEntry {
            path: path.clone(),
            hash: Fingerprint::new(hash.to_string()),
            size: 1,
        })
        .collect()
}

fn to_remote(map: &BTreeMap<String, u8>) -> Vec<RemoteCatalogEntry> {
    map.iter()
        .map(|(path, hash)| RemoteCatalogEntry {
            path: path.clone(),
            hash: Fingerprint::new(hash.to_string()),
            size: 1,
            status: ProcessingStatus::Success,
            error: None,
        })
        .collect()
}

proptest! {
    #[test]
    fn buckets_partition_the_union_of_paths((local, remote) in fingerprint_maps()) {
        let result = plan(&to_local(&local), &to_remote(&remote), false);

        let mut seen = BTreeSet::new();
        for path in result
            .to_upload
            .iter()
            .chain(&result.to_update)
            .chain(&result.unchanged)
            .chain(&result.deleted)
        {
            prop_assert!(seen.insert(path.clone()), "path {} appears twice", path);
        }
        let union: BTreeSet<String> = local.keys().chain(remote.keys()).cloned().collect();
        prop_assert_eq!(&seen, &union);

        for path in &result.to_upload {
            prop_assert!(local.contains_key(path) && !remote.contains_key(path));
        }
        for path in &result.to_update {
            prop_assert_ne!(local[path], remote[path]);
        }
        for path in &result.unchanged {
            prop_assert_eq!(local[path], remote[path]);
        }
        for path in &result.deleted {
            prop_assert!(!local.contains_key(path) && remote.contains_key(path));
        }
    }

    #[test]
    fn planning_is_idempotent((local, remote) in fingerprint_maps()) {
        let local = to_local(&local);
        let remote = to_remote(&remote);
        prop_assert_eq!(plan(&local, &remote, true), plan(&local, &remote, true));
    }

    #[test]
    fn local_order_does_not_change_the_plan((local, remote) in fingerprint_maps()) {
        let forward = to_local(&local);
        let mut reversed = forward.clone();
        reversed.reverse();
        let remote = to_remote(&remote);
        prop_assert_eq!(plan(&forward, &remote, false), plan(&reversed, &remote, false));
    }
}

#[test]
fn overwrite_scenario_updates_changed_and_uploads_new() {
    let local = vec![
        FileManifestEntry {
            path: "a.md".into(),
            hash: Fingerprint::new("Y"),
            size: 3,
        },
        FileManifestEntry {
            path: "b.md".into(),
            hash: Fingerprint::new("B"),
            size: 3,
        },
    ];
    let remote = vec![RemoteCatalogEntry {
        path: "a.md".into(),
        hash: Fingerprint::new("X"),
        size: 3,
        status: ProcessingStatus::Success,
        error: None,
    }];

    let result = plan(&local, &remote, false);

    assert_eq!(result.to_update, vec!["a.md"]);
    assert_eq!(result.to_upload, vec!["b.md"]);
    assert!(result.deleted.is_empty());
    assert!(result.unchanged.is_empty());
}
