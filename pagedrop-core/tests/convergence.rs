mod common;

use common::{entry, snapshot, FakeClock};
use pagedrop_core::contract::{MockRemoteApi, ProcessingStatus};
use pagedrop_core::convergence::ConvergencePoller;
use pagedrop_core::RemoteError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SECOND: Duration = Duration::from_secs(1);

#[tokio::test]
async fn converges_once_all_pending_files_succeed() {
    let site_id = Uuid::new_v4();
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = ticks.clone();

    let mut remote = MockRemoteApi::new();
    remote.expect_site_status().returning(move |id| {
        let tick = counter.fetch_add(1, Ordering::SeqCst);
        let status = if tick < 3 {
            ProcessingStatus::Pending
        } else {
            ProcessingStatus::Success
        };
        Ok(snapshot(
            id,
            vec![
                entry("README.md", "a", status),
                entry("guide/index.md", "b", status),
                entry("logo.png", "c", ProcessingStatus::Success),
            ],
        ))
    });

    let clock = FakeClock::default();
    let report = ConvergencePoller::new(&remote, &clock, SECOND, Duration::from_secs(10))
        .wait(site_id)
        .await
        .unwrap();

    assert!(report.success);
    assert!(!report.timed_out);
    assert!(report.errors.is_empty());
    assert_eq!(report.polls, 4);
    assert_eq!(clock.sleeps(), 3);
    assert_eq!(clock.elapsed(), Duration::from_secs(3));
}

#[tokio::test]
async fn times_out_with_the_full_pending_set() {
    let mut remote = MockRemoteApi::new();
    remote.expect_site_status().returning(|id| {
        Ok(snapshot(
            id,
            vec![
                entry("a.md", "1", ProcessingStatus::Pending),
                entry("b.mdx", "2", ProcessingStatus::Pending),
                entry("c.md", "3", ProcessingStatus::Success),
            ],
        ))
    });

    let clock = FakeClock::default();
    let report = ConvergencePoller::new(&remote, &clock, SECOND, Duration::from_secs(5))
        .wait(Uuid::new_v4())
        .await
        .unwrap();

    assert!(report.timed_out);
    assert!(!report.success);
    assert_eq!(report.pending, vec!["a.md", "b.mdx"]);
    assert_eq!(report.polls, 6);
    assert_eq!(clock.elapsed(), Duration::from_secs(5));
}

#[tokio::test]
async fn timeout_keeps_errors_seen_while_waiting() {
    let mut remote = MockRemoteApi::new();
    remote.expect_site_status().returning(|id| {
        let mut bad = entry("bad.md", "1", ProcessingStatus::Error);
        bad.error = Some("unterminated code fence".into());
        Ok(snapshot(
            id,
            vec![bad, entry("slow.md", "2", ProcessingStatus::Pending)],
        ))
    });

    let clock = FakeClock::default();
    let report = ConvergencePoller::new(&remote, &clock, SECOND, Duration::from_secs(3))
        .wait(Uuid::new_v4())
        .await
        .unwrap();

    assert!(report.timed_out);
    assert!(!report.success);
    assert_eq!(report.pending, vec!["slow.md"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, "bad.md");
    assert_eq!(report.errors[0].detail, "unterminated code fence");
}

#[tokio::test]
async fn only_tracked_paths_hold_the_wait() {
    let mut remote = MockRemoteApi::new();
    remote.expect_site_status().times(1).returning(|id| {
        Ok(snapshot(
            id,
            vec![
                entry("fresh.md", "1", ProcessingStatus::Success),
                entry("stuck.md", "2", ProcessingStatus::Pending),
            ],
        ))
    });

    let clock = FakeClock::default();
    let report = ConvergencePoller::new(&remote, &clock, SECOND, Duration::from_secs(30))
        .tracking(vec!["fresh.md".to_string()])
        .wait(Uuid::new_v4())
        .await
        .unwrap();

    assert!(report.success);
    assert!(report.pending.is_empty());
    assert_eq!(clock.sleeps(), 0);
}

#[tokio::test]
async fn zero_content_files_converge_immediately() {
    let mut remote = MockRemoteApi::new();
    remote
        .expect_site_status()
        .times(1)
        .returning(|id| Ok(snapshot(id, vec![entry("photo.jpg", "p", ProcessingStatus::Success)])));

    let clock = FakeClock::default();
    let report = ConvergencePoller::new(&remote, &clock, SECOND, Duration::from_secs(30))
        .wait(Uuid::new_v4())
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.polls, 1);
    assert_eq!(clock.sleeps(), 0);
}

#[tokio::test]
async fn terminal_errors_are_reported_as_partial_failure() {
    let mut remote = MockRemoteApi::new();
    remote.expect_site_status().times(1).returning(|id| {
        let mut broken = entry("broken.md", "x", ProcessingStatus::Error);
        broken.error = Some("unterminated code fence".into());
        Ok(snapshot(
            id,
            vec![entry("fine.md", "y", ProcessingStatus::Success), broken],
        ))
    });

    let clock = FakeClock::default();
    let report = ConvergencePoller::new(&remote, &clock, SECOND, Duration::from_secs(30))
        .wait(Uuid::new_v4())
        .await
        .unwrap();

    assert!(!report.success);
    assert!(!report.timed_out);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, "broken.md");
    assert_eq!(report.errors[0].detail, "unterminated code fence");
}

#[tokio::test]
async fn jump_straight_to_terminal_between_polls_is_tolerated() {
    // First snapshot: everything pending. Second: a mix of success and error, no pending
    // tick in between for the errored file.
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = ticks.clone();
    let mut remote = MockRemoteApi::new();
    remote.expect_site_status().returning(move |id| {
        let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
        let (a, b) = if first {
            (ProcessingStatus::Pending, ProcessingStatus::Pending)
        } else {
            (ProcessingStatus::Success, ProcessingStatus::Error)
        };
        Ok(snapshot(id, vec![entry("a.md", "1", a), entry("b.md", "2", b)]))
    });

    let clock = FakeClock::default();
    let report = ConvergencePoller::new(&remote, &clock, SECOND, Duration::from_secs(30))
        .wait(Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(ticks.load(Ordering::SeqCst), 2);
    assert!(!report.success);
    assert_eq!(report.errors[0].path, "b.md");
}

#[tokio::test]
async fn remote_failure_aborts_the_wait() {
    let mut remote = MockRemoteApi::new();
    remote.expect_site_status().times(1).returning(|_| {
        Err(RemoteError::Status {
            status: 503,
            message: "Service Unavailable".into(),
        })
    });

    let clock = FakeClock::default();
    let err = ConvergencePoller::new(&remote, &clock, SECOND, Duration::from_secs(30))
        .wait(Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("503"));
}
