//! Stop request specs
//!
//! A stop is requested by firing the namespace sentinel from outside the
//! running suite. Jobs stop cooperatively.

use crate::prelude::*;
use jt_core::{EventListener, SuiteEvent};

/// Records whether every JOB_STOPPED event carried a raised stop flag.
#[derive(Default)]
struct StopFlagCheck {
    inner: RecordingListener,
    flag_missing: parking_lot::Mutex<Vec<String>>,
}

impl EventListener for StopFlagCheck {
    fn on_event(&self, event: &SuiteEvent) {
        if event.kind == EventKind::JobStopped {
            if let Some(status) = &event.status {
                if !status.stop_requested {
                    self.flag_missing.lock().push(status.job_id.to_string());
                }
            }
        }
        self.inner.on_event(event);
    }
}

#[tokio::test]
async fn firing_the_sentinel_stops_a_running_suite() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let job = StepJob::endless("crawl");
    let suite = Arc::new(ws.suite("nightly", job.node(), &listener));
    let store = ws.store("nightly");

    let run = tokio::spawn({
        let suite = Arc::clone(&suite);
        async move { suite.run().await }
    });
    let running = wait_for(SPEC_WAIT_MAX_MS, || {
        store.read("crawl").map(|s| s.state == JobState::Running).unwrap_or(false)
    })
    .await;
    assert!(running, "job should start");

    // Separate control path: same state dir and namespace, no shared handle
    let control = StopSignal::new(ws.path(), "nightly");
    control.fire().unwrap();
    control.fire().unwrap();

    assert_eq!(run.await.unwrap().unwrap(), Outcome::Stopped);
    assert!(!control.exists(), "sentinel should be consumed");
    assert_eq!(job.stops(), 1);

    let kinds = listener.kinds();
    let stopped_at = kinds.iter().position(|k| *k == EventKind::JobStopped).unwrap();
    let suite_stopped_at = kinds.iter().position(|k| *k == EventKind::SuiteStopped).unwrap();
    let stopping_at = kinds.iter().position(|k| *k == EventKind::SuiteStopping).unwrap();
    assert!(stopping_at < stopped_at && stopped_at < suite_stopped_at, "{kinds:?}");
    assert_eq!(listener.count(EventKind::JobStopped), 1);
    assert_eq!(listener.count(EventKind::SuiteCompleted), 0);

    let status = store.read("crawl").unwrap();
    assert_eq!(status.state, JobState::Stopped);
    assert!(status.stop_requested);
}

#[tokio::test]
async fn stop_reaches_every_job_in_the_tree() {
    let ws = Workspace::new();
    let check = Arc::new(StopFlagCheck::default());
    let (a, b, c) = (StepJob::endless("a"), StepJob::endless("b"), StepJob::ok("c"));
    let root = JobNode::sequential(
        "root",
        vec![JobNode::concurrent("fetch", vec![a.node(), b.node()]), c.node()],
    );
    let suite = Arc::new(
        Suite::new("nightly", root).config(ws.config()).listener(check.clone()),
    );
    let store = ws.store("nightly");

    let run = tokio::spawn({
        let suite = Arc::clone(&suite);
        async move { suite.run().await }
    });
    let running = wait_for(SPEC_WAIT_MAX_MS, || {
        ["a", "b"].iter().all(|id| store.read(id).map(|s| s.state == JobState::Running).unwrap_or(false))
    })
    .await;
    assert!(running, "both fetchers should start");
    suite.stop_signal().fire().unwrap();

    assert_eq!(run.await.unwrap().unwrap(), Outcome::Stopped);

    let mut stopping = check.inner.jobs_for(EventKind::JobStopping);
    assert_eq!(stopping, vec!["root", "fetch", "a", "b", "c"]);
    let mut stopped = check.inner.jobs_for(EventKind::JobStopped);
    stopped.sort();
    stopping.sort();
    assert_eq!(stopped, stopping, "every job ends stopped exactly once");
    assert!(check.flag_missing.lock().is_empty());
    assert_eq!(check.inner.count(EventKind::SuiteStopped), 1);
    assert_eq!(c.runs(), 0);
    for id in ["root", "fetch", "a", "b", "c"] {
        assert_eq!(store.read(id).unwrap().state, JobState::Stopped, "{id}");
    }
}

#[tokio::test]
async fn stop_after_completion_changes_nothing() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let job = StepJob::ok("a");
    let suite = ws.suite("nightly", job.node(), &listener);

    assert_eq!(suite.run().await.unwrap(), Outcome::Completed);
    let before = listener.events().len();

    suite.stop_signal().fire().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(listener.events().len(), before);
    assert_eq!(ws.store("nightly").read("a").unwrap().state, JobState::Completed);
    assert_eq!(job.stops(), 0);
}
