//! Attempt history specs
//!
//! Every rerun of a job archives the previous record as a numbered
//! attempt. Attempts come back oldest first.

use crate::prelude::*;

#[tokio::test]
async fn reruns_keep_earlier_attempts_in_order() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let job = StepJob::ok("load");
    let suite = ws.suite("nightly", JobNode::sequential("root", vec![job.node()]), &listener);

    for _ in 0..3 {
        assert_eq!(suite.run().await.unwrap(), Outcome::Completed);
    }

    let status = ws.store("nightly").read("load").unwrap();
    assert_eq!(status.note.as_deref(), Some("run 3"));
    assert_eq!(status.state, JobState::Completed);
    let notes: Vec<_> = status.attempts.iter().map(|a| a.note.as_deref()).collect();
    assert_eq!(notes, vec![Some("run 1"), Some("run 2")]);
    assert!(status.attempts.iter().all(|a| a.state == JobState::Completed));
    assert_eq!(status.attempt(1).and_then(|a| a.note.as_deref()), Some("run 1"));

    // Groups are archived too
    assert_eq!(ws.store("nightly").read("root").unwrap().attempts.len(), 2);
}

#[tokio::test]
async fn failed_attempt_is_preserved_after_a_successful_rerun() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let job = StepJob::failing("load", "disk full");
    let suite = ws.suite("nightly", job.node(), &listener);

    assert!(suite.run().await.unwrap().is_failed());
    job.set_ending(Ending::Succeed);
    assert_eq!(suite.run().await.unwrap(), Outcome::Completed);

    let status = ws.store("nightly").read("load").unwrap();
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.progress, 1.0);
    let first = status.attempt(1).unwrap();
    assert_eq!(first.state, JobState::Failed);
    assert_eq!(first.note.as_deref(), Some("disk full"));
    assert!(first.end_time.is_some());
}

#[tokio::test]
async fn jobs_that_never_ran_are_not_archived() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let (a, b) = (StepJob::failing("a", "bad"), StepJob::ok("b"));
    let root = JobNode::sequential_with("root", jt_engine::FailurePolicy::Abort, vec![a.node(), b.node()]);
    let suite = ws.suite("nightly", root, &listener);

    suite.run().await.unwrap();
    suite.run().await.unwrap();

    let store = ws.store("nightly");
    assert_eq!(b.runs(), 0);
    assert!(store.read("b").unwrap().attempts.is_empty());
    assert_eq!(store.read("a").unwrap().attempts.len(), 1);
}
