//! Resume specs
//!
//! With resume enabled, a rerun skips jobs whose stored status is
//! completed and runs everything else again.

use crate::prelude::*;

#[tokio::test]
async fn resume_reruns_only_unfinished_jobs() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let (a, b) = (StepJob::ok("A"), StepJob::failing("B", "timeout"));
    let root = JobNode::sequential("root", vec![a.node(), b.node()]);
    let suite = ws.suite("nightly", root.clone(), &listener);

    assert!(suite.run().await.unwrap().is_failed());
    assert_eq!(ws.store("nightly").read("root").unwrap().state, JobState::Failed);

    b.set_ending(Ending::Succeed);
    let mut config = ws.config();
    config.resume = true;
    let resumed = Suite::new("nightly", root).config(config).listener(listener.clone());

    assert_eq!(resumed.run().await.unwrap(), Outcome::Completed);

    assert_eq!(a.runs(), 1);
    assert_eq!(b.runs(), 2);
    let store = ws.store("nightly");
    let a_status = store.read("A").unwrap();
    assert_eq!(a_status.state, JobState::Completed);
    assert!(a_status.attempts.is_empty(), "skipped jobs are not archived");
    assert_eq!(store.read("B").unwrap().state, JobState::Completed);
    assert_eq!(store.read("root").unwrap().state, JobState::Completed);
}

#[tokio::test]
async fn without_resume_everything_runs_again() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let (a, b) = (StepJob::ok("A"), StepJob::ok("B"));
    let suite = ws.suite("nightly", JobNode::concurrent("root", vec![a.node(), b.node()]), &listener);

    suite.run().await.unwrap();
    suite.run().await.unwrap();

    assert_eq!((a.runs(), b.runs()), (2, 2));
}
