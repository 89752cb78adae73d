//! Concurrent group specs
//!
//! A concurrent group waits for every child and fails only when at least
//! one child failed, naming the failed children.

use crate::prelude::*;

#[tokio::test]
async fn one_failure_among_three_fails_the_group() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let (a, b, c) = (StepJob::ok("A"), StepJob::failing("B", "checksum mismatch"), StepJob::ok("C"));
    let root = JobNode::concurrent("root", vec![a.node(), b.node(), c.node()]);

    let outcome = ws.suite("nightly", root, &listener).run().await.unwrap();

    assert_eq!(outcome.state(), JobState::Failed);
    let store = ws.store("nightly");
    let group = store.read("root").unwrap();
    assert_eq!(group.state, JobState::Failed);
    let note = group.note.unwrap();
    assert!(note.contains("1 of 3 jobs failed"), "{note}");
    assert!(note.ends_with(": B"), "{note}");

    assert_eq!(store.read("A").unwrap().state, JobState::Completed);
    assert_eq!(store.read("C").unwrap().state, JobState::Completed);
    let failed = store.read("B").unwrap();
    assert_eq!(failed.state, JobState::Failed);
    assert_eq!(failed.note.as_deref(), Some("checksum mismatch"));
}

#[tokio::test]
async fn failures_never_change_sibling_outcomes() {
    for failing in 0..=4usize {
        let ws = Workspace::new();
        let listener = Arc::new(RecordingListener::new());
        let jobs: Vec<_> = (0..4)
            .map(|i| {
                let id = format!("j{i}");
                if i < failing {
                    StepJob::failing(&id, "boom")
                } else {
                    StepJob::ok(&id)
                }
            })
            .collect();
        let root = JobNode::concurrent("root", jobs.iter().map(StepJob::node).collect());

        let outcome = ws.suite("s", root, &listener).run().await.unwrap();

        let store = ws.store("s");
        for (i, job) in jobs.iter().enumerate() {
            let expected = if i < failing { JobState::Failed } else { JobState::Completed };
            assert_eq!(store.read(&format!("j{i}")).unwrap().state, expected, "failing={failing} job={i}");
            assert_eq!(job.runs(), 1);
        }
        match outcome {
            Outcome::Completed => assert_eq!(failing, 0),
            Outcome::Failed(failure) => {
                assert!(failure.to_string().contains(&format!("{failing} of 4 jobs failed")), "{failure}");
            }
            Outcome::Stopped => panic!("nothing asked the suite to stop"),
        }
    }
}

#[tokio::test]
async fn group_progress_reaches_one_on_completion() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let root = JobNode::concurrent("root", vec![StepJob::ok("a").node(), StepJob::ok("b").node()]);

    ws.suite("s", root, &listener).run().await.unwrap();

    let root = ws.store("s").read("root").unwrap();
    assert_eq!(root.progress, 1.0);
    assert_eq!(listener.jobs_for(EventKind::JobCompleted).last().map(String::as_str), Some("root"));
}
