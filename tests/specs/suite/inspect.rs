//! Inspection specs
//!
//! A separate process can open a suite from its index file and read
//! every job's status without access to the running engine.

use crate::prelude::*;

fn sample(listener: &Arc<RecordingListener>, ws: &Workspace) -> Suite {
    let root = JobNode::sequential(
        "root",
        vec![
            JobNode::concurrent("fetch", vec![StepJob::ok("a").node(), StepJob::failing("b", "404").node()]),
            StepJob::ok("index").node(),
        ],
    );
    ws.suite("nightly", root, listener)
}

#[tokio::test]
async fn facade_reads_a_finished_suite_from_its_index() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let suite = sample(&listener, &ws);
    suite.run().await.unwrap();

    let facade = SessionFacade::open(&suite.index_path()).unwrap().unwrap();

    assert_eq!(facade.suite_id(), "nightly");
    assert_eq!(facade.root_id(), "root");
    let children: Vec<_> = facade.children("fetch").unwrap().into_iter().map(|s| (s.job_id, s.state)).collect();
    assert_eq!(
        children,
        vec![(JobId::new("a"), JobState::Completed), (JobId::new("b"), JobState::Failed)]
    );
    assert_eq!(facade.parent("a").unwrap().unwrap().job_id, "fetch");
    assert!(facade.parent("root").unwrap().is_none());
    assert!(facade.session("missing").unwrap().is_none());
    assert_eq!(facade.session("b").unwrap().unwrap().note.as_deref(), Some("404"));

    let mut seen = Vec::new();
    facade.visit(|s| seen.push(s.job_id.to_string())).unwrap();
    assert_eq!(seen, vec!["root", "fetch", "a", "b", "index"]);

    assert_eq!(facade.to_string(), "├──root\n│  ├──fetch\n│  │  ├──a\n│  │  ├──b\n│  ├──index\n");
}

#[test]
fn opening_an_unknown_suite_finds_nothing() {
    let ws = Workspace::new();
    let listener = Arc::new(RecordingListener::new());
    let suite = sample(&listener, &ws);

    assert!(SessionFacade::open(&suite.index_path()).unwrap().is_none());
}
