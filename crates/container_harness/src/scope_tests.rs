//! Tests for test scopes.

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};

type Events = Arc<Mutex<Vec<String>>>;

fn push(events: &Events, event: &str) {
    events.lock().unwrap().push(event.to_string());
}

fn snapshot(events: &Events) -> Vec<String> {
    events.lock().unwrap().clone()
}

/// Run a test expected to fail and return its panic message.
async fn expect_failure<F, Fut>(name: &str, body: F) -> String
where
    F: FnOnce(TestScope) -> Fut,
    Fut: Future<Output = ()>,
{
    let outcome = AssertUnwindSafe(TestScope::run(name, body))
        .catch_unwind()
        .await;
    match outcome {
        Ok(()) => panic!("expected test {name} to fail"),
        Err(payload) => panic_message(&*payload),
    }
}

#[tokio::test]
async fn test_passing_test_runs_cleanups_in_reverse_order() {
    let events = Events::default();
    let e = Arc::clone(&events);

    TestScope::run("reverse", |t| async move {
        for name in ["first", "second", "third"] {
            let e = Arc::clone(&e);
            t.cleanup(move || async move { push(&e, name) });
        }
        push(&e, "body");
    })
    .await;

    assert_eq!(snapshot(&events), vec!["body", "third", "second", "first"]);
}

#[tokio::test]
async fn test_fatal_stops_body_and_still_runs_cleanup() {
    let events = Events::default();
    let e = Arc::clone(&events);

    let message = expect_failure("fatal", |t| async move {
        let c = Arc::clone(&e);
        t.cleanup(move || async move { push(&c, "cleanup") });
        t.fatal("boom");
    })
    .await;

    assert_eq!(message, "fatal: boom");
    assert_eq!(snapshot(&events), vec!["cleanup"]);
}

#[tokio::test]
async fn test_error_records_and_continues() {
    let reached = Arc::new(AtomicBool::new(false));
    let r = Arc::clone(&reached);

    let message = expect_failure("error", |t| async move {
        t.error("first problem");
        assert!(t.failed());
        t.error("second problem");
        r.store(true, Ordering::SeqCst);
    })
    .await;

    assert!(reached.load(Ordering::SeqCst));
    assert!(message.contains("test error failed"));
    assert!(message.contains("first problem"));
    assert!(message.contains("second problem"));
}

#[tokio::test]
async fn test_fatal_in_cleanup_does_not_block_other_cleanups() {
    let events = Events::default();
    let e = Arc::clone(&events);

    let message = expect_failure("cleanup_fatal", |t| async move {
        let first = Arc::clone(&e);
        t.cleanup(move || async move { push(&first, "first") });

        let scope = t.clone();
        t.cleanup(move || async move {
            scope.fatal("release failed");
        });
    })
    .await;

    assert!(message.contains("release failed"));
    assert_eq!(snapshot(&events), vec!["first"]);
}

#[tokio::test]
async fn test_cleanup_failure_after_body_failure_reports_both() {
    let message = expect_failure("both_fail", |t| async move {
        let scope = t.clone();
        t.cleanup(move || async move {
            scope.fatal("release failed");
        });
        t.fatal("body failed");
    })
    .await;

    assert!(message.contains("test both_fail failed"));
    assert!(message.contains("body failed"));
    assert!(message.contains("release failed"));
}

#[tokio::test]
async fn test_plain_panic_in_cleanup_is_recorded() {
    let message = expect_failure("cleanup_panic", |t| async move {
        t.cleanup(|| async { panic!("unexpected") });
    })
    .await;

    assert!(message.contains("panicked: unexpected"));
}

#[tokio::test]
async fn test_cleanup_registered_during_cleanup_runs() {
    let events = Events::default();
    let e = Arc::clone(&events);

    TestScope::run("nested_cleanup", |t| async move {
        let scope = t.clone();
        t.cleanup(move || async move {
            push(&e, "outer");
            let inner = Arc::clone(&e);
            scope.cleanup(move || async move { push(&inner, "inner") });
        });
    })
    .await;

    assert_eq!(snapshot(&events), vec!["outer", "inner"]);
}

#[tokio::test]
async fn test_subtest_cleanups_run_before_parent_cleanups() {
    let events = Events::default();
    let e = Arc::clone(&events);

    TestScope::run("parent", |t| async move {
        let parent_event = Arc::clone(&e);
        t.cleanup(move || async move { push(&parent_event, "parent cleanup") });

        let sub_events = Arc::clone(&e);
        let passed = t
            .subtest("child", |st| async move {
                assert_eq!(st.name(), "parent/child");
                let c = Arc::clone(&sub_events);
                st.cleanup(move || async move { push(&c, "child cleanup") });
                push(&sub_events, "child body");
            })
            .await;

        assert!(passed);
        push(&e, "parent body");
    })
    .await;

    assert_eq!(
        snapshot(&events),
        vec!["child body", "child cleanup", "parent body", "parent cleanup"]
    );
}

#[tokio::test]
async fn test_failing_subtest_marks_parent_failed_but_continues() {
    let reached = Arc::new(AtomicBool::new(false));
    let r = Arc::clone(&reached);

    let message = expect_failure("parent", |t| async move {
        let passed = t
            .subtest("child", |st| async move {
                st.fatal("child broke");
            })
            .await;

        assert!(!passed);
        assert!(t.failed());
        r.store(true, Ordering::SeqCst);
    })
    .await;

    assert!(reached.load(Ordering::SeqCst));
    assert!(message.contains("subtest parent/child failed"));
}

#[tokio::test]
async fn test_cleanup_after_finish_panics() {
    let captured: Arc<Mutex<Option<TestScope>>> = Arc::default();
    let slot = Arc::clone(&captured);

    TestScope::run("finished", |t| async move {
        *slot.lock().unwrap() = Some(t.clone());
    })
    .await;

    let scope = captured.lock().unwrap().take().expect("scope captured");
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        scope.cleanup(|| async {});
    }));
    assert!(result.is_err());
}

#[test]
fn test_new_scope_has_no_failures() {
    let scope = TestScope::new("fresh");
    assert_eq!(scope.name(), "fresh");
    assert!(!scope.failed());
    assert!(scope.failures().is_empty());
    assert!(format!("{:?}", scope).contains("fresh"));
}
