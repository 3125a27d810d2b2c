//! Per-test failure reporting and cleanup registration.
//!
//! [`TestScope`] gives async tests what a test handle provides in frameworks
//! with built-in cleanup support: a way to fail immediately, a way to record a
//! failure and keep going, and a stack of cleanup actions that run once after
//! the test body and all of its subtests have finished, whatever the outcome.
//!
//! ```no_run
//! use container_harness::TestScope;
//!
//! # async fn example() {
//! TestScope::run("uses_a_scope", |t| async move {
//!     t.cleanup(|| async { println!("runs last") });
//!     if 1 + 1 != 2 {
//!         t.fatal("arithmetic is broken");
//!     }
//! })
//! .await;
//! # }
//! ```

use futures_util::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;

type Cleanup = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;
type PanicPayload = Box<dyn Any + Send>;

#[derive(Default)]
struct ScopeState {
    cleanups: Vec<Cleanup>,
    failures: Vec<String>,
    finished: bool,
}

struct ScopeInner {
    name: String,
    state: Mutex<ScopeState>,
}

/// Handle to the currently running test.
///
/// Clones share the same failure list and cleanup stack.
#[derive(Clone)]
pub struct TestScope {
    inner: Arc<ScopeInner>,
}

impl TestScope {
    /// Create a scope without running anything in it.
    ///
    /// Most callers want [`TestScope::run`], which also drives the cleanups.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name: name.into(),
                state: Mutex::new(ScopeState::default()),
            }),
        }
    }

    /// Run `body` as a test.
    ///
    /// After the body returns or unwinds, every registered cleanup runs in
    /// reverse registration order. A panic from the body is then resumed
    /// unless a cleanup also failed; otherwise any recorded failure fails the
    /// test with the collected messages.
    pub async fn run<F, Fut>(name: impl Into<String>, body: F)
    where
        F: FnOnce(TestScope) -> Fut,
        Fut: Future<Output = ()>,
    {
        let scope = TestScope::new(name);
        let outcome = scope.execute(body).await;
        let failures_after_body = scope.state().failures.len();
        scope.run_cleanups().await;

        let failures = scope.failures();
        if let Err(payload) = outcome {
            // Resume the body panic only when no cleanup failed after it.
            if failures.len() == failures_after_body {
                panic::resume_unwind(payload);
            }
        }

        if !failures.is_empty() {
            panic!(
                "test {} failed:\n  {}",
                scope.name(),
                failures.join("\n  ")
            );
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Register an action to run once after the test and its subtests finish.
    ///
    /// Actions run last-registered first. An action may call
    /// [`TestScope::fatal`]; the failure is recorded and the remaining actions
    /// still run.
    pub fn cleanup<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state();
        if state.finished {
            drop(state);
            panic!("cleanup registered on finished test {}", self.name());
        }
        state.cleanups.push(Box::new(move || action().boxed()));
    }

    /// Record a failure and continue.
    pub fn error(&self, message: impl fmt::Display) {
        let message = message.to_string();
        error!(test = self.name(), "{}", message);
        self.state().failures.push(message);
    }

    /// Record a failure and stop the test immediately.
    pub fn fatal(&self, message: impl fmt::Display) -> ! {
        let message = message.to_string();
        self.error(&message);
        panic!("{}: {}", self.name(), message);
    }

    pub fn failed(&self) -> bool {
        !self.state().failures.is_empty()
    }

    pub fn failures(&self) -> Vec<String> {
        self.state().failures.clone()
    }

    /// Run `body` as a named subtest of this scope.
    ///
    /// The subtest has its own cleanup stack, drained when the subtest ends
    /// and so before any cleanup of this scope. A failing subtest marks this
    /// scope failed without stopping it. Returns whether the subtest passed.
    pub async fn subtest<F, Fut>(&self, name: &str, body: F) -> bool
    where
        F: FnOnce(TestScope) -> Fut,
        Fut: Future<Output = ()>,
    {
        let child = TestScope::new(format!("{}/{}", self.name(), name));
        // The unwind has already been recorded as a failure of the child.
        let _ = child.execute(body).await;
        child.run_cleanups().await;

        let passed = !child.failed();
        if !passed {
            self.error(format!("subtest {} failed", child.name()));
        }
        passed
    }

    async fn execute<F, Fut>(&self, body: F) -> Result<(), PanicPayload>
    where
        F: FnOnce(TestScope) -> Fut,
        Fut: Future<Output = ()>,
    {
        let scope = self.clone();
        let before = self.state().failures.len();
        let outcome = AssertUnwindSafe(async move { body(scope).await })
            .catch_unwind()
            .await;

        if let Err(payload) = &outcome {
            self.record_unwind(before, &**payload);
        }
        outcome
    }

    /// Drain the cleanup stack, including actions registered by other actions.
    async fn run_cleanups(&self) {
        loop {
            let next = {
                let mut state = self.state();
                let next = state.cleanups.pop();
                if next.is_none() {
                    state.finished = true;
                }
                next
            };
            let Some(action) = next else { break };

            debug!(test = self.name(), "Running cleanup");
            let before = self.state().failures.len();
            let outcome = AssertUnwindSafe(async move { action().await })
                .catch_unwind()
                .await;
            if let Err(payload) = outcome {
                self.record_unwind(before, &*payload);
            }
        }
    }

    /// Record a panic that did not go through [`TestScope::fatal`].
    fn record_unwind(&self, failures_before: usize, payload: &(dyn Any + Send)) {
        let mut state = self.state();
        if state.failures.len() == failures_before {
            state.failures.push(format!("panicked: {}", panic_message(payload)));
        }
    }

    fn state(&self) -> MutexGuard<'_, ScopeState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("TestScope")
            .field("name", &self.inner.name)
            .field("failures", &state.failures)
            .field("pending_cleanups", &state.cleanups.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
