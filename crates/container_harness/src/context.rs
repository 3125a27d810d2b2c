//! Execution context carrying cancellation and a deadline.
//!
//! Every blocking harness operation runs through [`ExecContext::run`], so a
//! cancelled context or an elapsed deadline aborts it with
//! [`ContainerError::Cancelled`] or [`ContainerError::DeadlineExceeded`].

use crate::errors::{ContainerError, ContainerResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// Cancellation token plus optional deadline, cheap to clone.
///
/// Children share the parent's cancellation: cancelling a parent cancels all
/// of its children, but not the other way round. A child deadline never
/// extends past the parent's.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context that expires `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context that expires at `deadline`, or at the parent's deadline
    /// if that comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Child context with its own cancellation and the parent's deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is already done, if it is.
    pub fn err(&self) -> Option<ContainerError> {
        if self.token.is_cancelled() {
            Some(ContainerError::Cancelled)
        } else if self.deadline.is_some_and(|d| d <= Instant::now()) {
            Some(ContainerError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Run `operation` until it completes, the context is cancelled, or the
    /// deadline passes, whichever happens first.
    ///
    /// The operation is dropped when the context wins the race.
    pub async fn run<F, T>(&self, operation: F) -> ContainerResult<T>
    where
        F: Future<Output = ContainerResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ContainerError::Cancelled),
            _ = sleep_until(self.deadline) => Err(ContainerError::DeadlineExceeded),
            result = operation => result,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
