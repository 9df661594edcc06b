//! Caller-owned cancellation and deadline token.
//!
//! Every operation takes an [`OpContext`]. The context is never created or
//! cached by the operations themselves; dropping the in-flight driver future
//! is how cancellation and deadlines take effect.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{MduError, MduResult};

/// Cancellation and deadline token threaded through every operation.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    token: CancellationToken,
}

impl OpContext {
    /// A context that never expires unless cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            timeout: Some(timeout),
            token: CancellationToken::new(),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            timeout: Some(deadline.saturating_duration_since(Instant::now())),
            token: CancellationToken::new(),
        }
    }

    /// Derive a context that is cancelled with this one but can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            timeout: self.timeout,
            token: self.token.child_token(),
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`cancel`](Self::cancel) was called on this context or a parent.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// `Ok` while the context is live, otherwise the matching error.
    pub fn err(&self) -> MduResult<()> {
        if self.is_cancelled() {
            return Err(MduError::Cancelled);
        }
        if self.is_expired() {
            return Err(self.timeout_error());
        }
        Ok(())
    }

    /// Run `operation` until it finishes, the context is cancelled, or the
    /// deadline passes, whichever comes first.
    pub async fn run<F, T>(&self, operation: F) -> MduResult<T>
    where
        F: Future<Output = MduResult<T>>,
    {
        self.err()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(MduError::Cancelled),
            _ = deadline => Err(self.timeout_error()),
            result = operation => result,
        }
    }

    fn timeout_error(&self) -> MduError {
        let millis = self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0);
        MduError::Timeout(millis)
    }
}
