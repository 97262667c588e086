//! Per-call cancellation and deadline.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use filer_types::{make_error_msg, MetaCode, Result, TransactionCode};

/// Caller context threaded through every store call.
///
/// Cloning shares the cancellation signal; a clone observes the same
/// `CancelHandle`.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every context cloned from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl OpContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().with_deadline(Instant::now() + timeout)
    }

    /// Bound this context by `deadline`, keeping the earlier of the two if
    /// one is already set.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle { tx })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fail if the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return make_error_msg(TransactionCode::CANCELED, "context cancelled");
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return make_error_msg(MetaCode::OPERATION_TIMEOUT, "deadline exceeded");
        }
        Ok(())
    }

    /// Run `op`, failing early if the context is cancelled or its deadline
    /// passes first. The dropped `op` future releases its transaction.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        let cancelled = wait_cancelled(self.cancel.clone());
        let guarded = async {
            tokio::select! {
                biased;
                _ = cancelled => make_error_msg(TransactionCode::CANCELED, "context cancelled"),
                result = op => result,
            }
        };
        match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, guarded).await {
                Ok(result) => result,
                Err(_) => make_error_msg(MetaCode::OPERATION_TIMEOUT, "deadline exceeded"),
            },
            None => guarded.await,
        }
    }
}

async fn wait_cancelled(rx: Option<watch::Receiver<bool>>) {
    if let Some(mut rx) = rx {
        let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if fired {
            return;
        }
    }
    // no handle, or the handle was dropped without cancelling
    std::future::pending::<()>().await
}
