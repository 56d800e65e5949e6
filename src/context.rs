//! Per-call context passed through to handlers.
//!
//! The mediator never inspects a [`Context`]; it only hands it to the
//! configuration checker, the validator and the handler. Handlers that
//! care about cancellation can poll [`Context::is_cancelled`] or await
//! [`Context::cancelled`].

use tokio::sync::watch;

/// Opaque context carried through a dispatch.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<watch::Receiver<bool>>,
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that is cancelled through the returned handle.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mediator::Context;
    ///
    /// let (ctx, cancel) = Context::with_cancel();
    /// assert!(!ctx.is_cancelled());
    /// cancel.cancel();
    /// assert!(ctx.is_cancelled());
    /// ```
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel: Some(rx) }, CancelHandle { tx })
    }

    /// Check if the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Wait until the context is cancelled.
    ///
    /// Never completes for a background context, or once the cancel handle
    /// has been dropped without cancelling.
    pub async fn cancelled(&self) {
        if let Some(rx) = &self.cancel {
            let mut rx = rx.clone();
            if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

/// Cancels the [`Context`] it was created with, and all of its clones.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the context.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_background_is_never_cancelled() {
        assert!(!Context::background().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_reaches_clones() {
        let (ctx, cancel) = Context::with_cancel();
        let clone = ctx.clone();

        let waiter = tokio::spawn(async move { clone.cancelled().await });
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancellation not observed")
            .unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_does_not_cancel() {
        let (ctx, cancel) = Context::with_cancel();
        drop(cancel);

        let result = tokio::time::timeout(Duration::from_secs(5), ctx.cancelled()).await;
        assert!(result.is_err());
        assert!(!ctx.is_cancelled());
    }
}
