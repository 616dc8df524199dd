//! Cancellation handles for in-flight calls

use tokio::sync::watch;

/// Sender half: cancels every receiver created with it.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: watch::Sender<bool>,
}

/// Receiver half, passed into the call being cancelled.
#[derive(Debug, Clone)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
}

impl CancellationToken {
    /// Creates a token and its receiver.
    #[must_use]
    pub fn new() -> (Self, CancellationReceiver) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, CancellationReceiver { receiver })
    }

    /// Signals cancellation. Calling it again has no effect.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true if `cancel` was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl CancellationReceiver {
    /// Completes once cancellation is signalled.
    ///
    /// Never completes if the token is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Returns true if cancellation was already signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_receiver() {
        let (token, mut receiver) = CancellationToken::new();
        assert!(!receiver.is_cancelled());

        let waiter = tokio::spawn(async move { receiver.cancelled().await });
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("receiver should wake")
            .expect("task should not panic");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_token_never_cancels() {
        let (token, mut receiver) = CancellationToken::new();
        drop(token);

        let result = tokio::time::timeout(Duration::from_millis(20), receiver.cancelled()).await;
        assert!(result.is_err());
    }
}
