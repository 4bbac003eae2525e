use std::sync::Arc;

use tokio::sync::watch;

/// Sending side of a cooperative cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace works even when every receiver is gone
        self.tx.send_replace(true);
    }
}

/// Receiving side, polled by the wait loop between status checks
///
/// Dropping the `CancelHandle` is not a cancel request: the wait just can't be interrupted anymore.
/// Clones observe the same signal, one per concurrent wait.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl Cancellation {
    pub fn pair() -> (CancelHandle, Cancellation) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Cancellation { rx, _keepalive: None })
    }

    /// A signal that never fires
    pub fn never() -> Cancellation {
        let (tx, rx) = watch::channel(false);
        Cancellation { rx, _keepalive: Some(Arc::new(tx)) }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested, or never if it can't be anymore
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
