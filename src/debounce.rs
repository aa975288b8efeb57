use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Emits a value only after `delay` has passed without another `schedule`.
///
/// Each `schedule` aborts the pending timer and arms a new one, so only the
/// last value of a burst reaches the receiver. Dropping the debouncer
/// cancels whatever is pending.
pub struct Debouncer<T> {
  delay: Duration,
  settled_tx: mpsc::UnboundedSender<T>,
  pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
  pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
    let (settled_tx, settled_rx) = mpsc::unbounded_channel();
    (
      Self {
        delay,
        settled_tx,
        pending: None,
      },
      settled_rx,
    )
  }

  /// Must be called from within a tokio runtime.
  pub fn schedule(&mut self, value: T) {
    self.cancel();
    let delay = self.delay;
    let settled_tx = self.settled_tx.clone();
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      // The receiver is gone once the view is torn down.
      let _ = settled_tx.send(value);
    }));
  }

  pub fn cancel(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }

  pub fn is_pending(&self) -> bool {
    self
      .pending
      .as_ref()
      .map(|handle| !handle.is_finished())
      .unwrap_or(false)
  }
}

impl<T> Drop for Debouncer<T> {
  fn drop(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }
}
