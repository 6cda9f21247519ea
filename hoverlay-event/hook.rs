use std::time::Duration;

use futures_executor::block_on;
use tokio::{
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

/// Upper bound on how long [`send_or_drop`] may block the caller when the
/// hook's channel is full. Past this the event is dropped: a lost pointer
/// move costs one tooltip, a stalled event loop costs the whole editor.
const SEND_TIMEOUT: Duration = Duration::from_millis(2);

/// A debounced event handler running as a background task.
///
/// Events arrive through the channel returned by [`AsyncHook::spawn`]. On
/// every event the hook decides what happens to the debounce deadline:
/// keep it (`deadline` passed through), replace it (a fresh `Instant`),
/// or clear it (`None`). When the deadline elapses without a newer event,
/// [`AsyncHook::finish_debounce`] runs once and the deadline resets.
///
/// Dropping every sender terminates the task, which discards any pending
/// deadline with it; nothing fires after the owning component lets go of
/// its handle.
pub trait AsyncHook: Send + 'static + Sized {
  type Event: Send + 'static;

  /// React to an incoming event. `deadline` is the currently armed
  /// debounce deadline, if any; the return value becomes the new one.
  fn handle_event(&mut self, event: Self::Event, deadline: Option<Instant>) -> Option<Instant>;

  /// The armed deadline elapsed with no superseding event.
  fn finish_debounce(&mut self);

  /// Move the hook onto a background task, returning the event sender.
  fn spawn(self) -> Sender<Self::Event> {
    // Headroom for event bursts (rapid pointer movement); the task drains
    // continuously so the channel staying full means the loop is wedged,
    // not that the capacity is too small.
    let (tx, rx) = mpsc::channel(256);
    // Unit tests construct hooks outside a runtime; only attach the worker
    // when one is actually running.
    if tokio::runtime::Handle::try_current().is_ok() {
      tokio::spawn(run(self, rx));
    }
    tx
  }
}

async fn run<H: AsyncHook>(mut hook: H, mut rx: mpsc::Receiver<H::Event>) {
  let mut deadline = None;
  loop {
    let event = match deadline {
      Some(at) => {
        match tokio::time::timeout_at(at, rx.recv()).await {
          Ok(event) => event,
          Err(_) => {
            hook.finish_debounce();
            deadline = None;
            continue;
          },
        }
      },
      None => rx.recv().await,
    };
    let Some(event) = event else {
      // All senders gone: the owning component was destroyed.
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Push an event from synchronous host code, dropping it rather than
/// stalling. Tries a non-blocking send first, then blocks for at most
/// [`SEND_TIMEOUT`].
pub fn send_or_drop<T>(tx: &Sender<T>, event: T) {
  match tx.try_send(event) {
    Ok(()) => {},
    Err(TrySendError::Full(event)) => {
      let _ = block_on(tx.send_timeout(event, SEND_TIMEOUT));
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("event sent to a closed hook channel");
    },
  }
}

/// Push an event without blocking at all; reports whether it was accepted.
pub fn try_send<T>(tx: &Sender<T>, event: T) -> bool {
  tx.try_send(event).is_ok()
}
