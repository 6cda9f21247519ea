//! Debounced async hooks for host-driven editor events.
//!
//! Host editors deliver pointer and selection events synchronously and at
//! high frequency. Each hook runs as a background tokio task that owns a
//! single debounce deadline; the synchronous side only pushes events into
//! a channel and never waits on the hook.

mod hook;

pub use hook::{
  AsyncHook,
  send_or_drop,
  try_send,
};
