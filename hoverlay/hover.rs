use std::sync::Arc;

use hoverlay_event::AsyncHook;
use tokio::time::Instant;

use crate::{
  config::SharedConfig,
  event::EventKind,
  position::{
    Position,
    Range,
  },
};

/// Fired when a debounced tooltip evaluation comes due, with the position
/// it anchors at and the kind that triggered it.
pub type EvalFn = Arc<dyn Fn(Position, EventKind) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
  /// The pointer stopped over a new buffer position.
  Moved(Position),
  /// The pointer left the tracked surface, or something else invalidated
  /// the pending evaluation.
  Cancelled,
}

/// Debounces pointer movement into at most one tooltip evaluation per
/// quiet interval.
///
/// Idle until a movement arms the deadline; further movements supersede
/// it, a cancellation clears it. The interval is read from the live
/// config on every arm, so runtime changes take effect on the next
/// movement rather than whenever the hook was built.
pub struct PointerHook {
  last:     Option<Position>,
  config:   SharedConfig,
  scope:    Option<String>,
  evaluate: EvalFn,
}

impl PointerHook {
  pub fn new(config: SharedConfig, scope: Option<String>, evaluate: EvalFn) -> Self {
    Self {
      last: None,
      config,
      scope,
      evaluate,
    }
  }
}

impl AsyncHook for PointerHook {
  type Event = PointerEvent;

  fn handle_event(&mut self, event: PointerEvent, deadline: Option<Instant>) -> Option<Instant> {
    match event {
      PointerEvent::Moved(position) => {
        // Sub-pixel jitter maps to the same buffer position; keep the
        // running deadline instead of pushing it out forever.
        if self.last == Some(position) {
          return deadline;
        }
        self.last = Some(position);
        let interval = self.config.load().interval(self.scope.as_deref());
        Some(Instant::now() + interval)
      },
      PointerEvent::Cancelled => None,
    }
  }

  fn finish_debounce(&mut self) {
    if let Some(position) = self.last {
      (self.evaluate)(position, EventKind::Mouse);
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
  Changed(Range),
}

/// Debounces selection changes into selection-kind tooltip evaluations.
///
/// An empty selection never waits: it clears any pending evaluation and
/// runs the caller's empty-selection response immediately (hide the
/// selection tooltip, re-query for the keyboard kind, apply the
/// cursor-move policy). A non-empty selection arms the same config-read
/// deadline as pointer movement and evaluates at its start position.
pub struct SelectionHook {
  pending:  Option<Range>,
  config:   SharedConfig,
  scope:    Option<String>,
  evaluate: EvalFn,
  on_empty: Arc<dyn Fn() + Send + Sync>,
}

impl SelectionHook {
  pub fn new(
    config: SharedConfig,
    scope: Option<String>,
    evaluate: EvalFn,
    on_empty: Arc<dyn Fn() + Send + Sync>,
  ) -> Self {
    Self {
      pending: None,
      config,
      scope,
      evaluate,
      on_empty,
    }
  }
}

impl AsyncHook for SelectionHook {
  type Event = SelectionEvent;

  fn handle_event(&mut self, event: SelectionEvent, _deadline: Option<Instant>) -> Option<Instant> {
    let SelectionEvent::Changed(range) = event;
    if range.is_empty() {
      self.pending = None;
      (self.on_empty)();
      None
    } else {
      self.pending = Some(range);
      let interval = self.config.load().interval(self.scope.as_deref());
      Some(Instant::now() + interval)
    }
  }

  fn finish_debounce(&mut self) {
    if let Some(range) = self.pending.take() {
      (self.evaluate)(range.start(), EventKind::Selection);
    }
  }
}
