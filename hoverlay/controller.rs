use std::sync::Arc;

use hoverlay_event::{
  AsyncHook,
  send_or_drop,
};
use parking_lot::Mutex;
use tokio::sync::mpsc::Sender;

use crate::{
  config::{
    CursorMovePolicy,
    SharedConfig,
  },
  display::{
    TooltipDisplay,
    TooltipSink,
  },
  event::{
    EventKind,
    EventRange,
  },
  hover::{
    PointerEvent,
    PointerHook,
    SelectionEvent,
    SelectionHook,
  },
  overlap::Rect,
  position::{
    Position,
    Range,
  },
  registry::TooltipRegistry,
};

/// Host editor collaborator. Everything the controller needs to know
/// about buffer state is pulled through here as snapshots; the host
/// pushes events by calling the controller's methods.
pub trait EditorSurface: Send + Sync {
  fn line_count(&self) -> usize;
  /// Position of the end of `row`'s text, excluding the line ending.
  fn row_end(&self, row: usize) -> Position;
  /// All current selection ranges, in selection order.
  fn selections(&self) -> Vec<Range>;
  /// The most recently changed selection.
  fn last_selection(&self) -> Range;
  /// Pixel box of a selection highlight in the shared scroll-view space,
  /// if it is on screen.
  fn selection_pixel_rect(&self, range: Range) -> Option<Rect>;
  /// Grammar scope hint used for scoped config lookups.
  fn scope(&self) -> Option<String> {
    None
  }
}

struct ControlShared {
  surface:    Arc<dyn EditorSurface>,
  display:    TooltipDisplay,
  registry:   Arc<TooltipRegistry>,
  config:     SharedConfig,
  last_mouse: Mutex<Option<Position>>,
}

impl ControlShared {
  fn event_range(&self, kind: EventKind) -> Option<EventRange> {
    EventRange::resolve(
      kind,
      *self.last_mouse.lock(),
      &self.surface.selections(),
      self.surface.last_selection(),
    )
  }

  /// The should-show gate: positions past the last buffer row, or sitting
  /// exactly on a row's end, hide the kind instead of querying. Anything
  /// else resolves an event range and runs the arbitration.
  fn evaluate(self: Arc<Self>, position: Position, kind: EventKind) {
    let out_of_reach = position.row >= self.surface.line_count()
      || position == self.surface.row_end(position.row);
    if out_of_reach {
      self.display.hide(kind, None);
      return;
    }
    self.spawn_query(kind);
  }

  fn spawn_query(self: Arc<Self>, kind: EventKind) {
    tokio::spawn(async move {
      match self.event_range(kind) {
        Some(range) => {
          self.registry.show(range, &self.display).await;
        },
        None => self.display.hide(kind, None),
      }
    });
  }
}

/// Per-editor glue: feeds host events into the debounce hooks, gates
/// fired evaluations against buffer bounds, and owns this editor's
/// tooltip display state.
///
/// Host integration calls [`pointer_moved`](Self::pointer_moved) /
/// [`pointer_left`](Self::pointer_left) /
/// [`selection_changed`](Self::selection_changed) /
/// [`scrolled`](Self::scrolled) from its event subscriptions and
/// [`destroy`](Self::destroy) when the editor goes away; destruction
/// cancels any pending debounce deadline before releasing state.
pub struct EditorControl {
  shared:       Arc<ControlShared>,
  pointer_tx:   Sender<PointerEvent>,
  selection_tx: Sender<SelectionEvent>,
}

impl EditorControl {
  pub fn new(
    surface: Arc<dyn EditorSurface>,
    sink: Arc<dyn TooltipSink>,
    registry: Arc<TooltipRegistry>,
    config: SharedConfig,
  ) -> Self {
    let scope = surface.scope();
    let shared = Arc::new(ControlShared {
      surface,
      display: TooltipDisplay::new(sink),
      registry,
      config: config.clone(),
      last_mouse: Mutex::new(None),
    });

    let eval: crate::hover::EvalFn = {
      let shared = Arc::clone(&shared);
      Arc::new(move |position, kind| Arc::clone(&shared).evaluate(position, kind))
    };
    let pointer_tx = PointerHook::new(config.clone(), scope.clone(), eval.clone()).spawn();

    let on_empty = {
      let shared = Arc::clone(&shared);
      let pointer_tx = pointer_tx.clone();
      Arc::new(move || {
        shared.display.hide(EventKind::Selection, None);
        // The pending mouse evaluation would race the cursor we just
        // moved; drop it along with the selection one.
        send_or_drop(&pointer_tx, PointerEvent::Cancelled);
        Arc::clone(&shared).spawn_query(EventKind::Keyboard);
        if shared.config.load().on_cursor_move == CursorMovePolicy::HideTooltip {
          shared.display.hide(EventKind::Mouse, Some(false));
          shared.display.hide(EventKind::Context, Some(false));
        }
      })
    };
    let selection_tx = SelectionHook::new(config, scope, eval, on_empty).spawn();

    Self {
      shared,
      pointer_tx,
      selection_tx,
    }
  }

  /// The pointer stopped over `position` (already translated to buffer
  /// coordinates by the host).
  pub fn pointer_moved(&self, position: Position) {
    *self.shared.last_mouse.lock() = Some(position);
    send_or_drop(&self.pointer_tx, PointerEvent::Moved(position));
  }

  /// The pointer left the editor's scroll view.
  pub fn pointer_left(&self) {
    send_or_drop(&self.pointer_tx, PointerEvent::Cancelled);
  }

  /// The editor's selection changed. Updates the subdue state against the
  /// new selection immediately; tooltip evaluation goes through the
  /// selection debouncer.
  pub fn selection_changed(&self, range: Range) {
    self
      .shared
      .display
      .refresh_subdue(self.shared.surface.selection_pixel_rect(range));
    send_or_drop(&self.selection_tx, SelectionEvent::Changed(range));
  }

  /// The editor scrolled; a mouse tooltip no longer lines up with what is
  /// under the pointer.
  pub fn scrolled(&self) {
    self.shared.display.hide(EventKind::Mouse, None);
  }

  /// Resolve the event range a tooltip request for `kind` would run
  /// against right now. `None` means no target (e.g. a mouse request
  /// before any pointer movement was observed).
  #[must_use]
  pub fn event_range(&self, kind: EventKind) -> Option<EventRange> {
    self.shared.event_range(kind)
  }

  /// Dismiss this editor's tooltip for `kind`; see
  /// [`TooltipDisplay::hide`] for the persistence rules.
  pub fn hide(&self, kind: EventKind, persistent: Option<bool>) {
    self.shared.display.hide(kind, persistent);
  }

  /// Tear the controller down: pending debounce deadlines are cancelled
  /// with the hook tasks, the recorded pointer position is released, and
  /// every tooltip is force-hidden.
  pub fn destroy(self) {
    // Dropping the senders terminates both hook tasks along with any
    // armed deadline.
    drop(self.pointer_tx);
    drop(self.selection_tx);
    *self.shared.last_mouse.lock() = None;
    self.shared.display.hide_all();
  }
}

impl std::fmt::Debug for EditorControl {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EditorControl")
      .field("display", &self.shared.display)
      .finish_non_exhaustive()
  }
}
