use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  event::EventKind,
  overlap::{
    Rect,
    should_subdue,
  },
  tooltip::TooltipContent,
};

/// Rendering collaborator. Implementations draw tooltips at buffer
/// positions, report the drawn box back for overlap checks, and toggle a
/// visual class when asked to subdue.
pub trait TooltipSink: Send + Sync {
  fn show(&self, kind: EventKind, content: &TooltipContent);
  fn hide(&self, kind: EventKind);
  /// Bounding box of the currently rendered tooltip, in the shared
  /// scroll-view-relative space, if one is on screen.
  fn bounding_box(&self) -> Option<Rect>;
  fn set_subdued(&self, subdued: bool);
}

#[derive(Debug, Clone, Copy)]
struct Shown {
  persist: bool,
}

/// Per-editor table of which tooltip is currently displayed for each
/// event kind, enforcing the persistence rules on hide requests.
pub struct TooltipDisplay {
  sink:  Arc<dyn TooltipSink>,
  shown: Mutex<[Option<Shown>; 4]>,
}

impl TooltipDisplay {
  pub fn new(sink: Arc<dyn TooltipSink>) -> Self {
    Self {
      sink,
      shown: Mutex::new([None; 4]),
    }
  }

  /// Display `content` for `kind`, replacing whatever that kind showed.
  pub fn apply(&self, kind: EventKind, content: TooltipContent) {
    self.shown.lock()[kind.index()] = Some(Shown {
      persist: content.persist_on_cursor_move,
    });
    self.sink.show(kind, &content);
  }

  /// Dismiss the tooltip shown for `kind`, if any. A tooltip whose
  /// content set `persist_on_cursor_move` survives unless the caller
  /// forces the hide with `persistent == Some(false)`.
  pub fn hide(&self, kind: EventKind, persistent: Option<bool>) {
    let mut shown = self.shown.lock();
    let slot = &mut shown[kind.index()];
    match slot {
      Some(current) if current.persist && persistent != Some(false) => {},
      Some(_) => {
        *slot = None;
        self.sink.hide(kind);
      },
      None => {},
    }
  }

  /// Force-hide every kind. Teardown path.
  pub fn hide_all(&self) {
    for kind in EventKind::ALL {
      self.hide(kind, Some(false));
    }
  }

  #[must_use]
  pub fn is_shown(&self, kind: EventKind) -> bool {
    self.shown.lock()[kind.index()].is_some()
  }

  /// Re-evaluate whether the rendered tooltip should be subdued against
  /// the given selection highlight box. Nothing happens without both
  /// boxes, same as when the host has no tooltip element to measure.
  pub fn refresh_subdue(&self, selection_box: Option<Rect>) {
    let Some(tooltip_box) = self.sink.bounding_box() else {
      return;
    };
    let Some(selection_box) = selection_box else {
      return;
    };
    self
      .sink
      .set_subdued(should_subdue(tooltip_box, selection_box));
  }
}

impl std::fmt::Debug for TooltipDisplay {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TooltipDisplay")
      .field("shown", &*self.shown.lock())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use super::*;
  use crate::position::Range;

  #[derive(Default)]
  struct RecordingSink {
    shown:   Mutex<Vec<EventKind>>,
    hidden:  Mutex<Vec<EventKind>>,
    tooltip: Mutex<Option<Rect>>,
    subdued: Mutex<Option<bool>>,
  }

  impl TooltipSink for RecordingSink {
    fn show(&self, kind: EventKind, _content: &TooltipContent) {
      self.shown.lock().push(kind);
    }

    fn hide(&self, kind: EventKind) {
      self.hidden.lock().push(kind);
    }

    fn bounding_box(&self) -> Option<Rect> {
      *self.tooltip.lock()
    }

    fn set_subdued(&self, subdued: bool) {
      *self.subdued.lock() = Some(subdued);
    }
  }

  fn content() -> TooltipContent {
    TooltipContent::new(Range::default(), "2 + 2 :: Int")
  }

  #[test]
  fn hide_dismisses_shown_tooltip() {
    let sink = Arc::new(RecordingSink::default());
    let display = TooltipDisplay::new(sink.clone());
    display.apply(EventKind::Mouse, content());
    assert!(display.is_shown(EventKind::Mouse));

    display.hide(EventKind::Mouse, None);
    assert!(!display.is_shown(EventKind::Mouse));
    assert_eq!(*sink.hidden.lock(), vec![EventKind::Mouse]);

    // Nothing shown: hiding again reaches nothing.
    display.hide(EventKind::Mouse, None);
    assert_eq!(sink.hidden.lock().len(), 1);
  }

  #[test]
  fn persistent_content_survives_plain_hides() {
    let sink = Arc::new(RecordingSink::default());
    let display = TooltipDisplay::new(sink.clone());
    display.apply(EventKind::Keyboard, content().persistent());

    display.hide(EventKind::Keyboard, None);
    display.hide(EventKind::Keyboard, Some(true));
    assert!(display.is_shown(EventKind::Keyboard));

    // Forced hide wins over the persist flag.
    display.hide(EventKind::Keyboard, Some(false));
    assert!(!display.is_shown(EventKind::Keyboard));
    assert_eq!(*sink.hidden.lock(), vec![EventKind::Keyboard]);
  }

  #[test]
  fn kinds_are_tracked_independently() {
    let sink = Arc::new(RecordingSink::default());
    let display = TooltipDisplay::new(sink.clone());
    display.apply(EventKind::Mouse, content());
    display.apply(EventKind::Selection, content());

    display.hide(EventKind::Mouse, None);
    assert!(!display.is_shown(EventKind::Mouse));
    assert!(display.is_shown(EventKind::Selection));
  }

  #[test]
  fn subdue_needs_both_boxes() {
    let sink = Arc::new(RecordingSink::default());
    let display = TooltipDisplay::new(sink.clone());

    display.refresh_subdue(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    assert_eq!(*sink.subdued.lock(), None);

    *sink.tooltip.lock() = Some(Rect::new(100.0, 100.0, 50.0, 20.0));
    display.refresh_subdue(None);
    assert_eq!(*sink.subdued.lock(), None);

    display.refresh_subdue(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    assert_eq!(*sink.subdued.lock(), Some(true));

    display.refresh_subdue(Some(Rect::new(90.0, 90.0, 50.0, 20.0)));
    assert_eq!(*sink.subdued.lock(), Some(false));
  }
}
