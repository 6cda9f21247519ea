use bitflags::bitflags;

use crate::position::{
  Position,
  Range,
};

/// What triggered a tooltip request. Drives provider selection, debounce
/// routing and hide/persist rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  Mouse,
  Keyboard,
  Context,
  Selection,
}

impl EventKind {
  pub const ALL: [EventKind; 4] = [
    EventKind::Mouse,
    EventKind::Keyboard,
    EventKind::Context,
    EventKind::Selection,
  ];

  pub(crate) fn index(self) -> usize {
    match self {
      EventKind::Mouse => 0,
      EventKind::Keyboard => 1,
      EventKind::Context => 2,
      EventKind::Selection => 3,
    }
  }
}

bitflags! {
  /// Which event kinds a tooltip provider subscribes to.
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct EventKinds: u8 {
    const MOUSE     = 1 << 0;
    const KEYBOARD  = 1 << 1;
    const CONTEXT   = 1 << 2;
    const SELECTION = 1 << 3;
  }
}

impl EventKinds {
  #[must_use]
  pub fn accepts(self, kind: EventKind) -> bool {
    self.contains(match kind {
      EventKind::Mouse => EventKinds::MOUSE,
      EventKind::Keyboard => EventKinds::KEYBOARD,
      EventKind::Context => EventKinds::CONTEXT,
      EventKind::Selection => EventKinds::SELECTION,
    })
  }
}

impl Default for EventKinds {
  fn default() -> Self {
    EventKinds::all()
  }
}

impl From<EventKind> for EventKinds {
  fn from(kind: EventKind) -> Self {
    match kind {
      EventKind::Mouse => EventKinds::MOUSE,
      EventKind::Keyboard => EventKinds::KEYBOARD,
      EventKind::Context => EventKinds::CONTEXT,
      EventKind::Selection => EventKinds::SELECTION,
    }
  }
}

/// The resolved context a tooltip query runs against: the buffer range the
/// tooltip relates to, the position it anchors at, and the trigger kind.
/// Produced fresh per request from host-state snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRange {
  pub range:    Range,
  pub position: Position,
  pub kind:     EventKind,
}

impl EventRange {
  /// Resolve the range and anchor for a tooltip request.
  ///
  /// Mouse and context events anchor at the last known mouse position;
  /// without one there is no target and the result is `None`. The range is
  /// the first selection containing that position, or a zero-width range
  /// collapsed onto it. Keyboard and selection events use the most recent
  /// selection outright, anchored at its start.
  ///
  /// A pure computation over the supplied snapshots; `selections` is only
  /// consulted for mouse/context, `last_selection` only for
  /// keyboard/selection.
  pub fn resolve(
    kind: EventKind,
    last_mouse: Option<Position>,
    selections: &[Range],
    last_selection: Range,
  ) -> Option<EventRange> {
    match kind {
      EventKind::Mouse | EventKind::Context => {
        let position = last_mouse?;
        let range = selections
          .iter()
          .copied()
          .find(|sel| sel.contains(position))
          .unwrap_or_else(|| Range::point(position));
        Some(EventRange {
          range,
          position,
          kind,
        })
      },
      EventKind::Keyboard | EventKind::Selection => {
        Some(EventRange {
          range: last_selection,
          position: last_selection.start(),
          kind,
        })
      },
    }
  }
}
