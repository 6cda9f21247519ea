//! Tooltip arbitration and backend status aggregation for editor
//! overlays.
//!
//! A host editor feeds pointer, selection and scroll events into a
//! per-editor [`EditorControl`]; debounced evaluations resolve an
//! [`EventRange`] and run it past the session's [`TooltipRegistry`],
//! which asks registered providers in priority order and applies the
//! first answer, unless a newer request for the same kind superseded it
//! in the meantime. Independently, plugins report their backend status to
//! a [`StatusBoard`] that reduces all reports to a single consensus value
//! for a status icon.
//!
//! The host side (DOM, menus, panels, buffer access) stays behind three
//! small traits: [`EditorSurface`] for buffer-state snapshots,
//! [`TooltipSink`] for rendering, and the [`SharedConfig`] handle for
//! live settings. Plugins integrate through [`Upi`] /
//! [`UpiInstance`] without seeing any of those.

mod config;
mod controller;
mod display;
mod disposable;
mod event;
mod hover;
mod overlap;
mod position;
mod registry;
mod status;
mod tooltip;
mod upi;

pub use config::{
  Config,
  CursorMovePolicy,
  ScopedOverride,
  SharedConfig,
};
pub use controller::{
  EditorControl,
  EditorSurface,
};
pub use display::{
  TooltipDisplay,
  TooltipSink,
};
pub use disposable::{
  Disposal,
  DisposalBag,
};
pub use event::{
  EventKind,
  EventKinds,
  EventRange,
};
pub use hover::{
  EvalFn,
  PointerEvent,
  PointerHook,
  SelectionEvent,
  SelectionHook,
};
pub use overlap::{
  Rect,
  should_subdue,
};
pub use position::{
  Position,
  Range,
};
pub use registry::{
  DEFAULT_PRIORITY,
  RegistryError,
  TooltipHandler,
  TooltipProvider,
  TooltipRegistry,
};
pub use status::{
  Status,
  StatusBoard,
  StatusEntry,
};
pub use tooltip::{
  TooltipContent,
  TooltipText,
};
pub use upi::{
  Upi,
  UpiInstance,
};
