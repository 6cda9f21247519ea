use serde::{
  Deserialize,
  Serialize,
};

use crate::position::Range;

/// Tooltip body in one of exactly three shapes. Plugins historically
/// passed these as loosely-typed records; the discrimination is explicit
/// here so a renderer never has to probe for fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipText {
  /// Plain text, rendered verbatim.
  Plain(String),
  /// Text to be syntax-highlighted with the given grammar scope.
  Highlighted { text: String, scope: String },
  /// Pre-rendered markup, trusted as-is.
  Html(String),
}

impl From<String> for TooltipText {
  fn from(text: String) -> Self {
    TooltipText::Plain(text)
  }
}

impl From<&str> for TooltipText {
  fn from(text: &str) -> Self {
    TooltipText::Plain(text.to_owned())
  }
}

/// What a provider answers a tooltip query with: the buffer range to
/// highlight and the body to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipContent {
  pub range: Range,
  pub text:  TooltipText,
  /// Keep this tooltip up when the cursor moves, regardless of the
  /// session's cursor-move policy. A forced hide still dismisses it.
  pub persist_on_cursor_move: bool,
}

impl TooltipContent {
  pub fn new(range: Range, text: impl Into<TooltipText>) -> Self {
    Self {
      range,
      text: text.into(),
      persist_on_cursor_move: false,
    }
  }

  #[must_use]
  pub fn persistent(mut self) -> Self {
    self.persist_on_cursor_move = true;
    self
  }
}
