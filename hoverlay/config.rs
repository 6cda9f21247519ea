use std::{
  collections::HashMap,
  sync::Arc,
  time::Duration,
};

use arc_swap::ArcSwap;
use serde::Deserialize;

/// What happens to mouse and context tooltips when the cursor moves.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorMovePolicy {
  /// Leave them alone.
  #[default]
  NothingSpecial,
  /// Force-hide them, persistence flag notwithstanding.
  HideTooltip,
}

/// Per-scope overrides for settings that vary by grammar.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct ScopedOverride {
  pub tooltip_interval_ms: Option<u64>,
}

/// Session settings. Held behind [`SharedConfig`] so the host can swap in
/// a new value at any time; consumers load it at the point of use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Debounce interval before a hover or selection tooltip is evaluated.
  pub tooltip_interval_ms: u64,
  pub on_cursor_move:      CursorMovePolicy,
  /// Overrides keyed by grammar scope, e.g. `"source.haskell"`.
  pub scoped:              HashMap<String, ScopedOverride>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      tooltip_interval_ms: 300,
      on_cursor_move:      CursorMovePolicy::default(),
      scoped:              HashMap::new(),
    }
  }
}

impl Config {
  /// The debounce interval for a given scope hint, falling back to the
  /// global value when the scope has no override.
  #[must_use]
  pub fn interval(&self, scope: Option<&str>) -> Duration {
    let ms = scope
      .and_then(|scope| self.scoped.get(scope))
      .and_then(|o| o.tooltip_interval_ms)
      .unwrap_or(self.tooltip_interval_ms);
    Duration::from_millis(ms)
  }
}

/// Hot-swappable handle to the live [`Config`]. Debounce hooks load this
/// every time they arm a timer, so interval changes apply to the next arm
/// without restarting anything.
#[derive(Debug, Clone)]
pub struct SharedConfig {
  inner: Arc<ArcSwap<Config>>,
}

impl Default for SharedConfig {
  fn default() -> Self {
    Self::new(Config::default())
  }
}

impl SharedConfig {
  pub fn new(config: Config) -> Self {
    Self {
      inner: Arc::new(ArcSwap::from_pointee(config)),
    }
  }

  #[must_use]
  pub fn load(&self) -> Arc<Config> {
    self.inner.load_full()
  }

  /// Replace the live configuration. Timers already armed keep their old
  /// deadline; the new value applies from the next arm on.
  pub fn store(&self, config: Config) {
    self.inner.store(Arc::new(config));
  }
}
