use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  config::{
    Config,
    SharedConfig,
  },
  controller::{
    EditorControl,
    EditorSurface,
  },
  display::TooltipSink,
  disposable::{
    Disposal,
    DisposalBag,
  },
  registry::{
    RegistryError,
    TooltipProvider,
    TooltipRegistry,
  },
  status::{
    StatusBoard,
    StatusEntry,
  },
};

/// Session root: one per editing session, explicitly constructed and torn
/// down by the host. Owns the tooltip registry and the status board that
/// every plugin and editor of the session shares.
pub struct Upi {
  registry: Arc<TooltipRegistry>,
  status:   Arc<StatusBoard>,
  config:   SharedConfig,
}

impl Default for Upi {
  fn default() -> Self {
    Self::new(Config::default())
  }
}

impl Upi {
  pub fn new(config: Config) -> Self {
    Self {
      registry: Arc::new(TooltipRegistry::new()),
      status:   Arc::new(StatusBoard::new()),
      config:   SharedConfig::new(config),
    }
  }

  #[must_use]
  pub fn registry(&self) -> &Arc<TooltipRegistry> {
    &self.registry
  }

  #[must_use]
  pub fn status(&self) -> &Arc<StatusBoard> {
    &self.status
  }

  #[must_use]
  pub fn config(&self) -> &SharedConfig {
    &self.config
  }

  /// Hand a plugin its registration surface. `name` becomes the owner id
  /// for everything the plugin registers or reports.
  #[must_use]
  pub fn register_plugin(&self, name: impl Into<String>) -> UpiInstance {
    UpiInstance {
      name:     name.into(),
      registry: Arc::clone(&self.registry),
      status:   Arc::clone(&self.status),
      bag:      Mutex::new(DisposalBag::new()),
    }
  }

  /// Wire an editor into the session: its surface snapshots feed the
  /// session registry, its sink renders the winning tooltips.
  #[must_use]
  pub fn attach_editor(
    &self,
    surface: Arc<dyn EditorSurface>,
    sink: Arc<dyn TooltipSink>,
  ) -> EditorControl {
    EditorControl::new(
      surface,
      sink,
      Arc::clone(&self.registry),
      self.config.clone(),
    )
  }

  /// Full session teardown: every provider registration and status entry
  /// goes away at once. Editor controllers are destroyed separately by
  /// whoever attached them.
  pub fn teardown(&self) {
    self.registry.teardown();
    self.status.teardown();
  }
}

impl std::fmt::Debug for Upi {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Upi")
      .field("registry", &self.registry)
      .finish_non_exhaustive()
  }
}

/// A plugin's handle onto the session. Everything registered through it
/// carries the plugin's name as owner id and is released together on
/// [`UpiInstance::dispose`].
pub struct UpiInstance {
  name:     String,
  registry: Arc<TooltipRegistry>,
  status:   Arc<StatusBoard>,
  bag:      Mutex<DisposalBag>,
}

impl UpiInstance {
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Register this plugin's tooltip handler, under the plugin's name.
  /// Defaults to priority 100 and all event kinds; adjust both on the
  /// provider before registering. The registration lives as long as the
  /// returned handle (park it with [`UpiInstance::retain`] to tie it to
  /// the plugin's lifetime); disposing the plugin unregisters leftovers
  /// either way.
  pub fn register_tooltip_provider(
    &self,
    provider: TooltipProvider,
  ) -> Result<Disposal, RegistryError> {
    let mut provider = provider;
    provider.owner = self.name.clone();
    self.registry.register(provider)
  }

  /// Report this plugin's backend status; the entry's owner is forced to
  /// the plugin's name.
  pub fn report_status(&self, entry: StatusEntry) {
    let mut entry = entry;
    entry.owner = self.name.clone();
    self.status.report(entry);
  }

  /// Retract this plugin's status entry.
  pub fn clear_status(&self) {
    self.status.clear(&self.name);
  }

  /// Park an extra cancellation handle to be released with the plugin.
  pub fn retain(&self, disposal: Disposal) {
    self.bag.lock().add(disposal);
  }

  /// Plugin deactivation: releases every parked handle, unregisters any
  /// remaining providers under this owner, and clears the status entry.
  pub fn dispose(&self) {
    self.bag.lock().dispose_all();
    self.registry.unregister_owner(&self.name);
    self.status.clear(&self.name);
  }
}

impl Drop for UpiInstance {
  fn drop(&mut self) {
    self.dispose();
  }
}

impl std::fmt::Debug for UpiInstance {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("UpiInstance")
      .field("name", &self.name)
      .finish_non_exhaustive()
  }
}
