use std::sync::{
  Arc,
  Weak,
  atomic::{
    AtomicU64,
    Ordering,
  },
};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use thiserror::Error;

use crate::{
  display::TooltipDisplay,
  disposable::Disposal,
  event::{
    EventKinds,
    EventRange,
  },
  tooltip::TooltipContent,
};

/// Default priority for plugin-registered providers.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Type-erased async tooltip handler. Returning `Ok(None)` means "nothing
/// to say here", which passes the query on to the next provider.
pub type TooltipHandler =
  Arc<dyn Fn(EventRange) -> BoxFuture<'static, anyhow::Result<Option<TooltipContent>>> + Send + Sync>;

/// A registered source of tooltip content.
pub struct TooltipProvider {
  pub owner:    String,
  pub priority: i32,
  pub kinds:    EventKinds,
  pub handler:  TooltipHandler,
}

impl TooltipProvider {
  pub fn new<F, Fut>(owner: impl Into<String>, handler: F) -> Self
  where
    F: Fn(EventRange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<TooltipContent>>> + Send + 'static,
  {
    Self {
      owner:    owner.into(),
      priority: DEFAULT_PRIORITY,
      kinds:    EventKinds::all(),
      handler:  Arc::new(move |range| Box::pin(handler(range))),
    }
  }

  #[must_use]
  pub fn with_priority(mut self, priority: i32) -> Self {
    self.priority = priority;
    self
  }

  #[must_use]
  pub fn with_kinds(mut self, kinds: EventKinds) -> Self {
    self.kinds = kinds;
    self
  }
}

impl std::fmt::Debug for TooltipProvider {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TooltipProvider")
      .field("owner", &self.owner)
      .field("priority", &self.priority)
      .field("kinds", &self.kinds)
      .finish_non_exhaustive()
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
  /// The owner already has a live registration. Dispose it first; ids
  /// become reusable the moment their disposal runs.
  #[error("tooltip provider {0:?} is already registered")]
  DuplicateOwner(String),
}

struct Registration {
  id:       u64,
  provider: TooltipProvider,
}

/// Ordered set of tooltip providers plus the per-kind request sequencing
/// that keeps slow stale responses from clobbering newer ones. One
/// registry per editing session, shared by every editor of that session.
pub struct TooltipRegistry {
  providers: Arc<Mutex<Vec<Registration>>>,
  next_id:   AtomicU64,
  /// Latest issued query sequence, per event kind.
  latest:    [AtomicU64; 4],
}

impl Default for TooltipRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl TooltipRegistry {
  pub fn new() -> Self {
    Self {
      providers: Arc::new(Mutex::new(Vec::new())),
      next_id:   AtomicU64::new(0),
      latest:    [const { AtomicU64::new(0) }; 4],
    }
  }

  /// Register a provider. The returned handle unregisters it when
  /// disposed (or dropped); a second live registration for the same owner
  /// is rejected.
  pub fn register(&self, provider: TooltipProvider) -> Result<Disposal, RegistryError> {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    {
      let mut providers = self.providers.lock();
      if providers
        .iter()
        .any(|reg| reg.provider.owner == provider.owner)
      {
        return Err(RegistryError::DuplicateOwner(provider.owner));
      }
      providers.push(Registration { id, provider });
    }

    let weak: Weak<Mutex<Vec<Registration>>> = Arc::downgrade(&self.providers);
    Ok(Disposal::new(move || {
      if let Some(providers) = weak.upgrade() {
        providers.lock().retain(|reg| reg.id != id);
      }
    }))
  }

  /// Drop every registration owned by `owner`. Backstop for plugin
  /// deactivation; individual disposal handles keep working as no-ops.
  pub fn unregister_owner(&self, owner: &str) {
    self.providers.lock().retain(|reg| reg.provider.owner != owner);
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.providers.lock().is_empty()
  }

  /// Query providers subscribed to the event's kind, highest priority
  /// first (registration order breaks ties), one at a time. The first
  /// `Some` wins and short-circuits the rest; a failing provider is
  /// logged and skipped, never surfaced.
  pub async fn query(&self, range: EventRange) -> Option<TooltipContent> {
    // Snapshot before awaiting anything: providers may dispose themselves
    // (or register others) from inside their own handler.
    let snapshot: Vec<(String, TooltipHandler)> = {
      let providers = self.providers.lock();
      let mut eligible: Vec<&Registration> = providers
        .iter()
        .filter(|reg| reg.provider.kinds.accepts(range.kind))
        .collect();
      eligible.sort_by_key(|reg| (std::cmp::Reverse(reg.provider.priority), reg.id));
      eligible
        .into_iter()
        .map(|reg| (reg.provider.owner.clone(), reg.provider.handler.clone()))
        .collect()
    };

    for (owner, handler) in snapshot {
      match handler(range).await {
        Ok(Some(content)) => return Some(content),
        Ok(None) => {},
        Err(err) => {
          log::error!("tooltip provider {owner:?} failed: {err:#}");
        },
      }
    }
    None
  }

  /// Run a query for `range` and apply the outcome to `display`, unless a
  /// newer request for the same kind was issued in the meantime; stale
  /// responses are discarded silently. A latest query that produced no
  /// content hides the kind's tooltip instead (persistence respected).
  ///
  /// Returns whether a tooltip was shown.
  pub async fn show(&self, range: EventRange, display: &TooltipDisplay) -> bool {
    let slot = &self.latest[range.kind.index()];
    let seq = slot.fetch_add(1, Ordering::SeqCst) + 1;

    let content = self.query(range).await;

    if slot.load(Ordering::SeqCst) != seq {
      log::debug!("discarding stale {:?} tooltip response", range.kind);
      return false;
    }
    match content {
      Some(content) => {
        display.apply(range.kind, content);
        true
      },
      None => {
        display.hide(range.kind, None);
        false
      },
    }
  }

  /// Drop all registrations. Session teardown only.
  pub fn teardown(&self) {
    self.providers.lock().clear();
  }
}

impl std::fmt::Debug for TooltipRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TooltipRegistry")
      .field("providers", &self.providers.lock().len())
      .finish_non_exhaustive()
  }
}
