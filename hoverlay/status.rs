use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{
  Deserialize,
  Serialize,
};
use tokio::sync::watch;

/// Backend status as reported by a plugin.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Progress,
  #[default]
  Ready,
  Warning,
  Error,
}

impl Status {
  /// Fixed consensus ranking. Progress outranks everything so a busy
  /// backend is never masked by another plugin's error.
  fn rank(self) -> u8 {
    match self {
      Status::Progress => 50,
      Status::Error => 20,
      Status::Warning => 10,
      Status::Ready => 0,
    }
  }
}

/// One plugin's most recent status report. Replaced wholesale on every
/// report, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
  pub owner:  String,
  pub status: Status,
  pub detail: Option<String>,
}

impl StatusEntry {
  pub fn new(owner: impl Into<String>, status: Status) -> Self {
    Self {
      owner: owner.into(),
      status,
      detail: None,
    }
  }

  #[must_use]
  pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
    self.detail = Some(detail.into());
    self
  }
}

/// Aggregates every plugin's reported status into one consensus value for
/// the status icon. One board per editing session, explicitly owned;
/// subscribers get the consensus pushed on change through a watch channel.
#[derive(Debug)]
pub struct StatusBoard {
  entries: Mutex<IndexMap<String, StatusEntry>>,
  tx:      watch::Sender<Status>,
}

impl Default for StatusBoard {
  fn default() -> Self {
    Self::new()
  }
}

impl StatusBoard {
  pub fn new() -> Self {
    let (tx, _) = watch::channel(Status::Ready);
    Self {
      entries: Mutex::new(IndexMap::new()),
      tx,
    }
  }

  /// Upsert a plugin's status. At most one entry per owner.
  pub fn report(&self, entry: StatusEntry) {
    {
      let mut entries = self.entries.lock();
      entries.insert(entry.owner.clone(), entry);
    }
    self.publish();
  }

  /// Remove a plugin's entry. Called when the owning plugin deactivates;
  /// entries never expire on their own.
  pub fn clear(&self, owner: &str) {
    let removed = self.entries.lock().shift_remove(owner).is_some();
    if removed {
      self.publish();
    }
  }

  /// The single highest-ranked status across all reporting plugins, or
  /// `Ready` when nobody is reporting. Ties among equal ranks go to the
  /// smallest owner id, so the result is a pure function of the map
  /// contents.
  #[must_use]
  pub fn consensus(&self) -> Status {
    let entries = self.entries.lock();
    consensus_of(entries.values())
  }

  /// Snapshot of all current entries, ordered by owner id, for status
  /// icon tooltips and panel listings.
  #[must_use]
  pub fn entries(&self) -> Vec<StatusEntry> {
    let entries = self.entries.lock();
    let mut list: Vec<_> = entries.values().cloned().collect();
    list.sort_by(|a, b| a.owner.cmp(&b.owner));
    list
  }

  /// Subscribe to consensus changes. The receiver immediately holds the
  /// current value.
  pub fn subscribe(&self) -> watch::Receiver<Status> {
    self.tx.subscribe()
  }

  /// Drop every entry. Only used on full session teardown.
  pub fn teardown(&self) {
    self.entries.lock().clear();
    self.publish();
  }

  fn publish(&self) {
    let value = self.consensus();
    self.tx.send_if_modified(|current| {
      if *current == value {
        false
      } else {
        *current = value;
        true
      }
    });
  }
}

fn consensus_of<'a>(entries: impl Iterator<Item = &'a StatusEntry>) -> Status {
  entries
    .max_by(|a, b| {
      a.status
        .rank()
        .cmp(&b.status.rank())
        // Inverted owner comparison: among equal ranks the smallest owner
        // id must win the max.
        .then_with(|| b.owner.cmp(&a.owner))
    })
    .map(|entry| entry.status)
    .unwrap_or(Status::Ready)
}
