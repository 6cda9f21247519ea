/// A scoped cancellation handle. Runs its action exactly once, either on
/// an explicit [`Disposal::dispose`] or when dropped. Hold on to it for as
/// long as the registration it guards should stay alive.
#[must_use = "dropping a disposal immediately releases what it guards"]
pub struct Disposal {
  action: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposal {
  pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
    Self {
      action: Some(Box::new(action)),
    }
  }

  /// A handle guarding nothing.
  pub fn empty() -> Self {
    Self { action: None }
  }

  pub fn dispose(mut self) {
    self.run();
  }

  fn run(&mut self) {
    if let Some(action) = self.action.take() {
      action();
    }
  }
}

impl Drop for Disposal {
  fn drop(&mut self) {
    self.run();
  }
}

impl std::fmt::Debug for Disposal {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Disposal")
      .field("armed", &self.action.is_some())
      .finish()
  }
}

/// Accumulates disposal handles that share an owner and releases them
/// together on the owner's teardown, in registration order.
#[derive(Debug, Default)]
pub struct DisposalBag {
  items: Vec<Disposal>,
}

impl DisposalBag {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, disposal: Disposal) {
    self.items.push(disposal);
  }

  pub fn dispose_all(&mut self) {
    for disposal in self.items.drain(..) {
      disposal.dispose();
    }
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl Drop for DisposalBag {
  fn drop(&mut self) {
    self.dispose_all();
  }
}
