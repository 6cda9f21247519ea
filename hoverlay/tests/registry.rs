//! Arbitration behavior of the tooltip provider registry: ordering,
//! short-circuiting, failure isolation, disposal and stale-response
//! supersession.

use std::sync::{
  Arc,
  atomic::{
    AtomicU64,
    AtomicUsize,
    Ordering,
  },
};

use parking_lot::Mutex;
use hoverlay::{
  Disposal,
  EventKind,
  EventKinds,
  EventRange,
  Position,
  Range,
  Rect,
  RegistryError,
  TooltipContent,
  TooltipDisplay,
  TooltipProvider,
  TooltipRegistry,
  TooltipSink,
  TooltipText,
};

fn mouse_range() -> EventRange {
  EventRange {
    range:    Range::point(Position::new(0, 2)),
    position: Position::new(0, 2),
    kind:     EventKind::Mouse,
  }
}

fn content(text: &str) -> TooltipContent {
  TooltipContent::new(Range::point(Position::new(0, 2)), text)
}

/// Provider that records its invocations and answers with a fixed result.
fn probe(
  owner: &str,
  log: &Arc<Mutex<Vec<String>>>,
  answer: Option<&str>,
) -> TooltipProvider {
  let log = log.clone();
  let name = owner.to_string();
  let answer = answer.map(str::to_owned);
  TooltipProvider::new(owner, move |_range| {
    let log = log.clone();
    let name = name.clone();
    let answer = answer.clone();
    async move {
      log.lock().push(name);
      Ok(answer.map(|text| content(&text)))
    }
  })
}

#[derive(Default)]
struct RecordingSink {
  shown:  Mutex<Vec<(EventKind, String)>>,
  hidden: Mutex<Vec<EventKind>>,
}

impl RecordingSink {
  fn texts(&self) -> Vec<String> {
    self.shown.lock().iter().map(|(_, text)| text.clone()).collect()
  }
}

impl TooltipSink for RecordingSink {
  fn show(&self, kind: EventKind, content: &TooltipContent) {
    let text = match &content.text {
      TooltipText::Plain(text) => text.clone(),
      TooltipText::Highlighted { text, .. } => text.clone(),
      TooltipText::Html(html) => html.clone(),
    };
    self.shown.lock().push((kind, text));
  }

  fn hide(&self, kind: EventKind) {
    self.hidden.lock().push(kind);
  }

  fn bounding_box(&self) -> Option<Rect> {
    None
  }

  fn set_subdued(&self, _subdued: bool) {}
}

#[tokio::test(flavor = "current_thread")]
async fn highest_priority_wins_and_short_circuits() {
  let registry = TooltipRegistry::new();
  let log = Arc::new(Mutex::new(Vec::new()));

  let _p1 = registry
    .register(probe("p1", &log, None).with_priority(10))
    .unwrap();
  let _p2 = registry
    .register(probe("p2", &log, Some("from p2")).with_priority(20))
    .unwrap();
  let _p3 = registry
    .register(probe("p3", &log, Some("from p3")).with_priority(5))
    .unwrap();

  let result = registry.query(mouse_range()).await.unwrap();
  assert_eq!(result.text, TooltipText::Plain("from p2".into()));
  // p2 answered, so p1 and p3 were never consulted.
  assert_eq!(*log.lock(), vec!["p2".to_string()]);
}

#[tokio::test(flavor = "current_thread")]
async fn empty_answers_fall_through_in_priority_order() {
  let registry = TooltipRegistry::new();
  let log = Arc::new(Mutex::new(Vec::new()));

  let _low = registry
    .register(probe("low", &log, Some("low answer")).with_priority(1))
    .unwrap();
  let _high = registry
    .register(probe("high", &log, None).with_priority(50))
    .unwrap();

  let result = registry.query(mouse_range()).await.unwrap();
  assert_eq!(result.text, TooltipText::Plain("low answer".into()));
  assert_eq!(*log.lock(), vec!["high".to_string(), "low".to_string()]);
}

#[tokio::test(flavor = "current_thread")]
async fn equal_priority_breaks_ties_by_registration_order() {
  let registry = TooltipRegistry::new();
  let log = Arc::new(Mutex::new(Vec::new()));

  let _first = registry
    .register(probe("first", &log, Some("first answer")).with_priority(10))
    .unwrap();
  let _second = registry
    .register(probe("second", &log, Some("second answer")).with_priority(10))
    .unwrap();

  let result = registry.query(mouse_range()).await.unwrap();
  assert_eq!(result.text, TooltipText::Plain("first answer".into()));
}

#[tokio::test(flavor = "current_thread")]
async fn failing_provider_is_skipped_not_fatal() {
  let registry = TooltipRegistry::new();
  let log = Arc::new(Mutex::new(Vec::new()));

  let _broken = registry
    .register(
      TooltipProvider::new("broken", |_range| {
        async { anyhow::bail!("backend crashed") }
      })
      .with_priority(50),
    )
    .unwrap();
  let _fallback = registry
    .register(probe("fallback", &log, Some("still here")).with_priority(1))
    .unwrap();

  let result = registry.query(mouse_range()).await.unwrap();
  assert_eq!(result.text, TooltipText::Plain("still here".into()));

  // The failure did not unregister the provider either.
  let again = registry.query(mouse_range()).await.unwrap();
  assert_eq!(again.text, TooltipText::Plain("still here".into()));
}

#[tokio::test(flavor = "current_thread")]
async fn kind_subscription_filters_providers() {
  let registry = TooltipRegistry::new();
  let log = Arc::new(Mutex::new(Vec::new()));

  let _sel_only = registry
    .register(
      probe("sel-only", &log, Some("selection answer"))
        .with_kinds(EventKinds::SELECTION),
    )
    .unwrap();

  assert!(registry.query(mouse_range()).await.is_none());
  assert!(log.lock().is_empty());

  let sel = EventRange {
    range:    Range::new(Position::new(1, 0), Position::new(1, 4)),
    position: Position::new(1, 0),
    kind:     EventKind::Selection,
  };
  assert!(registry.query(sel).await.is_some());
  assert_eq!(*log.lock(), vec!["sel-only".to_string()]);
}

#[tokio::test(flavor = "current_thread")]
async fn disposal_removes_provider_from_future_queries() {
  let registry = TooltipRegistry::new();
  let log = Arc::new(Mutex::new(Vec::new()));

  let handle = registry
    .register(probe("transient", &log, Some("answer")))
    .unwrap();
  assert!(registry.query(mouse_range()).await.is_some());

  handle.dispose();
  assert!(registry.query(mouse_range()).await.is_none());
  // Exactly the one invocation from before the disposal.
  assert_eq!(log.lock().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn duplicate_owner_is_rejected_until_disposed() {
  let registry = TooltipRegistry::new();
  let log = Arc::new(Mutex::new(Vec::new()));

  let first = registry.register(probe("dup", &log, None)).unwrap();
  let err = registry.register(probe("dup", &log, None)).unwrap_err();
  assert_eq!(err, RegistryError::DuplicateOwner("dup".into()));

  first.dispose();
  assert!(registry.register(probe("dup", &log, None)).is_ok());
}

#[tokio::test(flavor = "current_thread")]
async fn provider_may_dispose_another_mid_query() {
  let registry = Arc::new(TooltipRegistry::new());
  let log = Arc::new(Mutex::new(Vec::new()));

  let victim = registry
    .register(probe("victim", &log, Some("victim answer")).with_priority(1))
    .unwrap();
  let stashed: Arc<Mutex<Option<Disposal>>> = Arc::new(Mutex::new(Some(victim)));

  let stash = stashed.clone();
  let _saboteur = registry
    .register(
      TooltipProvider::new("saboteur", move |_range| {
        let stash = stash.clone();
        async move {
          if let Some(disposal) = stash.lock().take() {
            disposal.dispose();
          }
          Ok(None)
        }
      })
      .with_priority(50),
    )
    .unwrap();

  // The in-flight query iterates its snapshot, so the victim still gets
  // asked this time round.
  let first = registry.query(mouse_range()).await;
  assert_eq!(
    first.map(|c| c.text),
    Some(TooltipText::Plain("victim answer".into()))
  );

  // Next query sees the updated table.
  assert!(registry.query(mouse_range()).await.is_none());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn stale_response_cannot_clobber_newer_one() {
  let registry = Arc::new(TooltipRegistry::new());
  let sink = Arc::new(RecordingSink::default());
  let display = Arc::new(TooltipDisplay::new(sink.clone()));

  let delay_ms = Arc::new(AtomicU64::new(100));
  let calls = Arc::new(AtomicUsize::new(0));
  let provider = {
    let delay_ms = delay_ms.clone();
    let calls = calls.clone();
    TooltipProvider::new("slowpoke", move |_range| {
      let delay = delay_ms.load(Ordering::SeqCst);
      let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
      async move {
        if delay > 0 {
          tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        Ok(Some(content(&format!("call {n}"))))
      }
    })
  };
  let _keep = registry.register(provider).unwrap();

  // First request: provider stalls on a slow backend.
  let slow = {
    let registry = registry.clone();
    let display = display.clone();
    tokio::spawn(async move { registry.show(mouse_range(), &display).await })
  };
  // Let the slow request issue its sequence number and start waiting.
  for _ in 0..10 {
    tokio::task::yield_now().await;
  }
  assert_eq!(calls.load(Ordering::SeqCst), 1);

  // Second request for the same kind answers instantly and is applied.
  delay_ms.store(0, Ordering::SeqCst);
  let applied = registry.show(mouse_range(), &display).await;
  assert!(applied);
  assert_eq!(sink.texts(), vec!["call 2".to_string()]);

  // The slow response finally lands, is recognized as stale, and is
  // discarded without touching the display.
  let slow_applied = slow.await.unwrap();
  assert!(!slow_applied);
  assert_eq!(sink.texts(), vec!["call 2".to_string()]);
  assert!(sink.hidden.lock().is_empty());
}
