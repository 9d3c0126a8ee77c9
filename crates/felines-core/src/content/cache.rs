//! Memoizing content cache with in-flight de-duplication.
//!
//! Each key owns a slot holding the last good value, the last error, and
//! an optional in-flight request. The first caller for a key becomes the
//! leader and performs the request; later callers subscribe to the
//! leader's `watch` channel and receive the same outcome.
//!
//! The cache remembers the most recently requested key. A response for any
//! other key is discarded on arrival and its callers get
//! [`ContentFetchError::Superseded`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::source::ContentSource;
use crate::error::ContentFetchError;

pub const DEFAULT_FIELD: &str = "fact";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub key: String,
    pub text: String,
    pub fetched_at: DateTime<Utc>,
}

/// What a consumer sees for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentView {
    /// Never fetched, or invalidated.
    Empty,
    /// A request is in flight; no value is shown meanwhile.
    Pending,
    Ready(ContentItem),
    /// Last request failed; the previous value, if any, stays visible.
    Failed {
        last_good: Option<ContentItem>,
        error: ContentFetchError,
    },
}

impl ContentView {
    /// The value to display, if any.
    pub fn value(&self) -> Option<&ContentItem> {
        match self {
            ContentView::Ready(item) => Some(item),
            ContentView::Failed { last_good, .. } => last_good.as_ref(),
            ContentView::Empty | ContentView::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ContentView::Pending)
    }
}

type Outcome = Result<ContentItem, ContentFetchError>;

#[derive(Default)]
struct Slot {
    value: Option<ContentItem>,
    last_error: Option<ContentFetchError>,
    in_flight: Option<watch::Receiver<Option<Outcome>>>,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    displayed: Option<String>,
}

enum Role {
    Cached(ContentItem),
    Leader(watch::Sender<Option<Outcome>>),
    Follower(watch::Receiver<Option<Outcome>>),
}

pub struct ContentCache<S> {
    source: S,
    field: String,
    inner: Mutex<Inner>,
}

impl<S: ContentSource> ContentCache<S> {
    pub fn new(source: S) -> Self {
        Self::with_field(source, DEFAULT_FIELD)
    }

    /// Cache that extracts `field` from each JSON payload.
    pub fn with_field(source: S, field: impl Into<String>) -> Self {
        Self {
            source,
            field: field.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Cached value for `key`, requesting it if there is none.
    pub async fn fetch(&self, key: &str) -> Result<ContentItem, ContentFetchError> {
        self.load(key, false).await
    }

    /// Request `key` again even if a value is cached. Joins a request that
    /// is already in flight instead of starting a second one.
    pub async fn refetch(&self, key: &str) -> Result<ContentItem, ContentFetchError> {
        self.load(key, true).await
    }

    pub fn view(&self, key: &str) -> ContentView {
        let inner = self.lock();
        match inner.slots.get(key) {
            None => ContentView::Empty,
            Some(slot) if slot.in_flight.is_some() => ContentView::Pending,
            Some(slot) => match (&slot.value, &slot.last_error) {
                (last_good, Some(error)) => ContentView::Failed {
                    last_good: last_good.clone(),
                    error: error.clone(),
                },
                (Some(item), None) => ContentView::Ready(item.clone()),
                (None, None) => ContentView::Empty,
            },
        }
    }

    /// View of the most recently requested key.
    pub fn current(&self) -> ContentView {
        let key = self.lock().displayed.clone();
        match key {
            Some(key) => self.view(&key),
            None => ContentView::Empty,
        }
    }

    pub fn displayed_key(&self) -> Option<String> {
        self.lock().displayed.clone()
    }

    /// Drop the cached value and error for `key`. An in-flight request is
    /// left alone.
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.lock();
        if let Some(slot) = inner.slots.get_mut(key) {
            slot.value = None;
            slot.last_error = None;
            debug!(key, "content invalidated");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn load(&self, key: &str, force: bool) -> Outcome {
        match self.claim(key, force) {
            Role::Cached(item) => Ok(item),
            Role::Follower(rx) => {
                debug!(key, "joining in-flight request");
                wait_for(key, rx).await
            }
            Role::Leader(tx) => {
                let mut guard = InFlightGuard {
                    inner: &self.inner,
                    key,
                    armed: true,
                };
                let response = self.source.fetch(key).await;
                let outcome = self.settle(key, response);
                guard.armed = false;
                // Receivers may all be gone; that is fine.
                let _ = tx.send(Some(outcome.clone()));
                outcome
            }
        }
    }

    fn claim(&self, key: &str, force: bool) -> Role {
        let mut inner = self.lock();
        if inner.displayed.as_deref() != Some(key) {
            inner.displayed = Some(key.to_string());
        }
        let slot = inner.slots.entry(key.to_string()).or_default();

        if let Some(rx) = &slot.in_flight {
            return Role::Follower(rx.clone());
        }
        if !force {
            if let Some(item) = &slot.value {
                return Role::Cached(item.clone());
            }
        }
        let (tx, rx) = watch::channel(None);
        slot.in_flight = Some(rx);
        Role::Leader(tx)
    }

    fn settle(&self, key: &str, response: Result<serde_json::Value, ContentFetchError>) -> Outcome {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let superseded = inner.displayed.as_deref() != Some(key);
        let slot = inner.slots.entry(key.to_string()).or_default();
        slot.in_flight = None;

        if superseded {
            info!(key, "discarding superseded content response");
            return Err(ContentFetchError::Superseded {
                key: key.to_string(),
            });
        }

        match response.and_then(|body| extract_text(key, &self.field, &body)) {
            Ok(item) => {
                info!(key, chars = item.text.len(), "content fetched");
                slot.value = Some(item.clone());
                slot.last_error = None;
                Ok(item)
            }
            Err(e) => {
                warn!(key, error = %e, has_last_good = slot.value.is_some(), "content fetch failed");
                slot.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}

/// Clears the in-flight marker if the leader is dropped mid-request, so the
/// next call starts a fresh attempt instead of waiting forever.
struct InFlightGuard<'a> {
    inner: &'a Mutex<Inner>,
    key: &'a str,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(slot) = inner.slots.get_mut(self.key) {
            slot.in_flight = None;
        }
    }
}

async fn wait_for(key: &str, mut rx: watch::Receiver<Option<Outcome>>) -> Outcome {
    loop {
        let ready = rx.borrow_and_update().clone();
        if let Some(outcome) = ready {
            return outcome;
        }
        if rx.changed().await.is_err() {
            let last = rx.borrow().clone();
            return last.unwrap_or_else(|| {
                Err(ContentFetchError::Abandoned {
                    key: key.to_string(),
                })
            });
        }
    }
}

/// Pull the configured text field out of a JSON payload.
pub fn extract_text(key: &str, field: &str, body: &serde_json::Value) -> Outcome {
    let text = body
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ContentFetchError::MissingField {
            key: key.to_string(),
            field: field.to_string(),
        })?;
    Ok(ContentItem {
        key: key.to_string(),
        text: text.to_string(),
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Replays scripted responses after a delay and counts requests.
    struct FakeSource {
        responses: Mutex<VecDeque<Result<serde_json::Value, ContentFetchError>>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(responses: Vec<Result<serde_json::Value, ContentFetchError>>, delay_ms: u64) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                delay: Duration::from_millis(delay_ms),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ContentSource for FakeSource {
        async fn fetch(&self, key: &str) -> Result<serde_json::Value, ContentFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front();
            tokio::time::sleep(self.delay).await;
            next.unwrap_or_else(|| {
                Err(ContentFetchError::Request {
                    key: key.to_string(),
                    message: "script exhausted".into(),
                })
            })
        }
    }

    fn fact(text: &str) -> Result<serde_json::Value, ContentFetchError> {
        Ok(json!({ "fact": text, "length": text.len() }))
    }

    fn unavailable() -> Result<serde_json::Value, ContentFetchError> {
        Err(ContentFetchError::Status {
            key: "fact".into(),
            status: 503,
        })
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let cache = ContentCache::new(FakeSource::new(vec![fact("a")], 0));
        assert_eq!(cache.fetch("fact").await.unwrap().text, "a");
        assert_eq!(cache.fetch("fact").await.unwrap().text, "a");
        assert_eq!(cache.source().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_request() {
        let cache = Arc::new(ContentCache::new(FakeSource::new(vec![fact("shared")], 500)));

        let (a, b) = tokio::join!(cache.fetch("fact"), cache.fetch("fact"));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(cache.source().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refetch_during_flight_joins_it() {
        let cache = Arc::new(ContentCache::new(FakeSource::new(vec![fact("one"), fact("two")], 500)));

        let (a, b) = tokio::join!(cache.fetch("fact"), cache.refetch("fact"));
        assert_eq!(a.unwrap().text, "one");
        assert_eq!(b.unwrap().text, "one");
        assert_eq!(cache.source().calls(), 1);

        assert_eq!(cache.refetch("fact").await.unwrap().text, "two");
        assert_eq!(cache.source().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_view_hides_value_until_resolved() {
        let cache = Arc::new(ContentCache::new(FakeSource::new(vec![fact("old"), fact("new")], 500)));
        cache.fetch("fact").await.unwrap();

        let task = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.refetch("fact").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.view("fact").is_pending());
        assert_eq!(cache.view("fact").value(), None);

        task.await.unwrap().unwrap();
        assert_eq!(cache.view("fact").value().unwrap().text, "new");
    }

    #[tokio::test]
    async fn failure_keeps_last_good_value() {
        let cache = ContentCache::new(FakeSource::new(vec![fact("good"), unavailable(), fact("fresh")], 0));
        cache.fetch("fact").await.unwrap();

        let err = cache.refetch("fact").await.unwrap_err();
        assert!(matches!(err, ContentFetchError::Status { status: 503, .. }));
        match cache.view("fact") {
            ContentView::Failed { last_good, error } => {
                assert_eq!(last_good.unwrap().text, "good");
                assert_eq!(error, err);
            }
            other => panic!("expected Failed, got {other:?}"),
        }

        // A fresh request after failure goes back out.
        assert_eq!(cache.refetch("fact").await.unwrap().text, "fresh");
        assert_eq!(cache.source().calls(), 3);
        assert!(matches!(cache.view("fact"), ContentView::Ready(_)));
    }

    #[tokio::test]
    async fn failed_first_fetch_retries_on_next_call() {
        let cache = ContentCache::new(FakeSource::new(vec![unavailable(), fact("ok")], 0));
        assert!(cache.fetch("fact").await.is_err());
        assert_eq!(cache.view("fact").value(), None);
        assert_eq!(cache.fetch("fact").await.unwrap().text, "ok");
        assert_eq!(cache.source().calls(), 2);
    }

    #[tokio::test]
    async fn missing_field_is_an_error() {
        let cache = ContentCache::new(FakeSource::new(vec![Ok(json!({ "length": 3 }))], 0));
        let err = cache.fetch("fact").await.unwrap_err();
        assert_eq!(
            err,
            ContentFetchError::MissingField {
                key: "fact".into(),
                field: "fact".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_key_response_is_discarded() {
        let cache = Arc::new(ContentCache::new(FakeSource::new(vec![fact("old key"), fact("new key")], 500)));

        let stale = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.fetch("breed").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let fresh = cache.fetch("fact").await;

        assert_eq!(
            stale.await.unwrap().unwrap_err(),
            ContentFetchError::Superseded { key: "breed".into() }
        );
        assert_eq!(fresh.unwrap().text, "new key");
        assert_eq!(cache.displayed_key().as_deref(), Some("fact"));
        assert_eq!(cache.view("breed"), ContentView::Empty);
        assert_eq!(cache.current().value().unwrap().text, "new key");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_leader_does_not_wedge_the_key() {
        let cache = ContentCache::new(FakeSource::new(vec![fact("never"), fact("second")], 500));
        let attempt = tokio::time::timeout(Duration::from_millis(100), cache.fetch("fact")).await;
        assert!(attempt.is_err());
        assert!(!cache.view("fact").is_pending());

        assert_eq!(cache.fetch("fact").await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn invalidate_forces_new_request() {
        let cache = ContentCache::new(FakeSource::new(vec![fact("a"), fact("b")], 0));
        cache.fetch("fact").await.unwrap();
        cache.invalidate("fact");
        assert_eq!(cache.view("fact"), ContentView::Empty);
        assert_eq!(cache.fetch("fact").await.unwrap().text, "b");
    }
}
