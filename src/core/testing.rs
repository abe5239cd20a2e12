//! In-memory feed used by the core unit tests.

use crate::core::FeedTransport;
use crate::utils::error::{FeedError, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

pub(crate) fn chapter(id: &str, lang: &str, number: Option<f32>) -> Value {
    json!({
        "id": id,
        "type": "chapter",
        "attributes": {
            "chapter": number.map(|n| n.to_string()),
            "title": null,
            "translatedLanguage": lang,
            "externalUrl": null,
            "publishAt": "2022-01-02T00:27:11+00:00"
        },
        "relationships": []
    })
}

/// Serves slices of `items` while declaring `declared_total`, which may
/// disagree with the real item count.
pub(crate) struct MockFeed {
    declared_total: usize,
    items: Vec<Value>,
    fail_offset: Option<usize>,
    delay: fn(usize) -> Duration,
    manga: Option<Value>,
    calls: Mutex<Vec<(usize, usize)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFeed {
    pub fn new(declared_total: usize, items: Vec<Value>) -> Self {
        Self {
            declared_total,
            items,
            fail_offset: None,
            delay: |_| Duration::from_millis(2),
            manga: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn fail_at(mut self, offset: usize) -> Self {
        self.fail_offset = Some(offset);
        self
    }

    pub fn with_delay(mut self, delay: fn(usize) -> Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_manga(mut self, manga: Value) -> Self {
        self.manga = Some(manga);
        self
    }

    /// `(offset, limit)` of every feed request, in issue order.
    pub fn calls(&self) -> Vec<(usize, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight count even when the request future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn query_number(url: &Url, key: &str) -> usize {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0)
}

#[async_trait::async_trait]
impl FeedTransport for MockFeed {
    async fn get_text(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| FeedError::MalformedResponse {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !parsed.path().ends_with("/feed") {
            return Ok(json!({"result": "ok", "data": self.manga}).to_string());
        }

        let offset = query_number(&parsed, "offset");
        let limit = query_number(&parsed, "limit");
        self.calls.lock().unwrap().push((offset, limit));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep((self.delay)(offset)).await;
        drop(guard);

        if self.fail_offset == Some(offset) {
            return Ok(json!({
                "result": "error",
                "errors": [{"detail": "Rate limited"}, {"detail": "Try again later"}]
            })
            .to_string());
        }

        let start = offset.min(self.items.len());
        let end = (offset + limit).min(self.items.len());
        Ok(json!({
            "result": "ok",
            "data": &self.items[start..end],
            "total": self.declared_total
        })
        .to_string())
    }
}
