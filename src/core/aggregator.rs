use crate::config::FeedConfig;
use crate::core::fetcher::PageFetcher;
use crate::core::{FeedTransport, Page, RawItem};
use crate::utils::error::{FeedError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;

/// Reassembles a title's whole chapter feed from bounded pages.
///
/// The first page is fetched alone; its declared total (clamped to
/// `max_items`) decides how many tail pages follow. Tail pages run with at
/// most `parallelism` requests in flight and are merged back in page order,
/// whatever order they complete in. Any failing page fails the whole load.
pub struct FeedAggregator<'a, T: FeedTransport + ?Sized> {
    fetcher: PageFetcher<'a, T>,
    feed: &'a FeedConfig,
}

impl<'a, T: FeedTransport + ?Sized> FeedAggregator<'a, T> {
    pub fn new(fetcher: PageFetcher<'a, T>, feed: &'a FeedConfig) -> Self {
        Self { fetcher, feed }
    }

    pub async fn load_all(&self, manga_id: &str) -> Result<Vec<RawItem>> {
        if self.feed.page_size == 0 {
            return Err(FeedError::InvalidConfigValue {
                field: "feed.page_size".to_string(),
                value: "0".to_string(),
                reason: "Page size must be at least 1".to_string(),
            });
        }

        let first = self
            .fetcher
            .fetch(manga_id, 0, self.feed.first_page_size)
            .await?;
        if first.len() >= first.total {
            tracing::debug!("Feed for {} fits in the first page ({} items)", manga_id, first.len());
            return Ok(first.items);
        }

        let first_len = first.len();
        let page_size = self.feed.page_size;
        let left = first.total.min(self.feed.max_items).saturating_sub(first_len);
        let pages = left.div_ceil(page_size);
        if first.total > self.feed.max_items {
            tracing::warn!(
                "Feed for {} declares {} items; loading at most {}",
                manga_id,
                first.total,
                self.feed.max_items
            );
        }
        tracing::info!(
            "Loading {} more feed pages for {} ({} in flight)",
            pages,
            manga_id,
            self.feed.parallelism
        );

        // `buffered` keeps results in submission order
        let tail: Vec<Page> = stream::iter(0..pages)
            .map(|page| {
                self.fetcher
                    .fetch(manga_id, first_len + page * page_size, page_size)
            })
            .buffered(self.feed.parallelism.max(1))
            .try_collect()
            .await?;

        let mut items = Vec::with_capacity(first.total.min(self.feed.max_items));
        items.extend(first.items);
        for page in tail {
            items.extend(page.items);
        }
        tracing::info!("Loaded {} feed items for {}", items.len(), manga_id);
        Ok(items)
    }

    /// Like [`load_all`](Self::load_all), abandoning every in-flight request once `token` fires.
    pub async fn load_all_cancellable(
        &self,
        manga_id: &str,
        token: &CancellationToken,
    ) -> Result<Vec<RawItem>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::warn!("Feed load for {} cancelled", manga_id);
                Err(FeedError::Cancelled)
            }
            result = self.load_all(manga_id) => result,
        }
    }
}
