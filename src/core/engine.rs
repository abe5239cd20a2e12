use crate::config::SourceConfig;
use crate::core::aggregator::FeedAggregator;
use crate::core::fetcher::{api_url, ApiResponse, PageFetcher};
use crate::core::locale::LocaleSelector;
use crate::core::resolver::BranchResolver;
use crate::core::{FeedTransport, ResolvedChapter};
use crate::domain::model::{MangaDetails, MangaRecord, MangaState};
use crate::utils::error::{FeedError, Result};
use serde_json::Map;
use tokio_util::sync::CancellationToken;

/// One feed-backed source: fetch, merge and resolve chapter lists for its titles.
///
/// Holds no per-request state, so one engine can serve concurrent calls for
/// different titles.
pub struct ChapterEngine<T: FeedTransport> {
    transport: T,
    config: SourceConfig,
    selector: LocaleSelector,
}

impl<T: FeedTransport> ChapterEngine<T> {
    pub fn new(transport: T, config: SourceConfig) -> Self {
        let selector = LocaleSelector::new(config.preferred_locales(), config.locale.fallback.clone());
        Self {
            transport,
            config,
            selector,
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn selector(&self) -> &LocaleSelector {
        &self.selector
    }

    fn aggregator(&self) -> FeedAggregator<'_, T> {
        FeedAggregator::new(
            PageFetcher::new(&self.transport, &self.config),
            &self.config.feed,
        )
    }

    fn resolver(&self) -> BranchResolver<'_> {
        BranchResolver::new(&self.config.source.name, &self.config.source.date_pattern)
    }

    pub async fn chapters(&self, manga_id: &str) -> Result<Vec<ResolvedChapter>> {
        let items = self.aggregator().load_all(manga_id).await?;
        Ok(self.resolver().resolve(items))
    }

    pub async fn chapters_cancellable(
        &self,
        manga_id: &str,
        token: &CancellationToken,
    ) -> Result<Vec<ResolvedChapter>> {
        let items = self
            .aggregator()
            .load_all_cancellable(manga_id, token)
            .await?;
        Ok(self.resolver().resolve(items))
    }

    /// Title metadata and the chapter list, fetched side by side.
    pub async fn details(&self, manga_id: &str) -> Result<MangaDetails> {
        let (record, chapters) =
            tokio::try_join!(self.manga_record(manga_id), self.chapters(manga_id))?;

        let attrs = record.attributes;
        let alt_titles: Map<String, serde_json::Value> =
            attrs.alt_titles.into_iter().flatten().collect();
        let content_rating = attrs.content_rating;

        Ok(MangaDetails {
            id: record.id.unwrap_or_else(|| manga_id.to_string()),
            title: self.selector.select(&attrs.title).map(str::to_string),
            alt_title: self.selector.select(&alt_titles).map(str::to_string),
            description: self.selector.select(&attrs.description).map(str::to_string),
            state: attrs.status.as_deref().and_then(MangaState::from_status),
            is_nsfw: matches!(content_rating.as_deref(), Some("erotica" | "pornographic")),
            content_rating,
            chapters,
        })
    }

    pub async fn details_cancellable(
        &self,
        manga_id: &str,
        token: &CancellationToken,
    ) -> Result<MangaDetails> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(FeedError::Cancelled),
            result = self.details(manga_id) => result,
        }
    }

    async fn manga_record(&self, manga_id: &str) -> Result<MangaRecord> {
        let mut url = api_url(&self.config, &["manga", manga_id])?;
        url.query_pairs_mut()
            .append_pair("includes[]", "artist")
            .append_pair("includes[]", "author")
            .append_pair("includes[]", "cover_art");

        tracing::debug!("Fetching title record for {}", manga_id);
        let body = self.transport.get_text(url.as_str()).await?;
        let response = ApiResponse::<MangaRecord>::parse(&body, url.as_str())?;
        response.data.ok_or_else(|| FeedError::MalformedResponse {
            url: url.to_string(),
            message: "missing 'data' in title response".to_string(),
        })
    }
}
