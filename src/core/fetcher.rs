use crate::config::{SourceConfig, MAX_PAGE_SIZE};
use crate::core::{FeedTransport, Page, RawItem};
use crate::utils::error::{FeedError, Result};
use crate::utils::validation;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

/// Upstream response envelope shared by every API endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<D> {
    #[serde(default)]
    pub result: String,
    pub data: Option<D>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}

impl<D: DeserializeOwned> ApiResponse<D> {
    /// Parses a body and turns a non-"ok" result into `RemoteData`.
    pub fn parse(body: &str, url: &str) -> Result<Self> {
        let response: Self =
            serde_json::from_str(body).map_err(|e| FeedError::MalformedResponse {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        if response.result == "ok" {
            return Ok(response);
        }
        let message = response
            .errors
            .iter()
            .filter_map(|e| e.detail.as_deref())
            .collect::<Vec<_>>()
            .join("\n");
        Err(FeedError::RemoteData {
            message: if message.is_empty() {
                format!("upstream returned result '{}'", response.result)
            } else {
                message
            },
            url: url.to_string(),
        })
    }
}

/// Issues single bounded-size requests against a title's chapter feed.
pub struct PageFetcher<'a, T: FeedTransport + ?Sized> {
    transport: &'a T,
    config: &'a SourceConfig,
}

impl<'a, T: FeedTransport + ?Sized> PageFetcher<'a, T> {
    pub fn new(transport: &'a T, config: &'a SourceConfig) -> Self {
        Self { transport, config }
    }

    pub async fn fetch(&self, manga_id: &str, offset: usize, limit: usize) -> Result<Page> {
        validation::validate_range("limit", limit, 1, MAX_PAGE_SIZE)?;

        let ceiling = self.config.feed.max_items;
        if offset >= ceiling {
            return Ok(Page::empty(ceiling));
        }
        let limit = limit.min(ceiling - offset);

        let url = self.feed_url(manga_id, offset, limit)?;
        tracing::debug!("Fetching feed page: offset={} limit={}", offset, limit);

        let body = self.transport.get_text(url.as_str()).await?;
        let response = ApiResponse::<Vec<RawItem>>::parse(&body, url.as_str())?;
        let total = response.total.ok_or_else(|| FeedError::MalformedResponse {
            url: url.to_string(),
            message: "missing 'total' in feed page".to_string(),
        })?;

        let page = Page {
            items: response.data.unwrap_or_default(),
            total,
        };
        tracing::debug!(
            "Feed page at offset {} returned {} items (declared total {})",
            offset,
            page.len(),
            page.total
        );
        Ok(page)
    }

    pub fn feed_url(&self, manga_id: &str, offset: usize, limit: usize) -> Result<Url> {
        let mut url = api_url(self.config, &["manga", manga_id, "feed"])?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("limit", &limit.to_string())
                .append_pair("includes[]", "scanlation_group")
                .append_pair("order[volume]", "asc")
                .append_pair("order[chapter]", "asc")
                .append_pair("offset", &offset.to_string());
            for rating in self.config.content_ratings() {
                query.append_pair("contentRating[]", &rating);
            }
        }
        Ok(url)
    }
}

/// `<api base>/<segments...>` with each segment percent-encoded.
pub(crate) fn api_url(config: &SourceConfig, segments: &[&str]) -> Result<Url> {
    let base = config.api_base_url();
    let mut url = Url::parse(&base).map_err(|e| FeedError::InvalidConfigValue {
        field: "source.api_base_url".to_string(),
        value: base.clone(),
        reason: format!("Invalid URL format: {}", e),
    })?;
    url.path_segments_mut()
        .map_err(|_| FeedError::InvalidConfigValue {
            field: "source.api_base_url".to_string(),
            value: base.clone(),
            reason: "URL cannot carry a path".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
