use crate::utils::error::Result;
use async_trait::async_trait;

/// The HTTP collaborator: fetch a URL, hand back the body text.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl<T: FeedTransport + ?Sized> FeedTransport for std::sync::Arc<T> {
    async fn get_text(&self, url: &str) -> Result<String> {
        (**self).get_text(url).await
    }
}
