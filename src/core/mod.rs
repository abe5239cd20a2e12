pub mod aggregator;
pub mod engine;
pub mod fetcher;
pub mod locale;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{Page, RawItem, ResolvedChapter};
pub use crate::domain::ports::FeedTransport;
pub use crate::utils::error::Result;
