pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::http::ReqwestTransport;
pub use crate::config::SourceConfig;
pub use crate::core::{
    aggregator::FeedAggregator,
    engine::ChapterEngine,
    fetcher::PageFetcher,
    locale::{select_text, LanguageTag, LocaleSelector},
    resolver::BranchResolver,
};
pub use crate::domain::model::{MangaDetails, MangaState, Page, RawItem, ResolvedChapter};
pub use crate::domain::ports::FeedTransport;
pub use crate::utils::error::{FeedError, Result};
