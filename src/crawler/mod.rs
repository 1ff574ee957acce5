//! Crawler module: fetching, frontier management, and orchestration
//!
//! This module contains the fetch engine proper:
//! - Rate-limited HTTP fetching with proxy rotation and bounded retry
//! - Listing-page link extraction
//! - The frontier of pending and visited URLs, with the leaf budget
//! - The engine that drives discovery and leaf fetching

mod engine;
mod fetcher;
mod frontier;
mod parser;

pub use engine::{CrawlEngine, CrawlReport};
pub use fetcher::{build_http_client, FetchOutcome, FetcherConfig, RateLimitedFetcher};
pub use frontier::{normalize, CrawlBudget, Frontier, FrontierUrl, UrlKind};
pub use parser::{parse_listing, ParsedListing};

use crate::config::Config;
use crate::extract::Extractor;
use crate::sink::Sink;
use std::sync::Arc;

/// Runs a complete crawl with the given extractor and sink
///
/// Convenience wrapper over [`CrawlEngine`]: builds the engine from the
/// configuration and fetches up to `take` leaf pages.
pub async fn crawl(
    config: Config,
    take: u32,
    extractor: Arc<dyn Extractor>,
    sink: Arc<dyn Sink>,
) -> crate::Result<CrawlReport> {
    let mut engine = CrawlEngine::new(config, extractor, sink)?;
    engine.run(take).await
}
