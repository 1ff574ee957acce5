//! Crawl engine - main orchestration logic
//!
//! The engine drives the two phases of a run: listing discovery, which
//! expands the static seed pages into leaf URLs, and leaf fetching, which
//! pulls budgeted batches off the frontier and processes them through a
//! bounded pool of workers. Each successfully fetched leaf is handed to
//! the extractor and then the sink; one bad page never aborts the crawl,
//! only proxy exhaustion or a broken sink does.

use crate::config::Config;
use crate::crawler::fetcher::{FetchOutcome, FetcherConfig, RateLimitedFetcher};
use crate::crawler::frontier::{CrawlBudget, Frontier, FrontierUrl};
use crate::crawler::parser::parse_listing;
use crate::extract::Extractor;
use crate::proxy::ProxyPool;
use crate::sink::Sink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Counters summarizing a finished run
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub listings_fetched: usize,
    pub listings_failed: usize,
    pub leaves_fetched: usize,
    pub leaves_failed: usize,
    pub records_stored: usize,
    pub duplicates_skipped: usize,
    pub extraction_failures: usize,
    pub urls_visited: usize,
}

impl CrawlReport {
    fn apply(&mut self, status: LeafStatus) {
        match status {
            LeafStatus::Stored => {
                self.leaves_fetched += 1;
                self.records_stored += 1;
            }
            LeafStatus::Duplicate => {
                self.leaves_fetched += 1;
                self.duplicates_skipped += 1;
            }
            LeafStatus::ExtractionFailed => {
                self.leaves_fetched += 1;
                self.extraction_failures += 1;
            }
            LeafStatus::FetchFailed => self.leaves_failed += 1,
        }
    }
}

/// Terminal state of one leaf URL
enum LeafStatus {
    Stored,
    Duplicate,
    ExtractionFailed,
    FetchFailed,
}

/// Orchestrates frontier expansion and leaf fetching
pub struct CrawlEngine {
    config: Arc<Config>,
    frontier: Frontier,
    fetcher: Arc<RateLimitedFetcher>,
    extractor: Arc<dyn Extractor>,
    sink: Arc<dyn Sink>,
    shutdown: Arc<AtomicBool>,
}

impl CrawlEngine {
    /// Builds the engine: proxy pool from config, fetcher on top of it,
    /// empty frontier rooted at the site's base URL
    pub fn new(
        config: Config,
        extractor: Arc<dyn Extractor>,
        sink: Arc<dyn Sink>,
    ) -> crate::Result<Self> {
        let base_url = Url::parse(&config.site.base_url)?;
        let pool = Arc::new(Mutex::new(ProxyPool::from_config(&config.proxy)));
        let fetcher = Arc::new(RateLimitedFetcher::new(
            pool,
            FetcherConfig::new(&config.crawler, &config.proxy),
        )?);

        Ok(Self {
            config: Arc::new(config),
            frontier: Frontier::new(base_url),
            fetcher,
            extractor,
            sink,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that stops dispatch of new fetches when set. In-flight fetches
    /// complete or time out normally.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Runs the crawl, fetching at most `take` leaf pages
    ///
    /// Returns `Err(ProxyExhausted)` when the pool started with proxies,
    /// emptied, and direct connections are disallowed. Hitting the leaf
    /// budget is normal termination, not an error.
    pub async fn run(&mut self, take: u32) -> crate::Result<CrawlReport> {
        let started = Instant::now();
        let mut report = CrawlReport::default();
        let mut budget = CrawlBudget::new(take);

        let seeded = self.frontier.seed_listing_pages();
        tracing::info!(seeds = seeded, take, "starting crawl");

        self.discover(&mut report).await?;
        tracing::info!(
            listings = report.listings_fetched,
            leaves_pending = self.frontier.pending_leaf_count(),
            "discovery complete"
        );

        self.fetch_leaves(&mut report, &mut budget).await?;

        report.urls_visited = self.frontier.visited_count();
        tracing::info!(
            stored = report.records_stored,
            fetched = report.leaves_fetched,
            failed = report.leaves_failed,
            visited = report.urls_visited,
            elapsed = ?started.elapsed(),
            "crawl complete"
        );

        Ok(report)
    }

    /// Phase 1: fetch every pending listing page and expand it, following
    /// pagination until the chains end or the shutdown flag is set
    async fn discover(&mut self, report: &mut CrawlReport) -> crate::Result<()> {
        while let Some(entry) = self.frontier.next_listing() {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested, stopping discovery");
                break;
            }

            match self.fetcher.fetch(&entry.url).await? {
                FetchOutcome::Success { body, .. } => {
                    report.listings_fetched += 1;
                    let base = Url::parse(&entry.url)?;
                    let parsed =
                        parse_listing(&String::from_utf8_lossy(&body), &base, &self.config.site);
                    let (new_listings, new_leaves) =
                        self.frontier.expand_listing(&entry.url, &parsed);
                    tracing::debug!(
                        url = %entry.url,
                        new_listings,
                        new_leaves,
                        "expanded listing"
                    );
                }
                FetchOutcome::Retryable { error, proxy } => {
                    report.listings_failed += 1;
                    tracing::warn!(
                        url = %entry.url,
                        proxy = proxy.as_deref().unwrap_or("direct"),
                        error,
                        "listing fetch failed, skipping"
                    );
                }
                FetchOutcome::Fatal { error, proxy } => {
                    report.listings_failed += 1;
                    tracing::warn!(
                        url = %entry.url,
                        proxy = proxy.as_deref().unwrap_or("direct"),
                        error,
                        "listing fetch fatal, skipping"
                    );
                }
            }

            self.frontier.mark_visited(&entry.url);
        }

        Ok(())
    }

    /// Phase 2: process leaf URLs in budgeted batches through a bounded
    /// worker pool. Leaves are independent once discovered, so order does
    /// not matter.
    async fn fetch_leaves(
        &mut self,
        report: &mut CrawlReport,
        budget: &mut CrawlBudget,
    ) -> crate::Result<()> {
        let workers = self.config.crawler.max_concurrent_fetches as usize;
        let semaphore = Arc::new(Semaphore::new(workers));

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested, stopping leaf dispatch");
                break;
            }

            let batch = self.frontier.next_batch(workers * 2, budget);
            if batch.is_empty() {
                if budget.is_exhausted() {
                    tracing::info!(consumed = budget.consumed(), "leaf budget exhausted");
                }
                break;
            }

            let mut tasks: JoinSet<crate::Result<(String, LeafStatus)>> = JoinSet::new();
            for entry in batch {
                budget.consume();
                let semaphore = semaphore.clone();
                let fetcher = self.fetcher.clone();
                let extractor = self.extractor.clone();
                let sink = self.sink.clone();
                tasks.spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("semaphore is never closed");
                    process_leaf(entry, fetcher, extractor, sink).await
                });
            }

            let mut halt = None;
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok((url, status))) => {
                        self.frontier.mark_visited(&url);
                        report.apply(status);
                    }
                    Ok(Err(e)) => {
                        // Remember the first fatal error but drain the
                        // remaining in-flight workers before halting.
                        if halt.is_none() {
                            halt = Some(e);
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "leaf worker panicked");
                    }
                }
            }

            if let Some(e) = halt {
                tracing::error!(error = %e, "halting crawl");
                return Err(e);
            }
        }

        Ok(())
    }
}

/// Fetches one leaf page and runs it through the extractor and sink
///
/// Retryable and fatal fetch outcomes, and extraction failures, terminate
/// only this URL. Proxy exhaustion and sink errors propagate and halt the
/// run.
async fn process_leaf(
    entry: FrontierUrl,
    fetcher: Arc<RateLimitedFetcher>,
    extractor: Arc<dyn Extractor>,
    sink: Arc<dyn Sink>,
) -> crate::Result<(String, LeafStatus)> {
    match fetcher.fetch(&entry.url).await? {
        FetchOutcome::Success { body, .. } => match extractor.extract(&entry.url, &body) {
            Ok(record) => {
                if sink.store(&record)? {
                    tracing::info!(url = %entry.url, title = %record.title, "stored record");
                    Ok((entry.url, LeafStatus::Stored))
                } else {
                    tracing::debug!(url = %entry.url, title = %record.title, "duplicate skipped");
                    Ok((entry.url, LeafStatus::Duplicate))
                }
            }
            Err(e) => {
                tracing::warn!(url = %entry.url, error = %e, "extraction failed, dropping page");
                Ok((entry.url, LeafStatus::ExtractionFailed))
            }
        },
        FetchOutcome::Retryable { error, proxy } => {
            tracing::warn!(
                url = %entry.url,
                proxy = proxy.as_deref().unwrap_or("direct"),
                error,
                "leaf fetch failed after retries, moving on"
            );
            Ok((entry.url, LeafStatus::FetchFailed))
        }
        FetchOutcome::Fatal { error, proxy } => {
            tracing::warn!(
                url = %entry.url,
                proxy = proxy.as_deref().unwrap_or("direct"),
                error,
                "leaf fetch fatal, moving on"
            );
            Ok((entry.url, LeafStatus::FetchFailed))
        }
    }
}
