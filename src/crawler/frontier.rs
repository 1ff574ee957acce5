//! Crawl frontier: discovered URLs, visited set, and the leaf-page budget
//!
//! The frontier owns both halves of the crawl's URL bookkeeping: the
//! pending queues (listing and leaf) and the visited set, which doubles as
//! the run's permanent audit trail. A URL enters pending at most once over
//! the crawl's lifetime, keyed by its normalized form, so cyclic pagination
//! terminates by membership rather than by a hop counter.

use crate::crawler::parser::ParsedListing;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// What a discovered URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// A category or pagination page whose content is links
    Listing,

    /// A terminal content page, the crawl's actual target
    Leaf,
}

/// A URL queued for fetching
#[derive(Debug, Clone)]
pub struct FrontierUrl {
    pub url: String,
    pub kind: UrlKind,
    /// The listing page this URL was discovered on, if any
    pub discovered_from: Option<String>,
}

/// Process-wide counter bounding total leaf fetches
///
/// Mutated only by the engine; the frontier reads it to stop handing out
/// work once the budget is spent.
#[derive(Debug, Clone)]
pub struct CrawlBudget {
    max_leaf_pages: u32,
    consumed: u32,
}

impl CrawlBudget {
    pub fn new(max_leaf_pages: u32) -> Self {
        Self {
            max_leaf_pages,
            consumed: 0,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.max_leaf_pages.saturating_sub(self.consumed)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn consume(&mut self) {
        self.consumed += 1;
    }

    pub fn consumed(&self) -> u32 {
        self.consumed
    }
}

/// The set of URLs to visit plus the set already visited
pub struct Frontier {
    base_url: Url,
    pending_listings: VecDeque<FrontierUrl>,
    pending_leaves: VecDeque<FrontierUrl>,
    /// Every normalized URL ever enqueued; guards the at-most-once insert
    seen: HashSet<String>,
    /// Normalized URLs whose fetch completed (or was abandoned)
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            pending_listings: VecDeque::new(),
            pending_leaves: VecDeque::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
        }
    }

    /// Enqueues the fixed top-level listing pages: one per alphabetic
    /// letter plus the numeric/symbol bucket. This enumeration is static
    /// and known up front, not discovered.
    pub fn seed_listing_pages(&mut self) -> usize {
        let mut added = 0;
        for letter in ('a'..='z').map(String::from).chain(["0-9".to_string()]) {
            let url = format!(
                "{}/alpha/{}.html",
                self.base_url.as_str().trim_end_matches('/'),
                letter
            );
            if self.enqueue(FrontierUrl {
                url,
                kind: UrlKind::Listing,
                discovered_from: None,
            }) {
                added += 1;
            }
        }
        added
    }

    /// Enqueues a URL unless it was ever seen before. Returns whether the
    /// URL was actually added.
    pub fn enqueue(&mut self, entry: FrontierUrl) -> bool {
        let key = normalize(&entry.url);
        if !self.seen.insert(key) {
            return false;
        }

        match entry.kind {
            UrlKind::Listing => self.pending_listings.push_back(entry),
            UrlKind::Leaf => self.pending_leaves.push_back(entry),
        }
        true
    }

    /// Feeds the links extracted from a fetched listing page back into the
    /// frontier: pagination links as further listings, article links as
    /// leaves. Returns `(new_listings, new_leaves)`; URLs already seen are
    /// silently skipped.
    pub fn expand_listing(&mut self, page_url: &str, parsed: &ParsedListing) -> (usize, usize) {
        let mut new_listings = 0;
        for link in &parsed.pagination_links {
            if self.enqueue(FrontierUrl {
                url: link.clone(),
                kind: UrlKind::Listing,
                discovered_from: Some(page_url.to_string()),
            }) {
                new_listings += 1;
            }
        }

        let mut new_leaves = 0;
        for link in &parsed.leaf_links {
            if self.enqueue(FrontierUrl {
                url: link.clone(),
                kind: UrlKind::Leaf,
                discovered_from: Some(page_url.to_string()),
            }) {
                new_leaves += 1;
            }
        }

        (new_listings, new_leaves)
    }

    /// Pops the next unvisited listing page
    pub fn next_listing(&mut self) -> Option<FrontierUrl> {
        self.pending_listings.pop_front()
    }

    /// Returns up to `limit` unvisited leaf URLs, further bounded by what
    /// is left of the crawl budget
    pub fn next_batch(&mut self, limit: usize, budget: &CrawlBudget) -> Vec<FrontierUrl> {
        let take = limit.min(budget.remaining() as usize);
        let mut batch = Vec::with_capacity(take);
        while batch.len() < take {
            match self.pending_leaves.pop_front() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        batch
    }

    /// Records a URL as visited. Idempotent; a URL already visited is
    /// silently skipped on every future discovery.
    pub fn mark_visited(&mut self, url: &str) {
        let key = normalize(url);
        self.seen.insert(key.clone());
        self.visited.insert(key);
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&normalize(url))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_leaf_count(&self) -> usize {
        self.pending_leaves.len()
    }

    pub fn pending_listing_count(&self) -> usize {
        self.pending_listings.len()
    }
}

/// Normalizes a URL string for dedup: lowercased host, no fragment, no
/// trailing slash (except root). Unparseable strings dedup on their
/// trimmed text.
///
/// # Arguments
///
/// * `url` - URL string to normalize
///
/// # Returns
///
/// The canonical form used as the frontier's dedup key
///
/// # Examples
///
/// ```
/// use monograph::crawler::normalize;
///
/// assert_eq!(
///     normalize("https://Example.com/entry/a/#section"),
///     "https://example.com/entry/a"
/// );
/// ```
pub fn normalize(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url.trim()) else {
        return url.trim().to_string();
    };

    parsed.set_fragment(None);

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontier() -> Frontier {
        Frontier::new(Url::parse("https://catalog.example.com").unwrap())
    }

    fn leaf(url: &str, from: &str) -> FrontierUrl {
        FrontierUrl {
            url: url.to_string(),
            kind: UrlKind::Leaf,
            discovered_from: Some(from.to_string()),
        }
    }

    fn listing(html_leaves: &[&str], pagination: &[&str]) -> ParsedListing {
        ParsedListing {
            leaf_links: html_leaves.iter().map(|s| s.to_string()).collect(),
            pagination_links: pagination.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_seed_enumerates_27_listing_pages() {
        let mut frontier = frontier();
        assert_eq!(frontier.seed_listing_pages(), 27);
        assert_eq!(frontier.pending_listing_count(), 27);

        let first = frontier.next_listing().unwrap();
        assert_eq!(first.url, "https://catalog.example.com/alpha/a.html");
        assert_eq!(first.kind, UrlKind::Listing);

        let mut last = None;
        while let Some(entry) = frontier.next_listing() {
            last = Some(entry);
        }
        assert_eq!(last.unwrap().url, "https://catalog.example.com/alpha/0-9.html");
    }

    #[test]
    fn test_seeding_twice_adds_nothing() {
        let mut frontier = frontier();
        frontier.seed_listing_pages();
        assert_eq!(frontier.seed_listing_pages(), 0);
        assert_eq!(frontier.pending_listing_count(), 27);
    }

    #[test]
    fn test_expand_listing_dedups_across_listings() {
        // L1 yields {A, B} plus pagination to L2; L2 yields {B, C}.
        // The batch must contain exactly {A, B, C}.
        let mut frontier = frontier();

        let l1 = "https://catalog.example.com/alpha/a.html";
        let l2 = "https://catalog.example.com/alpha/a.html?page=2";
        let a = "https://catalog.example.com/entry/a1.html";
        let b = "https://catalog.example.com/entry/b1.html";
        let c = "https://catalog.example.com/entry/c1.html";

        let (new_listings, new_leaves) = frontier.expand_listing(l1, &listing(&[a, b], &[l2]));
        assert_eq!((new_listings, new_leaves), (1, 2));

        let (new_listings, new_leaves) = frontier.expand_listing(l2, &listing(&[b, c], &[]));
        assert_eq!((new_listings, new_leaves), (0, 1));

        let budget = CrawlBudget::new(10);
        let batch = frontier.next_batch(10, &budget);
        let urls: Vec<&str> = batch.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec![a, b, c]);
    }

    #[test]
    fn test_visited_url_never_requeued() {
        let mut frontier = frontier();
        let url = "https://catalog.example.com/entry/a1.html";

        frontier.mark_visited(url);
        assert!(!frontier.enqueue(leaf(url, "somewhere")));
        assert_eq!(frontier.pending_leaf_count(), 0);
    }

    #[test]
    fn test_mark_visited_idempotent() {
        let mut frontier = frontier();
        let url = "https://catalog.example.com/entry/a1.html";

        frontier.mark_visited(url);
        frontier.mark_visited(url);
        assert_eq!(frontier.visited_count(), 1);
        assert!(frontier.is_visited(url));
    }

    #[test]
    fn test_next_batch_respects_budget() {
        // 15 discovered leaves, budget of 10: exactly 10 come out, 5 stay.
        let mut frontier = frontier();
        for i in 0..15 {
            frontier.enqueue(leaf(
                &format!("https://catalog.example.com/entry/{}.html", i),
                "l1",
            ));
        }

        let budget = CrawlBudget::new(10);
        let batch = frontier.next_batch(100, &budget);
        assert_eq!(batch.len(), 10);
        assert_eq!(frontier.pending_leaf_count(), 5);
    }

    #[test]
    fn test_next_batch_respects_limit() {
        let mut frontier = frontier();
        for i in 0..5 {
            frontier.enqueue(leaf(
                &format!("https://catalog.example.com/entry/{}.html", i),
                "l1",
            ));
        }

        let budget = CrawlBudget::new(100);
        assert_eq!(frontier.next_batch(2, &budget).len(), 2);
        assert_eq!(frontier.next_batch(100, &budget).len(), 3);
    }

    #[test]
    fn test_exhausted_budget_yields_empty_batch() {
        let mut frontier = frontier();
        frontier.enqueue(leaf("https://catalog.example.com/entry/x.html", "l1"));

        let mut budget = CrawlBudget::new(1);
        budget.consume();
        assert!(budget.is_exhausted());
        assert!(frontier.next_batch(10, &budget).is_empty());
    }

    #[test]
    fn test_normalize_strips_fragment_and_trailing_slash() {
        assert_eq!(
            normalize("https://Example.com/entry/a/#section"),
            "https://example.com/entry/a"
        );
        assert_eq!(normalize("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_dedup_by_normalized_form() {
        let mut frontier = frontier();
        assert!(frontier.enqueue(leaf("https://catalog.example.com/entry/a.html", "l1")));
        assert!(!frontier.enqueue(leaf("https://catalog.example.com/entry/a.html#top", "l2")));
        assert_eq!(frontier.pending_leaf_count(), 1);
    }
}
