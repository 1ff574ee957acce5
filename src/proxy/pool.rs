//! Proxy pool with usage tracking and retirement
//!
//! The pool owns every proxy endpoint known to the crawl and is the only
//! place mutation happens: selection, success/failure accounting, and
//! retirement all go through `acquire`, `record_success`, and
//! `record_failure`. A retired proxy is removed permanently and never
//! re-queued.

use crate::config::ProxyConfig;
use std::time::{Duration, Instant};

/// Usage record for a single proxy endpoint
///
/// `window_start` is set on the first request after activation and never
/// reset; once the window ages out or the request count reaches the ceiling,
/// the record is retired.
#[derive(Debug, Clone)]
pub struct ProxyRecord {
    pub endpoint: String,
    pub request_count: u32,
    pub window_start: Option<Instant>,
}

impl ProxyRecord {
    fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            request_count: 0,
            window_start: None,
        }
    }

    /// Whether this proxy must be retired before further use
    fn due_for_retirement(&self, ceiling: u32, window: Duration, now: Instant) -> bool {
        if self.request_count >= ceiling {
            return true;
        }
        if let Some(start) = self.window_start {
            if now.duration_since(start) > window {
                return true;
            }
        }
        false
    }
}

/// Distinguishes "no proxies were ever configured" from "the pool emptied
/// at runtime". Only the latter can mean exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMode {
    /// Zero proxies supplied; every fetch goes direct and the pool can
    /// never be exhausted.
    Direct,

    /// Started with at least one proxy; an empty active set is terminal.
    Proxied,
}

/// Pool of active proxy endpoints, treated as a stack: the top proxy is
/// handed out until it retires, matching the operational preference for
/// exhausting one proxy before moving to the next. The first-configured
/// endpoint sits on top.
pub struct ProxyPool {
    active: Vec<ProxyRecord>,
    mode: PoolMode,
    request_ceiling: u32,
    window: Duration,
}

impl ProxyPool {
    /// Creates a pool from a list of endpoints. An empty list puts the pool
    /// in direct mode.
    ///
    /// Endpoints are pushed in reverse so the first-listed one ends up on
    /// top of the stack and is exhausted first.
    pub fn new(endpoints: Vec<String>, request_ceiling: u32, window: Duration) -> Self {
        let mode = if endpoints.is_empty() {
            PoolMode::Direct
        } else {
            PoolMode::Proxied
        };

        Self {
            active: endpoints.into_iter().rev().map(ProxyRecord::new).collect(),
            mode,
            request_ceiling,
            window,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(
            config.endpoints.clone(),
            config.request_ceiling,
            Duration::from_secs(config.window_secs),
        )
    }

    /// Returns the endpoint of the currently active proxy, retiring any
    /// exhausted ones first, or `None` if the pool is empty. Callers fall
    /// back to a direct connection when permitted.
    pub fn acquire(&mut self) -> Option<String> {
        self.acquire_at(Instant::now())
    }

    /// `acquire` with an explicit clock, so retirement-by-window is
    /// testable without sleeping.
    pub fn acquire_at(&mut self, now: Instant) -> Option<String> {
        while let Some(top) = self.active.last() {
            if !top.due_for_retirement(self.request_ceiling, self.window, now) {
                return Some(top.endpoint.clone());
            }
            if let Some(retired) = self.active.pop() {
                tracing::info!(
                    proxy = %retired.endpoint,
                    requests = retired.request_count,
                    "retiring exhausted proxy"
                );
            }
        }
        None
    }

    /// Records a completed request through the given proxy. The usage
    /// window opens on the first request after activation.
    pub fn record_success(&mut self, endpoint: &str) {
        self.record_success_at(endpoint, Instant::now());
    }

    pub fn record_success_at(&mut self, endpoint: &str, now: Instant) {
        if let Some(record) = self.active.iter_mut().find(|r| r.endpoint == endpoint) {
            if record.request_count == 0 {
                record.window_start = Some(now);
            }
            record.request_count += 1;
        }
    }

    /// Retires the given proxy immediately. Any transport-level failure is
    /// grounds for rotation; endpoints in this domain are unreliable and
    /// short-lived.
    pub fn record_failure(&mut self, endpoint: &str) {
        let before = self.active.len();
        self.active.retain(|r| r.endpoint != endpoint);
        if self.active.len() < before {
            tracing::warn!(proxy = %endpoint, "retiring failed proxy");
        }
    }

    /// True only when the pool started with proxies and has none left.
    pub fn is_exhausted(&self) -> bool {
        self.mode == PoolMode::Proxied && self.active.is_empty()
    }

    pub fn mode(&self) -> PoolMode {
        self.mode
    }

    /// Number of proxies still active
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(endpoints: &[&str], ceiling: u32, window_secs: u64) -> ProxyPool {
        ProxyPool::new(
            endpoints.iter().map(|s| s.to_string()).collect(),
            ceiling,
            Duration::from_secs(window_secs),
        )
    }

    #[test]
    fn test_empty_pool_is_direct_mode() {
        let mut pool = pool_with(&[], 450, 3600);
        assert_eq!(pool.mode(), PoolMode::Direct);
        assert!(pool.acquire().is_none());
        assert!(!pool.is_exhausted());
    }

    #[test]
    fn test_acquire_returns_first_listed() {
        let mut pool = pool_with(&["http://p1:80", "http://p2:80"], 450, 3600);
        // p1 is listed first, so it is the stack top
        assert_eq!(pool.acquire().as_deref(), Some("http://p1:80"));
        // Repeated acquire without retirement keeps handing out the same proxy
        assert_eq!(pool.acquire().as_deref(), Some("http://p1:80"));
    }

    #[test]
    fn test_ceiling_retires_proxy_before_next_acquire() {
        // Pool seeded with p1, p2 and ceiling 2: two fetches exhaust p1,
        // the third rotates to p2.
        let mut pool = pool_with(&["http://p1:80", "http://p2:80"], 2, 3600);

        let first = pool.acquire().unwrap();
        assert_eq!(first, "http://p1:80");
        pool.record_success(&first);

        let second = pool.acquire().unwrap();
        assert_eq!(second, "http://p1:80");
        pool.record_success(&second);

        let third = pool.acquire().unwrap();
        assert_eq!(third, "http://p2:80");
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_acquired_proxy_never_over_ceiling() {
        let mut pool = pool_with(&["http://p1:80", "http://p2:80"], 3, 3600);
        for _ in 0..10 {
            let Some(endpoint) = pool.acquire() else {
                break;
            };
            let record = pool
                .active
                .iter()
                .find(|r| r.endpoint == endpoint)
                .unwrap();
            assert!(record.request_count < 3);
            pool.record_success(&endpoint);
        }
    }

    #[test]
    fn test_window_expiry_retires_proxy() {
        let mut pool = pool_with(&["http://p1:80"], 450, 3600);
        let start = Instant::now();

        let endpoint = pool.acquire_at(start).unwrap();
        pool.record_success_at(&endpoint, start);

        // Within the window the proxy stays active
        let later = start + Duration::from_secs(3599);
        assert!(pool.acquire_at(later).is_some());

        // Past the window it is retired, and the pool is exhausted
        let expired = start + Duration::from_secs(3601);
        assert!(pool.acquire_at(expired).is_none());
        assert!(pool.is_exhausted());
    }

    #[test]
    fn test_window_opens_on_first_use_only() {
        let mut pool = pool_with(&["http://p1:80"], 450, 3600);
        let start = Instant::now();

        pool.record_success_at("http://p1:80", start);
        pool.record_success_at("http://p1:80", start + Duration::from_secs(100));

        let record = &pool.active[0];
        assert_eq!(record.request_count, 2);
        assert_eq!(record.window_start, Some(start));
    }

    #[test]
    fn test_record_failure_retires_permanently() {
        let mut pool = pool_with(&["http://p1:80", "http://p2:80"], 450, 3600);

        pool.record_failure("http://p2:80");
        for _ in 0..5 {
            assert_ne!(pool.acquire().as_deref(), Some("http://p2:80"));
        }

        pool.record_failure("http://p1:80");
        assert!(pool.acquire().is_none());
        assert!(pool.is_exhausted());
    }

    #[test]
    fn test_record_failure_unknown_endpoint_is_noop() {
        let mut pool = pool_with(&["http://p1:80"], 450, 3600);
        pool.record_failure("http://nope:80");
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_record_success_after_retirement_is_noop() {
        let mut pool = pool_with(&["http://p1:80"], 450, 3600);
        pool.record_failure("http://p1:80");
        pool.record_success("http://p1:80");
        assert_eq!(pool.active_count(), 0);
    }
}
