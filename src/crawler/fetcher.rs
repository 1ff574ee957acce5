//! Rate-limited HTTP fetcher with proxy rotation
//!
//! A single logical fetch: pick a proxy from the pool (or go direct), sleep
//! a randomized jitter delay, issue the GET, classify the outcome. Transport
//! failures retire the proxy in use and retry through a newly selected one;
//! the retry ceiling is an explicit loop bound, not recursion.

use crate::config::{CrawlerConfig, ProxyConfig};
use crate::proxy::ProxyPool;
use crate::CrawlError;
use rand::Rng;
use reqwest::{redirect::Policy, Client, Proxy, StatusCode};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Result of one logical fetch, after all attempts
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page body was fetched
    Success {
        body: Vec<u8>,
        /// Proxy that served the request, if any
        proxy: Option<String>,
    },

    /// Every attempt failed at the transport level; the caller decides
    /// whether to re-queue or abandon the URL
    Retryable {
        error: String,
        proxy: Option<String>,
    },

    /// The URL itself is bad (redirect limit, non-retryable HTTP status);
    /// no further attempts will help
    Fatal {
        error: String,
        proxy: Option<String>,
    },
}

/// Fetcher tuning knobs, assembled from the crawler and proxy config tables
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Upper bound of the randomized pre-request delay
    pub max_jitter_secs: u64,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Redirect hops followed transparently before the fetch is fatal
    pub max_redirects: u32,

    /// Attempts per URL before surfacing `Retryable`
    pub retry_attempts: u32,

    /// Whether a fetch may go direct when no proxy is available
    pub allow_direct: bool,
}

impl FetcherConfig {
    pub fn new(crawler: &CrawlerConfig, proxy: &ProxyConfig) -> Self {
        Self {
            max_jitter_secs: crawler.max_jitter_secs,
            request_timeout: Duration::from_secs(crawler.request_timeout_secs),
            max_redirects: crawler.max_redirects,
            retry_attempts: crawler.retry_attempts,
            allow_direct: proxy.allow_direct,
        }
    }
}

/// Builds an HTTP client, optionally routed through a proxy endpoint
///
/// reqwest binds a proxy at client-build time, so the fetcher builds a
/// fresh client whenever it rotates to a different proxy.
///
/// # Arguments
///
/// * `proxy` - Proxy endpoint URL, or `None` for a direct connection
/// * `config` - Timeout and redirect settings to apply
///
/// # Returns
///
/// * `Ok(Client)` - A configured client
/// * `Err(reqwest::Error)` - The proxy URL or client settings were rejected
pub fn build_http_client(
    proxy: Option<&str>,
    config: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout)
        .redirect(Policy::limited(config.max_redirects as usize))
        .gzip(true)
        .brotli(true);

    if let Some(endpoint) = proxy {
        builder = builder.proxy(Proxy::all(endpoint)?);
    }

    builder.build()
}

/// Performs rate-limited, retrying fetches through the shared proxy pool
pub struct RateLimitedFetcher {
    pool: Arc<Mutex<ProxyPool>>,
    direct_client: Client,
    config: FetcherConfig,
}

impl RateLimitedFetcher {
    pub fn new(pool: Arc<Mutex<ProxyPool>>, config: FetcherConfig) -> Result<Self, reqwest::Error> {
        let direct_client = build_http_client(None, &config)?;
        Ok(Self {
            pool,
            direct_client,
            config,
        })
    }

    /// Fetches one URL, rotating proxies on transport failure
    ///
    /// Each attempt selects the pool's active proxy (falling back to a
    /// direct connection when permitted), sleeps the jitter delay, and
    /// issues the GET.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to fetch
    ///
    /// # Returns
    ///
    /// * `Err(ProxyExhausted)` - pool started non-empty, emptied, and
    ///   direct connections are disallowed
    /// * `Fatal` - redirect limit exceeded or a non-retryable HTTP status
    /// * `Retryable` - all attempts failed at the transport level
    pub async fn fetch(&self, url: &str) -> crate::Result<FetchOutcome> {
        let mut last_error = String::new();
        let mut last_proxy = None;

        for attempt in 1..=self.config.retry_attempts {
            let proxy = self.select_proxy()?;

            self.jitter_delay().await;

            let client = match proxy.as_deref() {
                Some(endpoint) => build_http_client(Some(endpoint), &self.config)?,
                None => self.direct_client.clone(),
            };

            tracing::debug!(url, proxy = proxy.as_deref().unwrap_or("direct"), attempt, "fetching");

            match client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        match response.bytes().await {
                            Ok(body) => {
                                if let Some(endpoint) = &proxy {
                                    self.pool.lock().unwrap().record_success(endpoint);
                                }
                                return Ok(FetchOutcome::Success {
                                    body: body.to_vec(),
                                    proxy,
                                });
                            }
                            Err(e) => {
                                self.handle_transport_failure(url, &proxy, &e.to_string());
                                last_error = e.to_string();
                                last_proxy = proxy;
                            }
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        // The endpoint in use is being throttled or the
                        // upstream is struggling; rotate and try again.
                        self.handle_transport_failure(url, &proxy, &format!("HTTP {}", status));
                        last_error = format!("HTTP {}", status);
                        last_proxy = proxy;
                    } else {
                        tracing::warn!(
                            url,
                            proxy = proxy.as_deref().unwrap_or("direct"),
                            status = status.as_u16(),
                            "non-retryable HTTP status"
                        );
                        return Ok(FetchOutcome::Fatal {
                            error: format!("HTTP {}", status),
                            proxy,
                        });
                    }
                }
                Err(e) if e.is_redirect() => {
                    tracing::warn!(
                        url,
                        proxy = proxy.as_deref().unwrap_or("direct"),
                        "redirect limit exceeded"
                    );
                    return Ok(FetchOutcome::Fatal {
                        error: CrawlError::RedirectLimit {
                            url: url.to_string(),
                        }
                        .to_string(),
                        proxy,
                    });
                }
                Err(e) => {
                    self.handle_transport_failure(url, &proxy, &e.to_string());
                    last_error = e.to_string();
                    last_proxy = proxy;
                }
            }
        }

        Ok(FetchOutcome::Retryable {
            error: last_error,
            proxy: last_proxy,
        })
    }

    /// Picks the proxy for the next attempt, or `None` for a direct fetch
    fn select_proxy(&self) -> crate::Result<Option<String>> {
        let mut pool = self.pool.lock().unwrap();
        match pool.acquire() {
            Some(endpoint) => Ok(Some(endpoint)),
            None => {
                if pool.is_exhausted() && !self.config.allow_direct {
                    return Err(CrawlError::ProxyExhausted);
                }
                Ok(None)
            }
        }
    }

    /// Retires the proxy in use (if any) and logs the failure with enough
    /// context for post-hoc debugging of proxy-induced errors.
    fn handle_transport_failure(&self, url: &str, proxy: &Option<String>, error: &str) {
        tracing::warn!(
            url,
            proxy = proxy.as_deref().unwrap_or("direct"),
            error,
            "fetch attempt failed"
        );
        if let Some(endpoint) = proxy {
            self.pool.lock().unwrap().record_failure(endpoint);
        }
    }

    /// Sleeps a randomized delay in `[0, max_jitter]` seconds. This is a
    /// deliberate throttle applied before every request, direct fetches
    /// included. It blocks only the calling worker.
    async fn jitter_delay(&self) {
        if self.config.max_jitter_secs == 0 {
            return;
        }
        let secs = rand::thread_rng().gen_range(0..=self.config.max_jitter_secs);
        if secs > 0 {
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn test_config() -> FetcherConfig {
        FetcherConfig {
            max_jitter_secs: 0,
            request_timeout: Duration::from_secs(5),
            max_redirects: 5,
            retry_attempts: 2,
            allow_direct: true,
        }
    }

    fn shared_pool(endpoints: &[&str]) -> Arc<Mutex<ProxyPool>> {
        Arc::new(Mutex::new(ProxyPool::new(
            endpoints.iter().map(|s| s.to_string()).collect(),
            450,
            Duration::from_secs(3600),
        )))
    }

    #[test]
    fn test_build_direct_client() {
        let client = build_http_client(None, &test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_proxied_client() {
        let client = build_http_client(Some("http://10.0.0.1:8080"), &test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_proxy() {
        let client = build_http_client(Some("not a url"), &test_config());
        assert!(client.is_err());
    }

    #[test]
    fn test_select_proxy_prefers_pool() {
        let fetcher = RateLimitedFetcher::new(shared_pool(&["http://p1:80"]), test_config()).unwrap();
        assert_eq!(fetcher.select_proxy().unwrap().as_deref(), Some("http://p1:80"));
    }

    #[test]
    fn test_select_proxy_direct_when_pool_empty() {
        let fetcher = RateLimitedFetcher::new(shared_pool(&[]), test_config()).unwrap();
        assert!(fetcher.select_proxy().unwrap().is_none());
    }

    #[test]
    fn test_select_proxy_errors_on_exhaustion_without_fallback() {
        let pool = shared_pool(&["http://p1:80"]);
        pool.lock().unwrap().record_failure("http://p1:80");

        let mut config = test_config();
        config.allow_direct = false;

        let fetcher = RateLimitedFetcher::new(pool, config).unwrap();
        assert!(matches!(
            fetcher.select_proxy(),
            Err(CrawlError::ProxyExhausted)
        ));
    }

    #[tokio::test]
    async fn test_zero_jitter_returns_immediately() {
        let fetcher = RateLimitedFetcher::new(shared_pool(&[]), test_config()).unwrap();
        let start = Instant::now();
        fetcher.jitter_delay().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
