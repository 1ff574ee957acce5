use serde::Deserialize;

/// Main configuration structure for Monograph
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of leaf pages to fetch in one run
    #[serde(rename = "max-leaf-pages")]
    pub max_leaf_pages: u32,

    /// Number of concurrent leaf-page fetch workers
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// Upper bound of the randomized pre-request delay (seconds)
    #[serde(rename = "max-jitter-secs", default = "default_jitter")]
    pub max_jitter_secs: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum redirect hops before a fetch is declared fatal
    #[serde(rename = "max-redirects", default = "default_redirects")]
    pub max_redirects: u32,

    /// Attempts per URL before surfacing a retryable outcome
    #[serde(rename = "retry-attempts", default = "default_attempts")]
    pub retry_attempts: u32,
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Proxy endpoints, e.g. "http://1.2.3.4:8080". Supplied by an external
    /// proxy-discovery job; an empty list means every fetch goes direct.
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Whether fetches may fall back to a direct connection once the pool
    /// is exhausted. Deployment policy, not hard-coded.
    #[serde(rename = "allow-direct", default = "default_allow_direct")]
    pub allow_direct: bool,

    /// Requests a single proxy may serve before retirement
    #[serde(rename = "request-ceiling", default = "default_ceiling")]
    pub request_ceiling: u32,

    /// Age of a proxy's usage window before retirement (seconds)
    #[serde(rename = "window-secs", default = "default_window")]
    pub window_secs: u64,
}

// A config with no [proxy] table at all must behave exactly like an empty
// one: direct connections allowed, standard ceiling and window. The derived
// Default would zero the numeric fields and fail validation.
impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            allow_direct: default_allow_direct(),
            request_ceiling: default_ceiling(),
            window_secs: default_window(),
        }
    }
}

/// Catalog site profile: where the listing index lives and which CSS
/// selectors identify links and article content on its pages.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the catalog site, e.g. "https://catalog.example.com"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Selector matching leaf article links on a listing page
    #[serde(rename = "leaf-selector", default = "default_leaf_selector")]
    pub leaf_selector: String,

    /// Selector matching pagination links on a listing page
    #[serde(rename = "pagination-selector", default = "default_pagination_selector")]
    pub pagination_selector: String,

    /// Selector for the article title on a leaf page
    #[serde(rename = "title-selector", default = "default_title_selector")]
    pub title_selector: String,

    /// Selector for the article content container on a leaf page
    #[serde(rename = "content-selector", default = "default_content_selector")]
    pub content_selector: String,

    /// Selector for the article image on a leaf page
    #[serde(rename = "image-selector", default = "default_image_selector")]
    pub image_selector: String,
}

/// Output configuration for the bundled CSV sink
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV index file
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Directory receiving one article body file per record
    #[serde(rename = "articles-dir")]
    pub articles_dir: String,
}

fn default_concurrency() -> u32 {
    4
}

fn default_jitter() -> u64 {
    21
}

fn default_timeout() -> u64 {
    5
}

fn default_redirects() -> u32 {
    5
}

fn default_attempts() -> u32 {
    2
}

fn default_allow_direct() -> bool {
    true
}

fn default_ceiling() -> u32 {
    450
}

fn default_window() -> u64 {
    3600
}

fn default_leaf_selector() -> String {
    ".ddc-list-column-2 li a".to_string()
}

fn default_pagination_selector() -> String {
    ".ddc-paging li a".to_string()
}

fn default_title_selector() -> String {
    ".contentBox h1".to_string()
}

fn default_content_selector() -> String {
    ".contentBox".to_string()
}

fn default_image_selector() -> String {
    ".drugImageHolder img".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_config_default_matches_field_defaults() {
        let config = ProxyConfig::default();
        assert!(config.endpoints.is_empty());
        assert!(config.allow_direct);
        assert_eq!(config.request_ceiling, 450);
        assert_eq!(config.window_secs, 3600);
    }
}
