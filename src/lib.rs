//! Monograph: a rotating-proxy catalog crawler
//!
//! This crate implements the fetch engine for crawling an A-Z catalog site:
//! URL discovery and deduplication (the frontier), proxy-pool selection and
//! retirement, and rate-limited, retrying HTTP fetches. Content extraction
//! and persistence are pluggable seams behind the `Extractor` and `Sink`
//! traits.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod proxy;
pub mod sink;

use thiserror::Error;

/// Main error type for Monograph operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url} via {}: {message}", .proxy.as_deref().unwrap_or("direct"))]
    Transport {
        url: String,
        proxy: Option<String>,
        message: String,
    },

    #[error("Redirect limit exceeded for {url}")]
    RedirectLimit { url: String },

    #[error("Proxy pool exhausted and direct connections are disallowed")]
    ProxyExhausted,

    #[error("Extraction error: {0}")]
    Extraction(#[from] extract::ExtractError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Monograph operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlReport, FetchOutcome, Frontier, RateLimitedFetcher};
pub use extract::{Extractor, PageRecord};
pub use proxy::ProxyPool;
pub use sink::Sink;
