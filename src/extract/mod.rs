//! Content extraction seam
//!
//! The fetch engine hands each successfully fetched leaf page to an
//! `Extractor`, which turns raw bytes into a structured record. Extraction
//! failure is non-fatal to the crawl: the page is logged and dropped.

mod selector;

pub use selector::SelectorExtractor;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Structured record extracted from one leaf page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Article title; also the sink's idempotence key
    pub title: String,

    /// The page URL the record came from
    pub url: String,

    /// Raw article markup; converting it to another format is a downstream
    /// concern
    pub content: String,

    /// Article image reference, when the page has one
    pub image: Option<String>,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Errors signaled by an extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("required selector '{selector}' matched nothing on {url}")]
    MissingSelector { url: String, selector: String },

    #[error("page body is not valid UTF-8 for {url}")]
    InvalidBody { url: String },
}

/// Turns a fetched page body into a structured record
pub trait Extractor: Send + Sync {
    fn extract(&self, url: &str, body: &[u8]) -> Result<PageRecord, ExtractError>;
}
