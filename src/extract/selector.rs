//! Selector-based extractor for the configured site profile

use crate::config::SiteConfig;
use crate::extract::{ExtractError, Extractor, PageRecord};
use chrono::Utc;
use scraper::{Html, Selector};

/// Extracts records using the CSS selectors from the site profile
///
/// The title selector is required; content falls back to an empty string
/// when its selector matches nothing, and the image is optional. Image
/// elements are read from `data-src` first (lazy-loading sites) and then
/// `src`.
pub struct SelectorExtractor {
    site: SiteConfig,
}

impl SelectorExtractor {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    fn selector(&self, raw: &str) -> Option<Selector> {
        // Validated at config load; see config::validation.
        Selector::parse(raw).ok()
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, url: &str, body: &[u8]) -> Result<PageRecord, ExtractError> {
        let text = std::str::from_utf8(body).map_err(|_| ExtractError::InvalidBody {
            url: url.to_string(),
        })?;
        let document = Html::parse_document(text);

        let title = self
            .selector(&self.site.title_selector)
            .and_then(|s| document.select(&s).next())
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExtractError::MissingSelector {
                url: url.to_string(),
                selector: self.site.title_selector.clone(),
            })?;

        let content = self
            .selector(&self.site.content_selector)
            .and_then(|s| document.select(&s).next())
            .map(|el| el.inner_html())
            .unwrap_or_default();

        let image = self
            .selector(&self.site.image_selector)
            .and_then(|s| document.select(&s).next())
            .and_then(|el| {
                el.value()
                    .attr("data-src")
                    .or_else(|| el.value().attr("src"))
            })
            .map(|s| s.to_string());

        Ok(PageRecord {
            title,
            url: url.to_string(),
            content,
            image,
            fetched_at: Utc::now(),
        })
    }
}
