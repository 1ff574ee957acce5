//! Listing-page link extraction
//!
//! Listing pages carry two kinds of links the crawl cares about: leaf
//! article links and pagination links to further listing pages. Both are
//! located by CSS selectors from the site profile and resolved to absolute
//! URLs against the page they were found on.

use crate::config::SiteConfig;
use scraper::{Html, Selector};
use url::Url;

/// Links extracted from one listing page
#[derive(Debug, Clone, Default)]
pub struct ParsedListing {
    /// Absolute URLs of leaf article pages
    pub leaf_links: Vec<String>,

    /// Absolute URLs of further listing pages (pagination)
    pub pagination_links: Vec<String>,
}

/// Parses a listing page body and extracts leaf and pagination links
///
/// A listing page whose pagination selector matches nothing ends its
/// pagination chain; termination on cyclic pagination is the frontier's
/// job, via visited-set membership.
pub fn parse_listing(html: &str, base_url: &Url, site: &SiteConfig) -> ParsedListing {
    let document = Html::parse_document(html);

    ParsedListing {
        leaf_links: select_links(&document, &site.leaf_selector, base_url),
        pagination_links: select_links(&document, &site.pagination_selector, base_url),
    }
}

/// Collects the href targets of every element matched by `selector`
fn select_links(document: &Html, selector: &str, base_url: &Url) -> Vec<String> {
    // Selectors are validated at config load; a parse failure here means a
    // hand-built SiteConfig, which yields no links rather than a panic.
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None for fragment-only anchors, non-navigational schemes
/// (javascript:, mailto:, tel:, data:), and anything that fails to resolve
/// to an HTTP(S) URL.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn test_site() -> SiteConfig {
        SiteConfig {
            base_url: "https://catalog.example.com".to_string(),
            leaf_selector: ".entry-list li a".to_string(),
            pagination_selector: ".paging li a".to_string(),
            title_selector: "h1".to_string(),
            content_selector: ".content".to_string(),
            image_selector: ".content img".to_string(),
        }
    }

    fn base_url() -> Url {
        Url::parse("https://catalog.example.com/alpha/a.html").unwrap()
    }

    #[test]
    fn test_extracts_leaf_and_pagination_links() {
        let html = r#"
            <html><body>
                <ul class="entry-list">
                    <li><a href="/entry/aspirin.html">Aspirin</a></li>
                    <li><a href="/entry/atenolol.html">Atenolol</a></li>
                </ul>
                <ul class="paging">
                    <li><a href="/alpha/a.html?page=2">2</a></li>
                </ul>
            </body></html>
        "#;

        let parsed = parse_listing(html, &base_url(), &test_site());
        assert_eq!(
            parsed.leaf_links,
            vec![
                "https://catalog.example.com/entry/aspirin.html",
                "https://catalog.example.com/entry/atenolol.html"
            ]
        );
        assert_eq!(
            parsed.pagination_links,
            vec!["https://catalog.example.com/alpha/a.html?page=2"]
        );
    }

    #[test]
    fn test_links_outside_selectors_ignored() {
        let html = r#"
            <html><body>
                <nav><a href="/about">About</a></nav>
                <ul class="entry-list"><li><a href="/entry/x.html">X</a></li></ul>
            </body></html>
        "#;

        let parsed = parse_listing(html, &base_url(), &test_site());
        assert_eq!(parsed.leaf_links.len(), 1);
        assert!(parsed.pagination_links.is_empty());
    }

    #[test]
    fn test_missing_pagination_ends_chain() {
        let html = r#"<html><body><ul class="entry-list"></ul></body></html>"#;
        let parsed = parse_listing(html, &base_url(), &test_site());
        assert!(parsed.pagination_links.is_empty());
    }

    #[test]
    fn test_relative_links_resolved_against_page() {
        let html = r#"
            <html><body>
                <ul class="entry-list"><li><a href="aspirin.html">Aspirin</a></li></ul>
            </body></html>
        "#;

        let parsed = parse_listing(html, &base_url(), &test_site());
        assert_eq!(
            parsed.leaf_links,
            vec!["https://catalog.example.com/alpha/aspirin.html"]
        );
    }

    #[test]
    fn test_skips_non_navigational_schemes() {
        let html = r##"
            <html><body><ul class="entry-list">
                <li><a href="javascript:void(0)">JS</a></li>
                <li><a href="mailto:a@b.c">Mail</a></li>
                <li><a href="#top">Top</a></li>
                <li><a href="/entry/real.html">Real</a></li>
            </ul></body></html>
        "##;

        let parsed = parse_listing(html, &base_url(), &test_site());
        assert_eq!(parsed.leaf_links.len(), 1);
    }
}
