//! Pure text/HTML transforms shared by the extraction session.
//!
//! Everything in here operates on strings already pulled out of the
//! browser, so the helpers stay testable without a Chrome install.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::warn;

/// Price labels on the storefront carry this fixed currency prefix.
pub const CURRENCY_PREFIX: &str = "Rs.";

static DISCOUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+%?)").expect("discount pattern is valid"));

/// Parse a raw discount label into its numeric prefix.
///
/// Matches a leading numeric value optionally followed by a percent
/// sign and returns that prefix; trailing text is ignored. Labels
/// without a leading numeral yield `None`.
pub fn extract_discount(label: &str) -> Option<String> {
    DISCOUNT_PATTERN
        .captures(label)
        .map(|captures| captures[1].to_string())
}

/// Strip the storefront's currency prefix and surrounding whitespace
/// from a raw price label.
pub fn clean_price(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(CURRENCY_PREFIX)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Collect the `href` of every element matching `anchor_selector` in a
/// listing page's HTML, in document order.
pub fn listing_links(html: &str, anchor_selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(anchor_selector) else {
        warn!(selector = anchor_selector, "invalid listing link selector");
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Pull the `src` attribute out of an `<img>` fragment.
pub fn image_source(fragment: &str) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    let document = Html::parse_fragment(fragment);
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("src"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("20% off", Some("20%"))]
    #[case("15", Some("15"))]
    #[case("15 OFF today only", Some("15"))]
    #[case("7% OFF", Some("7%"))]
    #[case("off", None)]
    #[case("", None)]
    #[case("save 20%", None)]
    fn test_extract_discount(#[case] label: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_discount(label).as_deref(), expected);
    }

    #[rstest]
    #[case("Rs. 2,500", "2,500")]
    #[case("Rs.1999", "1999")]
    #[case("  Rs. 450  ", "450")]
    #[case("450", "450")]
    #[case("", "")]
    fn test_clean_price(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_price(raw), expected);
    }

    #[test]
    fn test_listing_links_document_order() {
        let html = r#"
            <html><body>
                <div class="product-grid">
                    <div class="product-item"><a class="product-image" href="/shoes/alpha"><img src="/t/a.jpg"></a></div>
                    <div class="product-item"><a class="product-image" href="/shoes/beta"><img src="/t/b.jpg"></a></div>
                    <div class="product-item"><a class="product-image" href="/shoes/gamma"><img src="/t/c.jpg"></a></div>
                </div>
                <a href="/cart">cart</a>
            </body></html>
        "#;

        let links = listing_links(html, "div.product-grid a.product-image");
        assert_eq!(links, vec!["/shoes/alpha", "/shoes/beta", "/shoes/gamma"]);
    }

    #[test]
    fn test_listing_links_empty_page() {
        assert!(listing_links("<html><body></body></html>", "a.product-image").is_empty());
    }

    #[test]
    fn test_listing_links_invalid_selector() {
        assert!(listing_links("<html></html>", ">>>").is_empty());
    }

    #[test]
    fn test_image_source() {
        let fragment = r#"<img class="gallery" src="https://cdn.example.com/shoe.png" alt="">"#;
        assert_eq!(
            image_source(fragment).as_deref(),
            Some("https://cdn.example.com/shoe.png")
        );

        assert_eq!(image_source("<div>no image here</div>"), None);
        assert_eq!(image_source(r#"<img alt="no src">"#), None);
    }
}
