use scraper::{ElementRef, Html, Selector};

use crate::app::{AppError, Result};
use crate::domain::ProductDetail;
use crate::scraper::listing::ListingPage;
use crate::scraper::ScraperConfig;

/// Compiled selectors for listing and detail pages.
///
/// Documents are parsed and dropped inside each call, so nothing returned
/// here borrows from the page.
pub struct FieldExtractor {
    item: Selector,
    rating: Selector,
    merchant: Selector,
    name: Selector,
    description: Selector,
    price: Selector,
    image: Selector,
}

impl FieldExtractor {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            item: compile(&config.item_selector)?,
            rating: compile(&config.rating_selector)?,
            merchant: compile(&config.merchant_selector)?,
            name: compile(&config.name_selector)?,
            description: compile(&config.description_selector)?,
            price: compile(&config.price_selector)?,
            image: compile(&config.image_selector)?,
        })
    }

    pub fn parse_listing(&self, body: &str) -> ListingPage {
        let doc = Html::parse_document(body);

        ListingPage {
            links: doc
                .select(&self.item)
                .map(|el| el.value().attr("href").map(str::to_string))
                .collect(),
            ratings: doc.select(&self.rating).map(element_text).collect(),
            merchants: doc.select(&self.merchant).map(element_text).collect(),
        }
    }

    pub fn parse_detail(&self, body: &str) -> ProductDetail {
        let doc = Html::parse_document(body);

        ProductDetail {
            name: all_text(&doc, &self.name),
            description: all_text(&doc, &self.description),
            price: all_text(&doc, &self.price),
            image_url: doc
                .select(&self.image)
                .next()
                .and_then(|el| el.value().attr("src"))
                .unwrap_or_default()
                .to_string(),
        }
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::Selector(format!("{}: {}", selector, e)))
}

/// Element text with surrounding whitespace trimmed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text of every match, concatenated in document order and trimmed as a
/// whole.
fn all_text(doc: &Html, selector: &Selector) -> String {
    doc.select(selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(&ScraperConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_listing_keeps_document_order() {
        let body = r#"
            <div>
              <a class="pcv3__info-content" href="https://shop.example.com/p/1">One</a>
              <span class="prd_rating-average-text">4.9</span>
              <span class="prd_link-shop-name"> ShopA </span>
            </div>
            <div>
              <a class="pcv3__info-content">No link</a>
              <span class="prd_rating-average-text">4.8</span>
              <span class="prd_link-shop-name">ShopB</span>
            </div>
        "#;

        let listing = extractor().parse_listing(body);
        assert_eq!(
            listing.links,
            vec![Some("https://shop.example.com/p/1".to_string()), None]
        );
        assert_eq!(listing.ratings, vec!["4.9", "4.8"]);
        assert_eq!(listing.merchants, vec!["ShopA", "ShopB"]);
    }

    #[test]
    fn test_parse_detail_fields() {
        let body = r#"
            <h1 data-testid="lblPDPDetailProductName">Handphone X</h1>
            <div data-testid="lblPDPDescriptionProduk">Great <b>phone</b></div>
            <div class="price">Rp2.000.000</div>
            <img class="css-1c345mg" src="https://img.example.com/x.jpg">
            <img class="css-1c345mg" src="https://img.example.com/second.jpg">
        "#;

        let detail = extractor().parse_detail(body);
        assert_eq!(detail.name, "Handphone X");
        assert_eq!(detail.description, "Great phone");
        assert_eq!(detail.price, "Rp2.000.000");
        assert_eq!(detail.image_url, "https://img.example.com/x.jpg");
    }

    #[test]
    fn test_parse_detail_missing_fields_are_empty() {
        let detail = extractor().parse_detail("<html><body><p>gone</p></body></html>");
        assert_eq!(detail, ProductDetail::default());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = ScraperConfig {
            price_selector: "div[".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            FieldExtractor::new(&config),
            Err(AppError::Selector(_))
        ));
    }
}
