use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How ratings and merchant names read from a listing page are matched to
/// the products built from its detail pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    /// Page 1 is positional; every later page hands its first rating and
    /// merchant to all of its products, starting one product early.
    #[default]
    Legacy,
    /// Each detailed item takes the rating and merchant at its own listing
    /// position.
    Positional,
}

/// Configuration for the listing/detail scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Search endpoint of the listing site
    pub base_url: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    pub alignment: AlignmentMode,

    /// Listing anchors leading to detail pages (href is followed)
    pub item_selector: String,

    /// Rating text on the listing page
    pub rating_selector: String,

    /// Merchant name on the listing page
    pub merchant_selector: String,

    pub name_selector: String,
    pub description_selector: String,
    pub price_selector: String,

    /// Product image on the detail page (src is read)
    pub image_selector: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.tokopedia.com/search".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/99.0.9999.999 Safari/537.36"
                .to_string(),
            timeout_secs: 30,
            alignment: AlignmentMode::default(),
            item_selector: ".pcv3__info-content".to_string(),
            rating_selector: ".prd_rating-average-text".to_string(),
            merchant_selector: ".prd_link-shop-name".to_string(),
            name_selector: "h1[data-testid='lblPDPDetailProductName']".to_string(),
            description_selector: "div[data-testid='lblPDPDescriptionProduk']".to_string(),
            price_selector: ".price".to_string(),
            image_selector: ".css-1c345mg".to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
