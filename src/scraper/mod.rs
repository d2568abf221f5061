//! Listing and detail page scraping.
//!
//! # Architecture
//!
//! ```text
//! listing page → FieldExtractor → DetailAligner → detail pages → Vec<Product>
//! ```
//!
//! [`PageScraper`] walks pages `1..=page_count` of one search term in order.
//! For every page the [`DetailAligner`] follows each listing item to its
//! detail page, one request at a time, and matches the listing-only fields
//! (rating, merchant name) back onto the products it built.

pub mod aligner;
mod config;
mod extractor;
pub mod listing;

pub use aligner::{DetailAligner, Marker, PageOutcome};
pub use config::{AlignmentMode, ScraperConfig};
pub use extractor::FieldExtractor;
pub use listing::{listing_url, ListingPage};

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::app::{AppError, Result};
use crate::domain::Product;
use crate::fetcher::PageFetcher;

pub struct PageScraper {
    fetcher: Arc<dyn PageFetcher + Send + Sync>,
    extractor: Arc<FieldExtractor>,
    aligner: DetailAligner,
    base_url: String,
}

impl PageScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher + Send + Sync>, config: &ScraperConfig) -> Result<Self> {
        let extractor = Arc::new(FieldExtractor::new(config)?);
        let aligner = DetailAligner::new(fetcher.clone(), extractor.clone(), config.alignment);

        Ok(Self {
            fetcher,
            extractor,
            aligner,
            base_url: config.base_url.clone(),
        })
    }

    /// Scrape `page_count` listing pages for `search_term`.
    ///
    /// Best effort: if a listing page cannot be requested, the products
    /// gathered so far are returned. A listing page answering with a
    /// non-success status is the one unrecoverable case and comes back as
    /// [`AppError::ListingStatus`].
    pub async fn scrape(&self, search_term: &str, page_count: usize) -> Result<Vec<Product>> {
        let mut products = Vec::new();

        for page in 1..=page_count {
            let url = listing_url(&self.base_url, search_term, page);
            let parsed_url = match Url::parse(&url) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Invalid listing URL {}: {}", url, e);
                    return Ok(products);
                }
            };

            let response = match self.fetcher.fetch(&url).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Listing request failed for page {}: {}", page, e);
                    return Ok(products);
                }
            };

            if !response.is_success() {
                return Err(AppError::ListingStatus {
                    url,
                    status: response.status,
                });
            }

            let listing = self.extractor.parse_listing(&response.body);
            let outcome = self
                .aligner
                .align_page(page, &parsed_url, &listing, &mut products)
                .await;

            info!(
                "Page {}: {} products, {} detail pages skipped",
                page, outcome.detailed, outcome.missing
            );
        }

        Ok(products)
    }
}
