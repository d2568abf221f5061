//! Stitches one listing page together with its detail pages.
//!
//! Name, description, price and image only exist on detail pages; rating and
//! merchant name only exist on the listing page. Detail fetches run one at a
//! time in listing order and each position gets a [`Marker`], so a failed
//! detail page drops its own rating and merchant without shifting its
//! neighbours.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::domain::{Product, ProductDetail};
use crate::fetcher::PageFetcher;
use crate::scraper::listing::ListingPage;
use crate::scraper::{AlignmentMode, FieldExtractor};

/// Outcome of the detail fetch for one listing position.
///
/// A detail page that loads but has an empty name is still `Detailed`: the
/// marker tracks the fetch, not the extracted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Detailed,
    Missing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOutcome {
    pub detailed: usize,
    pub missing: usize,
}

pub struct DetailAligner {
    fetcher: Arc<dyn PageFetcher + Send + Sync>,
    extractor: Arc<FieldExtractor>,
    mode: AlignmentMode,
}

impl DetailAligner {
    pub fn new(
        fetcher: Arc<dyn PageFetcher + Send + Sync>,
        extractor: Arc<FieldExtractor>,
        mode: AlignmentMode,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            mode,
        }
    }

    /// Fetch every detail page of `listing` and append the resulting
    /// products to `products`, with ratings and merchant names assigned.
    pub async fn align_page(
        &self,
        page: usize,
        listing_url: &Url,
        listing: &ListingPage,
        products: &mut Vec<Product>,
    ) -> PageOutcome {
        let mut markers = Vec::with_capacity(listing.links.len());

        for (position, link) in listing.links.iter().enumerate() {
            let Some(detail) = self.fetch_detail(listing_url, link.as_deref()).await else {
                markers.push(Marker::Missing);
                continue;
            };

            let mut product = Product::new(detail);
            if self.mode == AlignmentMode::Positional {
                if let Some(rating) = listing.ratings.get(position) {
                    product.rating = rating.clone();
                }
                if let Some(merchant) = listing.merchants.get(position) {
                    product.merchant_name = merchant.clone();
                }
            }
            products.push(product);
            markers.push(Marker::Detailed);
        }

        if self.mode == AlignmentMode::Legacy {
            let ratings = keep_detailed(&listing.ratings, &markers);
            let merchants = keep_detailed(&listing.merchants, &markers);
            assign_legacy(page, products, &ratings, &merchants);
        }

        let detailed = markers.iter().filter(|m| **m == Marker::Detailed).count();
        PageOutcome {
            detailed,
            missing: markers.len() - detailed,
        }
    }

    async fn fetch_detail(&self, listing_url: &Url, href: Option<&str>) -> Option<ProductDetail> {
        let Some(href) = href else {
            debug!("Listing item without a detail link");
            return None;
        };

        // Relative links resolve against the listing page; only a link that
        // cannot be joined counts as missing.
        let url = match listing_url.join(href) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping detail link {}: {}", href, e);
                return None;
            }
        };

        let page = match self.fetcher.fetch(url.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                debug!("Detail fetch failed for {}: {}", url, e);
                return None;
            }
        };

        if !page.is_success() {
            debug!("Detail page {} returned status {}", url, page.status);
            return None;
        }

        Some(self.extractor.parse_detail(&page.body))
    }
}

/// Listing texts whose position had a successful detail fetch. Texts past
/// the last marker are dropped.
pub fn keep_detailed(texts: &[String], markers: &[Marker]) -> Vec<String> {
    texts
        .iter()
        .zip(markers)
        .filter(|(_, marker)| **marker == Marker::Detailed)
        .map(|(text, _)| text.clone())
        .collect()
}

/// Rating/merchant assignment for [`AlignmentMode::Legacy`].
///
/// Page 1 assigns by index over the whole accumulated list. Later pages start
/// at `total - ratings - 1` and give `ratings[0]`/`merchants[0]` to every
/// product from there on, which also overwrites the last product of the
/// previous page when the counts line up.
pub fn assign_legacy(page: usize, products: &mut [Product], ratings: &[String], merchants: &[String]) {
    if page <= 1 {
        for (j, product) in products.iter_mut().enumerate() {
            if let (Some(rating), Some(merchant)) = (ratings.get(j), merchants.get(j)) {
                product.rating = rating.clone();
                product.merchant_name = merchant.clone();
            }
        }
        return;
    }

    let (Some(rating), Some(merchant)) = (ratings.first(), merchants.first()) else {
        return;
    };

    let start = products.len().saturating_sub(ratings.len() + 1);
    for product in &mut products[start..] {
        product.rating = rating.clone();
        product.merchant_name = merchant.clone();
    }
}
