use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields read from a product's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDetail {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: String,
    /// Read from the listing page, empty until assigned.
    pub rating: String,
    /// Read from the listing page, empty until assigned.
    pub merchant_name: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl Product {
    /// Create a product for a detail page that was fetched just now.
    ///
    /// Every call mints a fresh identity; the same listing scraped twice
    /// yields two distinct records.
    pub fn new(detail: ProductDetail) -> Self {
        let now = Utc::now();
        Self {
            product_id: Self::generate_id(),
            name: detail.name,
            description: detail.description,
            image_url: detail.image_url,
            price: detail.price,
            rating: String::new(),
            merchant_name: String::new(),
            created_date: now,
            updated_date: Some(now),
        }
    }

    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn csv_record(&self) -> [&str; 6] {
        [
            &self.name,
            &self.description,
            &self.image_url,
            &self.price,
            &self.rating,
            &self.merchant_name,
        ]
    }
}
