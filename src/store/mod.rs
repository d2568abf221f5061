pub mod export;
pub mod sqlite;

use std::path::Path;

use crate::app::Result;
use crate::domain::Product;

pub use export::{write_products_csv, Exporter};
pub use sqlite::SqliteStore;

/// Number of rows returned by [`Store::list_products`].
pub const LIST_LIMIT: usize = 100;

pub trait Store {
    /// Persist one product. There is no update path; every call is a new row.
    fn insert_product(&self, product: &Product) -> Result<()>;

    /// Top products ordered by rating, highest first, capped at [`LIST_LIMIT`].
    ///
    /// Ratings are stored as text, so the ordering is lexicographic.
    fn list_products(&self) -> Result<Vec<Product>>;

    fn count_products(&self) -> Result<usize>;

    fn export_to_file(&self, products: &[Product], path: &Path) -> Result<()> {
        write_products_csv(products, path)
    }
}
