use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::app::{AppError, Result};
use crate::domain::Product;
use crate::store::Store;

pub const CSV_HEADER: [&str; 6] = [
    "Name",
    "Description",
    "ImageURL",
    "Price",
    "Rating",
    "MerchantName",
];

/// Write `products` to `path` as CSV, replacing any existing file.
///
/// A pre-existing file that cannot be removed is reported as
/// [`AppError::CannotExport`] rather than the underlying IO error.
pub fn write_products_csv(products: &[Product], path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed previous export {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(_) => return Err(AppError::CannotExport),
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for product in products {
        writer.write_record(product.csv_record())?;
    }
    writer.flush()?;

    Ok(())
}

/// Single gate for every export target.
///
/// The orchestrator and the periodic export loop both go through one
/// `Exporter`, so a list-and-write never interleaves with another one.
#[derive(Default)]
pub struct Exporter {
    lock: Mutex<()>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export the current top products from `store` to `path`.
    ///
    /// Returns the number of rows written, header excluded.
    pub async fn export<S: Store + ?Sized>(&self, store: &S, path: &Path) -> Result<usize> {
        let _guard = self.lock.lock().await;

        let products = store.list_products()?;
        store.export_to_file(&products, path)?;

        info!("Exported {} products to {}", products.len(), path.display());
        Ok(products.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::ProductDetail;
    use crate::store::SqliteStore;

    fn product(name: &str, rating: &str) -> Product {
        let mut product = Product::new(ProductDetail {
            name: name.into(),
            description: format!("{} description", name),
            image_url: format!("https://img.example.com/{}.jpg", name),
            price: "Rp100.000".into(),
        });
        product.rating = rating.into();
        product.merchant_name = format!("{} shop", name);
        product
    }

    #[test]
    fn test_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        let products = vec![product("a", "4.9"), product("b", "4.8"), product("c", "4.7")];

        write_products_csv(&products, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), products.len() + 1);
        assert_eq!(lines[0], "Name,Description,ImageURL,Price,Rating,MerchantName");

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], "a");
        assert_eq!(&rows[1][4], "4.8");
        assert_eq!(&rows[2][5], "c shop");
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        fs::write(&path, "stale\nstale\nstale\nstale\nstale\n").unwrap();

        write_products_csv(&[product("a", "5.0")], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("stale"));
    }

    #[test]
    fn test_export_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files").join("products.csv");

        write_products_csv(&[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_export_fields_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        let mut p = product("a", "4.5");
        p.description = "fast, light".into();

        write_products_csv(&[p], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "fast, light");
    }

    #[test]
    fn test_unremovable_target_is_cannot_export() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the target path cannot be removed as a file.
        let path = dir.path().join("products.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inner"), "x").unwrap();

        let err = write_products_csv(&[], &path).unwrap_err();
        assert!(matches!(err, AppError::CannotExport));
    }

    #[tokio::test]
    async fn test_concurrent_exports_produce_complete_files() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        for i in 0..50 {
            store.insert_product(&product(&format!("p{}", i), "4.0")).unwrap();
        }
        let exporter = Arc::new(Exporter::new());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let exporter = exporter.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                exporter.export(store.as_ref(), &path).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 50);
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 51);
    }
}
