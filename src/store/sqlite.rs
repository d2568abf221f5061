use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rusqlite_migration::{Migrations, M};

use crate::app::{AppError, Result};
use crate::domain::Product;
use crate::store::{Store, LIST_LIMIT};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| AppError::Migration(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            AppError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }
}

impl Store for SqliteStore {
    fn insert_product(&self, product: &Product) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO products (product_id, name, description, image_url, price, rating, merchant_name, created_date, updated_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                product.product_id,
                product.name,
                product.description,
                product.image_url,
                product.price,
                product.rating,
                product.merchant_name,
                product.created_date.to_rfc3339(),
                product.updated_date.map(|dt| dt.to_rfc3339()),
            ],
        )?;

        Ok(())
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT product_id, name, description, image_url, price, rating, merchant_name, created_date, updated_date
             FROM products ORDER BY rating DESC, id ASC LIMIT ?1",
        )?;

        let products = stmt
            .query_map(params![LIST_LIMIT as i64], |row| {
                Ok(Product {
                    product_id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    image_url: row.get(3)?,
                    price: row.get(4)?,
                    rating: row.get(5)?,
                    merchant_name: row.get(6)?,
                    created_date: row
                        .get::<_, String>(7)
                        .ok()
                        .and_then(|s| Self::parse_datetime(&s))
                        .unwrap_or_else(Utc::now),
                    updated_date: row
                        .get::<_, Option<String>>(8)?
                        .and_then(|s| Self::parse_datetime(&s)),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(products)
    }

    fn count_products(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
