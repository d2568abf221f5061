//! # shopcrawl
//!
//! A scheduled scraper for product search listings.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler → Orchestrator → PageScraper → DetailAligner → PageFetcher
//!                  │
//!                  └→ Store (insert) → Exporter (top 100 → CSV)
//! ```
//!
//! Every scrape cycle runs several identical scrape attempts in parallel.
//! Each attempt walks the listing pages of one search term, follows every
//! listing item to its detail page, matches the listing-only fields (rating,
//! merchant) back onto the products and saves them. Finished attempts
//! trigger an export; an independent loop exports on its own cadence.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scrape and export on a schedule
//! shopcrawl run
//!
//! # One scrape cycle
//! shopcrawl scrape
//!
//! # Write the current top 100 to a file
//! shopcrawl export -o top.csv
//! ```

/// Application context, error types and the process lifecycle.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetcher, scraper, exporter.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/shopcrawl/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Product`](domain::Product): one scraped product with a fresh UUID
pub mod domain;

/// HTTP fetching.
///
/// - [`PageFetcher`](fetcher::PageFetcher): Async trait for page fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Fan-out of redundant scrape attempts and fan-in of their results.
pub mod orchestrator;

/// Periodic scrape and export loops.
pub mod scheduler;

/// Listing and detail page scraping.
///
/// - [`PageScraper`](scraper::PageScraper): walks listing pages in order
/// - [`DetailAligner`](scraper::DetailAligner): detail fetches and rating/merchant alignment
/// - [`FieldExtractor`](scraper::FieldExtractor): CSS selector extraction
pub mod scraper;

/// SQLite persistence and CSV export.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
/// - [`Exporter`](store::Exporter): serialized exports
pub mod store;
