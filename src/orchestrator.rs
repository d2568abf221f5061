//! One orchestration cycle: redundant scrape attempts fanned out over tokio
//! tasks and fanned back into a single consumer.
//!
//! ```text
//! worker 1..N ─┬─ products ─→ consumer ─ settle ─→ Exporter
//!              ├─ errors ───→ consumer ─→ Lifecycle::request_shutdown
//!              └─ fatal ────→ Lifecycle::escalate_fatal
//! ```
//!
//! Every worker scrapes the same search term and page count. The consumer
//! handles one event at a time, so exports triggered from here never overlap
//! each other; overlap with the periodic export loop is prevented by the
//! shared [`Exporter`].
//!
//! A fatal escalation abandons the cycle: workers that have not finished
//! stop, and no further batch is exported.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::{AppError, Lifecycle, Result};
use crate::domain::Product;
use crate::scraper::PageScraper;
use crate::store::{Exporter, Store};

pub const DEFAULT_WORKERS: usize = 5;

/// What each cycle scrapes and how it reacts to failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub search_term: String,

    /// Listing pages per attempt (default: 5)
    pub pages: usize,

    /// Concurrent, identical attempts per cycle (default: 5)
    pub workers: usize,

    /// Pause before exporting a finished batch, in seconds (default: 10)
    pub settle_delay_secs: u64,

    /// Request process shutdown when an attempt fails (default: true)
    pub shutdown_on_attempt_error: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            search_term: "Handphone".to_string(),
            pages: 5,
            workers: DEFAULT_WORKERS,
            settle_delay_secs: 10,
            shutdown_on_attempt_error: true,
        }
    }
}

impl ScrapeConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Attempts that delivered a product list
    pub batches: usize,
    pub products: usize,
    pub exports: usize,
    pub export_failures: usize,
    /// Attempt errors, in arrival order
    pub errors: Vec<String>,
}

pub struct Orchestrator<S: Store + Send + Sync + 'static> {
    scraper: Arc<PageScraper>,
    store: Arc<S>,
    exporter: Arc<Exporter>,
    lifecycle: Lifecycle,
    config: ScrapeConfig,
    export_path: PathBuf,
}

impl<S: Store + Send + Sync + 'static> Orchestrator<S> {
    pub fn new(
        scraper: Arc<PageScraper>,
        store: Arc<S>,
        exporter: Arc<Exporter>,
        lifecycle: Lifecycle,
        config: ScrapeConfig,
        export_path: PathBuf,
    ) -> Self {
        Self {
            scraper,
            store,
            exporter,
            lifecycle,
            config,
            export_path,
        }
    }

    /// Run one cycle and wait until every attempt has finished.
    pub async fn run(&self) -> CycleReport {
        let workers = self.config.workers;
        info!(
            "Running web scraper: {} workers, \"{}\", {} pages",
            workers, self.config.search_term, self.config.pages
        );

        let (products_tx, mut products_rx) = mpsc::channel::<Vec<Product>>(workers.max(1));
        let (errors_tx, mut errors_rx) = mpsc::channel::<AppError>(workers.max(1));

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let scraper = self.scraper.clone();
            let store = self.store.clone();
            let lifecycle = self.lifecycle.clone();
            let products_tx = products_tx.clone();
            let errors_tx = errors_tx.clone();
            let search_term = self.config.search_term.clone();
            let pages = self.config.pages;

            handles.push(tokio::spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = lifecycle.failure_escalated() => {
                        debug!("Worker {} stopped after a fatal error", worker);
                        return;
                    }
                    result = scrape_and_save(&scraper, store.as_ref(), &search_term, pages) => result,
                };

                match result {
                    Ok(products) => {
                        debug!("Worker {} saved {} products", worker, products.len());
                        let _ = products_tx.send(products).await;
                    }
                    Err(e) if e.is_fatal() => lifecycle.escalate_fatal(e),
                    Err(e) => {
                        let _ = errors_tx.send(e).await;
                    }
                }
            }));
        }

        // Both channels close once every worker is done.
        tokio::spawn(async move {
            for result in join_all(handles).await {
                if let Err(e) = result {
                    error!("Scrape worker join error: {}", e);
                }
            }
            drop(products_tx);
            drop(errors_tx);
        });

        let mut report = CycleReport::default();
        loop {
            tokio::select! {
                biased;
                _ = self.lifecycle.failure_escalated() => {
                    warn!("Abandoning scrape cycle after a fatal error");
                    break;
                }
                batch = products_rx.recv() => {
                    let Some(products) = batch else { break };
                    report.batches += 1;
                    report.products += products.len();

                    tokio::time::sleep(self.config.settle_delay()).await;
                    if self.lifecycle.has_failed() {
                        break;
                    }
                    info!("Web scraping done, saving to {}", self.export_path.display());
                    match self.exporter.export(self.store.as_ref(), &self.export_path).await {
                        Ok(_) => report.exports += 1,
                        Err(e) => {
                            report.export_failures += 1;
                            error!("Error saving to CSV: {}", e);
                        }
                    }
                }
                Some(err) = errors_rx.recv() => self.attempt_failed(err, &mut report),
            }
        }

        while let Ok(err) = errors_rx.try_recv() {
            self.attempt_failed(err, &mut report);
        }

        info!(
            "Scrape cycle complete: {} batches, {} exports, {} errors",
            report.batches,
            report.exports,
            report.errors.len()
        );
        match self.store.count_products() {
            Ok(total) => info!("{} products stored", total),
            Err(e) => warn!("Could not count stored products: {}", e),
        }
        report
    }

    fn attempt_failed(&self, err: AppError, report: &mut CycleReport) {
        warn!("Error scraping products: {}", err);
        report.errors.push(err.to_string());

        if self.config.shutdown_on_attempt_error {
            self.lifecycle.request_shutdown("scrape attempt failed");
        }
    }
}

/// One scrape attempt: scrape, then insert every product. The first failed
/// insert aborts the rest and becomes the attempt's error.
pub async fn scrape_and_save<S: Store + ?Sized>(
    scraper: &PageScraper,
    store: &S,
    search_term: &str,
    pages: usize,
) -> Result<Vec<Product>> {
    let products = scraper.scrape(search_term, pages).await?;

    for product in &products {
        store.insert_product(product)?;
    }

    Ok(products)
}
