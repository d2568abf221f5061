use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{AppError, Result};
use crate::app::Lifecycle;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::PageFetcher;
use crate::orchestrator::Orchestrator;
use crate::scheduler::Scheduler;
use crate::scraper::PageScraper;
use crate::store::sqlite::SqliteStore;
use crate::store::Exporter;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub scraper: Arc<PageScraper>,
    pub exporter: Arc<Exporter>,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(
            &config.scraper.user_agent,
            config.scraper.timeout(),
        )?);
        Self::with_fetcher(config, store, fetcher)
    }

    /// Build a context around an existing store and page fetcher.
    pub fn with_fetcher(
        config: Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn PageFetcher + Send + Sync>,
    ) -> Result<Self> {
        let scraper = Arc::new(PageScraper::new(fetcher, &config.scraper)?);

        Ok(Self {
            config,
            store,
            scraper,
            exporter: Arc::new(Exporter::new()),
        })
    }

    pub fn orchestrator(&self, lifecycle: &Lifecycle) -> Orchestrator<SqliteStore> {
        Orchestrator::new(
            self.scraper.clone(),
            self.store.clone(),
            self.exporter.clone(),
            lifecycle.clone(),
            self.config.scrape.clone(),
            self.config.export.cycle_path.clone(),
        )
    }

    pub fn scheduler(&self, lifecycle: &Lifecycle) -> Result<Scheduler<SqliteStore>> {
        Ok(Scheduler::new(
            Arc::new(self.orchestrator(lifecycle)),
            self.store.clone(),
            self.exporter.clone(),
            self.config.export.path.clone(),
            self.config.schedule.scrape_every()?,
            self.config.schedule.export_every()?,
        ))
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| AppError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("shopcrawl");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("shopcrawl.db"))
    }
}
