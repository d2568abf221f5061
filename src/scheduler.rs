//! Periodic scrape and export loops.
//!
//! Both loops hold a child token of the process [`Lifecycle`]: a shutdown
//! request stops each loop at its next check, and a cycle that is already
//! running is allowed to drain.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::app::{AppError, Lifecycle, Result};
use crate::orchestrator::Orchestrator;
use crate::store::{Exporter, Store};

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pause between scrape cycles (default: "10m")
    pub scrape_interval: String,
    /// Pause between periodic exports (default: "15m")
    pub export_interval: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scrape_interval: "10m".to_string(),
            export_interval: "15m".to_string(),
        }
    }
}

impl ScheduleConfig {
    pub fn scrape_every(&self) -> Result<Duration> {
        Self::parse_duration(&self.scrape_interval)
    }

    pub fn export_every(&self) -> Result<Duration> {
        Self::parse_duration(&self.export_interval)
    }

    fn parse_duration(s: &str) -> Result<Duration> {
        Self::parse_interval(s)
            .map(Duration::from_secs)
            .map_err(AppError::Config)
    }

    /// Parse interval string like "1h", "30m", "6h", "1d"
    pub fn parse_interval(s: &str) -> std::result::Result<u64, String> {
        let s = s.trim().to_lowercase();

        let (count, unit, scale) = if let Some(hours) = s.strip_suffix('h') {
            (hours, "hours", 3600)
        } else if let Some(minutes) = s.strip_suffix('m') {
            (minutes, "minutes", 60)
        } else if let Some(days) = s.strip_suffix('d') {
            (days, "days", 86400)
        } else if let Some(secs) = s.strip_suffix('s') {
            (secs, "seconds", 1)
        } else {
            return s
                .parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s));
        };

        count
            .parse::<u64>()
            .map_err(|_| format!("Invalid {}: {}", unit, count))?
            .checked_mul(scale)
            .ok_or_else(|| format!("Interval too large: {}", s))
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs.is_multiple_of(86400) {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs.is_multiple_of(3600) {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs.is_multiple_of(60) {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

pub struct Scheduler<S: Store + Send + Sync + 'static> {
    orchestrator: Arc<Orchestrator<S>>,
    store: Arc<S>,
    exporter: Arc<Exporter>,
    export_path: PathBuf,
    scrape_every: Duration,
    export_every: Duration,
}

/// Join handles of the two running loops.
pub struct SchedulerHandle {
    scrape: JoinHandle<()>,
    export: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Wait for both loops to stop.
    pub async fn join(self) {
        for (name, handle) in [("scrape", self.scrape), ("export", self.export)] {
            if let Err(e) = handle.await {
                error!("{} loop join error: {}", name, e);
            }
        }
    }
}

impl<S: Store + Send + Sync + 'static> Scheduler<S> {
    pub fn new(
        orchestrator: Arc<Orchestrator<S>>,
        store: Arc<S>,
        exporter: Arc<Exporter>,
        export_path: PathBuf,
        scrape_every: Duration,
        export_every: Duration,
    ) -> Self {
        Self {
            orchestrator,
            store,
            exporter,
            export_path,
            scrape_every,
            export_every,
        }
    }

    pub fn start(self, lifecycle: &Lifecycle) -> SchedulerHandle {
        info!(
            "Scheduler started (scrape every {}, export every {})",
            ScheduleConfig::format_interval(self.scrape_every.as_secs()),
            ScheduleConfig::format_interval(self.export_every.as_secs())
        );

        let scrape = tokio::spawn(scrape_loop(
            self.orchestrator,
            lifecycle.child_token(),
            self.scrape_every,
        ));
        let export = tokio::spawn(export_loop(
            self.store,
            self.exporter,
            self.export_path,
            lifecycle.child_token(),
            self.export_every,
        ));

        SchedulerHandle { scrape, export }
    }
}

/// Sleep for `every`, returning `false` if cancelled first.
async fn wait(token: &CancellationToken, every: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(every) => true,
    }
}

async fn scrape_loop<S: Store + Send + Sync + 'static>(
    orchestrator: Arc<Orchestrator<S>>,
    token: CancellationToken,
    every: Duration,
) {
    while !token.is_cancelled() {
        orchestrator.run().await;

        if !wait(&token, every).await {
            break;
        }
    }
    info!("Scrape loop stopped");
}

async fn export_loop<S: Store + Send + Sync + 'static>(
    store: Arc<S>,
    exporter: Arc<Exporter>,
    path: PathBuf,
    token: CancellationToken,
    every: Duration,
) {
    while !token.is_cancelled() {
        info!("Running scheduled export...");
        if let Err(e) = exporter.export(store.as_ref(), &path).await {
            error!("Scheduled export to {} failed: {}", path.display(), e);
        }

        if !wait(&token, every).await {
            break;
        }
    }
    info!("Export loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;
    use crate::orchestrator::ScrapeConfig;
    use crate::scraper::{PageScraper, ScraperConfig};
    use crate::store::SqliteStore;

    #[test]
    fn test_parse_interval() {
        assert_eq!(ScheduleConfig::parse_interval("1h").unwrap(), 3600);
        assert_eq!(ScheduleConfig::parse_interval("30m").unwrap(), 1800);
        assert_eq!(ScheduleConfig::parse_interval("1d").unwrap(), 86400);
        assert_eq!(ScheduleConfig::parse_interval("60s").unwrap(), 60);
        assert_eq!(ScheduleConfig::parse_interval("3600").unwrap(), 3600);
        assert_eq!(ScheduleConfig::parse_interval(" 15M ").unwrap(), 900);
        assert!(ScheduleConfig::parse_interval("invalid").is_err());
    }

    #[test]
    fn test_parse_interval_rejects_overflow() {
        let huge = format!("{}d", u64::MAX / 10);
        assert!(ScheduleConfig::parse_interval(&huge).is_err());

        let broken = ScheduleConfig {
            export_interval: format!("{}h", u64::MAX),
            ..Default::default()
        };
        assert!(matches!(broken.export_every(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(ScheduleConfig::format_interval(3600), "1h");
        assert_eq!(ScheduleConfig::format_interval(600), "10m");
        assert_eq!(ScheduleConfig::format_interval(86400), "1d");
        assert_eq!(ScheduleConfig::format_interval(90), "90s");
    }

    #[test]
    fn test_default_intervals() {
        let config = ScheduleConfig::default();
        assert_eq!(config.scrape_every().unwrap(), Duration::from_secs(600));
        assert_eq!(config.export_every().unwrap(), Duration::from_secs(900));

        let broken = ScheduleConfig {
            scrape_interval: "soon".into(),
            ..Default::default()
        };
        assert!(matches!(broken.scrape_every(), Err(AppError::Config(_))));
    }

    fn scheduler(
        dir: &std::path::Path,
        lifecycle: &Lifecycle,
        store: Arc<SqliteStore>,
    ) -> Scheduler<SqliteStore> {
        // Nothing is served, so every attempt ends with an empty batch.
        let scraper = PageScraper::new(Arc::new(StaticFetcher::new()), &ScraperConfig::default())
            .unwrap();
        let exporter = Arc::new(Exporter::new());
        let orchestrator = Orchestrator::new(
            Arc::new(scraper),
            store.clone(),
            exporter.clone(),
            lifecycle.clone(),
            ScrapeConfig {
                workers: 2,
                pages: 1,
                settle_delay_secs: 0,
                ..Default::default()
            },
            dir.join("files").join("products.csv"),
        );

        Scheduler::new(
            Arc::new(orchestrator),
            store,
            exporter,
            dir.join("products.csv"),
            Duration::from_millis(20),
            Duration::from_millis(20),
        )
    }

    #[tokio::test]
    async fn test_shutdown_stops_both_loops() {
        let dir = tempfile::tempdir().unwrap();
        let (lifecycle, _fatal) = Lifecycle::new();
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let handle = scheduler(dir.path(), &lifecycle, store).start(&lifecycle);

        tokio::time::sleep(Duration::from_millis(100)).await;
        lifecycle.request_shutdown("test");

        tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .expect("loops should stop after shutdown");

        assert!(dir.path().join("products.csv").exists());
        assert!(dir.path().join("files").join("products.csv").exists());
    }

    #[tokio::test]
    async fn test_loops_never_start_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (lifecycle, _fatal) = Lifecycle::new();
        lifecycle.request_shutdown("before start");

        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let handle = scheduler(dir.path(), &lifecycle, store).start(&lifecycle);
        tokio_test::assert_ok!(tokio::time::timeout(Duration::from_secs(5), handle.join()).await);

        assert!(!dir.path().join("products.csv").exists());
    }
}
