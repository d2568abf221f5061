use std::path::Path;

use tracing::{info, warn};

use crate::app::{AppContext, Lifecycle, Result};

/// Run both scheduler loops until shutdown is requested or a fatal error is
/// escalated. A fatal error is returned so the process exits with failure.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let (lifecycle, mut fatal) = Lifecycle::new();
    let handle = ctx.scheduler(&lifecycle)?.start(&lifecycle);

    watch_signals(lifecycle.clone());

    tokio::select! {
        _ = lifecycle.shutdown_requested() => {
            info!("Waiting for scheduled tasks to stop...");
            handle.join().await;
            info!("Shut down");
            Ok(())
        }
        Some(err) = fatal.recv() => Err(err),
    }
}

/// Run one orchestration cycle in the foreground. A fatal error ends the
/// command as soon as it is escalated.
pub async fn scrape_once(ctx: &AppContext) -> Result<()> {
    let (lifecycle, mut fatal) = Lifecycle::new();
    let orchestrator = ctx.orchestrator(&lifecycle);

    let report = tokio::select! {
        biased;
        Some(err) = fatal.recv() => return Err(err),
        report = orchestrator.run() => report,
    };

    if let Some(err) = fatal.try_recv() {
        return Err(err);
    }

    println!(
        "Scrape complete: {} batches, {} products, {} exports, {} errors",
        report.batches,
        report.products,
        report.exports,
        report.errors.len()
    );
    for err in &report.errors {
        eprintln!("  {}", err);
    }
    Ok(())
}

pub async fn export_once(ctx: &AppContext, output: Option<&Path>) -> Result<()> {
    let path = output.unwrap_or(ctx.config.export.path.as_path());
    let count = ctx.exporter.export(ctx.store.as_ref(), path).await?;
    println!("Exported {} products to {}", count, path.display());
    Ok(())
}

/// Turn SIGINT/SIGTERM into a shutdown request.
fn watch_signals(lifecycle: Lifecycle) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to set up SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    lifecycle.request_shutdown("interrupted");
                    return;
                }
            };

            tokio::select! {
                _ = sigterm.recv() => {},
                _ = tokio::signal::ctrl_c() => {},
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        lifecycle.request_shutdown("interrupted");
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::app::AppError;
    use crate::config::Config;
    use crate::domain::{Product, ProductDetail};
    use crate::fetcher::testing::StaticFetcher;
    use crate::scraper::listing_url;
    use crate::store::{SqliteStore, Store};

    const BASE: &str = "https://shop.example.com/search";

    fn config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.scraper.base_url = BASE.to_string();
        config.scrape.pages = 1;
        config.scrape.settle_delay_secs = 0;
        config.schedule.scrape_interval = "1h".into();
        config.schedule.export_interval = "1h".into();
        config.export.path = dir.join("products.csv");
        config.export.cycle_path = dir.join("files").join("products.csv");
        config
    }

    /// One listing page with a single item whose first request fails with 500.
    fn failing_fetcher() -> StaticFetcher {
        let listing = r#"
            <a class="pcv3__info-content" href="/p/a"></a>
            <span class="prd_rating-average-text">4.9</span>
            <span class="prd_link-shop-name">ShopA</span>
        "#;
        let url = listing_url(BASE, "Handphone", 1);
        StaticFetcher::new()
            .page(&url, listing)
            .page(
                "https://shop.example.com/p/a",
                r#"<h1 data-testid="lblPDPDetailProductName">A</h1>"#,
            )
            .status_once(&url, 500)
    }

    fn context(config: Config) -> AppContext {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        AppContext::with_fetcher(config, store, Arc::new(failing_fetcher())).unwrap()
    }

    #[tokio::test]
    async fn test_scrape_once_fails_fast_on_listing_status() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(config(dir.path()));

        let err = scrape_once(&ctx).await.unwrap_err();

        assert!(matches!(err, AppError::ListingStatus { status: 500, .. }));
        assert!(!ctx.config.export.cycle_path.exists());
        assert_eq!(ctx.store.count_products().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_exits_with_fatal_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(config(dir.path()));

        let result = tokio::time::timeout(Duration::from_secs(5), run(&ctx))
            .await
            .expect("run should return once the fatal error is escalated");

        assert!(matches!(
            result,
            Err(AppError::ListingStatus { status: 500, .. })
        ));
        assert!(!ctx.config.export.cycle_path.exists());
    }

    #[tokio::test]
    async fn test_export_once_to_explicit_path() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        let mut product = Product::new(ProductDetail {
            name: "Phone".into(),
            ..Default::default()
        });
        product.rating = "4.9".into();
        ctx.store.insert_product(&product).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_once(&ctx, Some(&path)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("Phone"));
    }
}
