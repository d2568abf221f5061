use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shopcrawl::app::AppContext;
use shopcrawl::cli::{commands, Cli, Commands};
use shopcrawl::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            commands::run(&ctx).await?;
        }
        Commands::Scrape => {
            commands::scrape_once(&ctx).await?;
        }
        Commands::Export { output } => {
            commands::export_once(&ctx, output.as_deref()).await?;
        }
    }

    Ok(())
}
