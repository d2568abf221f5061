pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shopcrawl")]
#[command(about = "Scheduled product listing scraper with CSV snapshots", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/shopcrawl/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the scrape and export loops until shutdown (default)
    Run,
    /// Run a single scrape cycle
    Scrape,
    /// Export the current top products once
    Export {
        /// Output file (default: export.path from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::parse_from(["shopcrawl"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_export_with_output() {
        let cli = Cli::parse_from(["shopcrawl", "--db", "x.db", "export", "-o", "out.csv"]);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert_eq!(
            cli.command,
            Some(Commands::Export {
                output: Some(PathBuf::from("out.csv"))
            })
        );
    }
}
