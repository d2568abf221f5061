use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A listing page answered with a non-success status. Unlike every other
    /// failure this one terminates the process.
    #[error("Unexpected status {status} for listing page {url}")]
    ListingStatus { url: String, status: u16 },

    #[error("Cannot export products to file")]
    CannotExport,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::ListingStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
