pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

/// A fetched page, whatever its status.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One GET per call. Transport failures are errors; HTTP error statuses are
/// returned as a [`Page`] so callers can decide how severe they are.
#[async_trait]
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<Page>;
}
