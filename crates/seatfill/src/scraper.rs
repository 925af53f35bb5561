use std::future::Future;
use std::path::PathBuf;

use reqwest::Client;

use crate::config::ResolverConfig;
use crate::types::Period;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Empty response for {0}")]
    EmptyResponse(String),
    #[error("Failed to read dataset {}: {source}", path.display())]
    Dataset {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where the raw inputs of a resolution come from.
///
/// Every call reads its input afresh; implementations must not cache.
pub trait DataSource: Send + Sync {
    /// HTML of the current-week grosses page.
    fn current_grosses(&self) -> impl Future<Output = Result<String, ScraperError>> + Send;

    /// HTML of the grosses-by-week page for `period`.
    fn grosses_by_week(
        &self,
        period: Period,
    ) -> impl Future<Output = Result<String, ScraperError>> + Send;

    /// Text of the bundled weekly CSV dataset.
    fn historical_dataset(&self) -> impl Future<Output = Result<String, ScraperError>> + Send;
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    config: ResolverConfig,
}

impl WebScraper {
    pub fn new(config: ResolverConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        let html = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| {
                if e.is_timeout() {
                    log::warn!("Timed out after {:?} fetching {}", self.config.fetch_timeout, url);
                } else {
                    log::error!("HTTP error: {e:?}");
                }
            })?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        if html.trim().is_empty() {
            return Err(ScraperError::EmptyResponse(url.to_string()));
        }
        Ok(html)
    }
}

impl DataSource for WebScraper {
    async fn current_grosses(&self) -> Result<String, ScraperError> {
        log::info!("Fetching current grosses from {}...", self.config.current_url);
        self.get_html(&self.config.current_url).await
    }

    async fn grosses_by_week(&self, period: Period) -> Result<String, ScraperError> {
        let url = self.config.by_week_url_for(period);
        log::info!("Fetching grosses for {} from {}...", period, url);
        self.get_html(&url).await
    }

    async fn historical_dataset(&self) -> Result<String, ScraperError> {
        let path = &self.config.dataset_path;
        log::info!("Reading historical dataset {}...", path.display());
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ScraperError::Dataset {
                path: path.clone(),
                source,
            })
    }
}
