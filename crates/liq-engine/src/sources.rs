//! Data source abstractions consumed by the analysis service

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{HeadlineItem, MarketSnapshot};

/// Current market snapshot for the configured pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the latest snapshot
    async fn fetch(&self) -> Result<MarketSnapshot>;

    /// Source name used in logs and errors
    fn name(&self) -> &str;
}

/// Recent headlines for the traded asset
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch recent headlines, sentiment not yet classified
    async fn fetch(&self) -> Result<Vec<HeadlineItem>>;

    fn name(&self) -> &str;
}

/// Fixed snapshot, for offline runs
#[derive(Debug, Clone)]
pub struct StaticMarketData {
    snapshot: MarketSnapshot,
}

impl StaticMarketData {
    pub fn new(snapshot: MarketSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketData {
    async fn fetch(&self) -> Result<MarketSnapshot> {
        Ok(self.snapshot)
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Fixed headline list, for offline runs or a missing news key
#[derive(Debug, Clone, Default)]
pub struct StaticNews {
    headlines: Vec<HeadlineItem>,
}

impl StaticNews {
    pub fn new(headlines: Vec<HeadlineItem>) -> Self {
        Self { headlines }
    }
}

#[async_trait]
impl NewsSource for StaticNews {
    async fn fetch(&self) -> Result<Vec<HeadlineItem>> {
        Ok(self.headlines.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
