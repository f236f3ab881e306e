use crate::core::market::{Market, MarketDataProvider};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Serves a fixed market table, typically the one from the config file.
#[derive(Debug, Clone)]
pub struct StaticMarketProvider {
    markets: Vec<Market>,
}

impl StaticMarketProvider {
    pub fn new(markets: Vec<Market>) -> Self {
        Self { markets }
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketProvider {
    async fn markets(&self) -> Result<Vec<Market>> {
        debug!("Serving {} static markets", self.markets.len());
        Ok(self.markets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::default_markets;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_lists_configured_markets() {
        let provider = StaticMarketProvider::new(default_markets());
        let markets = provider.markets().await.unwrap();
        assert_eq!(markets.len(), 5);
        assert_eq!(markets[1].symbol, "USDC");
        assert_eq!(markets[1].borrow_apy, dec!(7.10));
    }

    #[tokio::test]
    async fn test_lookup_ignores_case() {
        let provider = StaticMarketProvider::new(default_markets());
        let wbtc = provider.market("wbtc").await.unwrap().unwrap();
        assert_eq!(wbtc.name, "Wrapped BTC");
        assert!(provider.market("DOGE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_table() {
        let provider = StaticMarketProvider::new(Vec::new());
        assert!(provider.markets().await.unwrap().is_empty());
    }
}
