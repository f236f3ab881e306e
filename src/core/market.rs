//! Market data abstractions

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A listed asset with its quoted rates. Liquidity and price are in USD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub symbol: String,
    pub name: String,
    pub supply_apy: Decimal,
    pub borrow_apy: Decimal,
    pub liquidity: Decimal,
    pub price: Decimal,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn markets(&self) -> Result<Vec<Market>>;

    /// Case-insensitive lookup by symbol.
    async fn market(&self, symbol: &str) -> Result<Option<Market>> {
        Ok(self
            .markets()
            .await?
            .into_iter()
            .find(|m| m.symbol.eq_ignore_ascii_case(symbol)))
    }
}
