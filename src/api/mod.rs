pub mod utils;
pub mod yahoo;
pub mod yahoo_dto;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::Quote;

pub use yahoo::YahooSource;

/// A market-data provider. Symbols are already normalized and URL-safe.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Lightweight quote: last traded price and previous close.
    async fn get_quote(&self, symbol: &str) -> Result<Quote>;

    /// Daily closes for the last `days` trading days, oldest first.
    async fn get_history(&self, symbol: &str, days: u32) -> Result<Vec<Decimal>>;

    /// Previous close from the slower, detailed quote endpoint.
    async fn get_detailed_previous_close(&self, symbol: &str) -> Result<Option<Decimal>>;
}
