use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use rust_decimal::Decimal;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, warn};

use crate::{api::PriceSource, error::FetchError, models::Quote};

const HISTORY_DAYS: u32 = 2;

/// Resolves one quote per symbol, falling back to daily history and then to
/// the detailed quote when the lightweight quote is incomplete.
#[derive(Clone)]
pub struct PriceFetcher {
    source: Arc<dyn PriceSource>,
    concurrency: usize,
}

impl PriceFetcher {
    pub fn new(source: Arc<dyn PriceSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    /// Never fails: a symbol that cannot be fetched yields an absent quote.
    pub async fn fetch(&self, symbol: &str) -> Quote {
        match self.try_fetch(symbol).await {
            Ok(quote) => quote,
            Err(err) => {
                warn!("{}", err);
                Quote::absent()
            }
        }
    }

    /// Fetches every distinct symbol concurrently into a fresh map.
    pub async fn fetch_all(&self, symbols: &[String]) -> HashMap<String, Quote> {
        let unique: BTreeSet<&String> = symbols.iter().collect();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for symbol in unique {
            let fetcher = self.clone();
            let permits = Arc::clone(&permits);
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let quote = fetcher.fetch(&symbol).await;
                (symbol, quote)
            });
        }

        let mut quotes = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((symbol, quote)) => {
                    quotes.insert(symbol, quote);
                }
                Err(err) => warn!("Price fetch task failed: {}", err),
            }
        }
        quotes
    }

    async fn try_fetch(&self, symbol: &str) -> Result<Quote, FetchError> {
        let quote = self
            .source
            .get_quote(symbol)
            .await
            .map_err(|source| FetchError {
                symbol: symbol.to_string(),
                source,
            })?;

        let mut last_price = positive(*quote.last_price());
        let mut previous_close = positive(*quote.previous_close());

        if last_price.is_none() || previous_close.is_none() {
            debug!(symbol, "Incomplete quote, trying daily history");
            match self.source.get_history(symbol, HISTORY_DAYS).await {
                Ok(closes) => match closes.as_slice() {
                    [.., prev, last] => {
                        previous_close = positive(Some(*prev)).or(previous_close);
                        last_price = positive(Some(*last)).or(last_price);
                    }
                    [last] => last_price = positive(Some(*last)).or(last_price),
                    [] => debug!(symbol, "No daily history"),
                },
                Err(err) => warn!(symbol, "History fallback failed: {:#}", err),
            }
        }

        if previous_close.is_none() {
            debug!(symbol, "Still no previous close, trying detailed quote");
            match self.source.get_detailed_previous_close(symbol).await {
                Ok(close) => previous_close = positive(close),
                Err(err) => warn!(symbol, "Detailed quote fallback failed: {:#}", err),
            }
        }

        if last_price.is_none() {
            debug!(symbol, "No price available");
        }

        Ok(Quote::new(last_price, previous_close))
    }
}

fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| v.is_sign_positive() && !v.is_zero())
}
