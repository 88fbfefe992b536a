use derive_getters::Getters;
use rust_decimal::Decimal;

use super::{Holding, Quote};

#[derive(Clone, Debug, Eq, Getters, PartialEq)]
pub struct EnrichedHolding {
    holding: Holding,
    normalized_symbol: String,
    current_price: Option<Decimal>,
    one_day_return_pct: Option<Decimal>,
    invested: Decimal,
    current_value: Option<Decimal>,
    profit_loss: Option<Decimal>,
    return_pct: Option<Decimal>,
}

impl EnrichedHolding {
    /// Derives the per-row metrics. Values are kept at full precision; callers
    /// round for display.
    pub fn from_quote(holding: Holding, normalized_symbol: String, quote: &Quote) -> Self {
        let current_price = *quote.last_price();
        let invested = holding.invested();
        let current_value = current_price.map(|price| *holding.quantity() * price);
        let profit_loss = current_value.map(|value| value - invested);
        let return_pct = match profit_loss {
            Some(pl) if !invested.is_zero() => Some(pl / invested * Decimal::ONE_HUNDRED),
            _ => None,
        };

        Self {
            holding,
            normalized_symbol,
            current_price,
            one_day_return_pct: quote.one_day_return_pct(),
            invested,
            current_value,
            profit_loss,
            return_pct,
        }
    }

    pub fn is_priced(&self) -> bool {
        self.current_value.is_some()
    }
}
