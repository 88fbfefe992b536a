use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;

/// Latest observation for a symbol. Either side may be missing when the
/// market-data provider has nothing to offer.
#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, new)]
pub struct Quote {
    last_price: Option<Decimal>,
    previous_close: Option<Decimal>,
}

impl Quote {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_absent(&self) -> bool {
        self.last_price.is_none() && self.previous_close.is_none()
    }

    /// Percentage move from previous close to last price, rounded to 2dp.
    pub fn one_day_return_pct(&self) -> Option<Decimal> {
        let last = self.last_price?;
        let prev = self.previous_close?;
        if prev.is_zero() {
            return None;
        }
        Some(((last - prev) / prev * Decimal::ONE_HUNDRED).round_dp(2))
    }
}
