use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;

/// One portfolio line as loaded from the holdings file.
#[derive(Clone, Debug, Eq, Getters, PartialEq, new)]
pub struct Holding {
    symbol: String,
    quantity: Decimal,
    buy_price: Decimal,
}

impl Holding {
    pub fn invested(&self) -> Decimal {
        self.quantity * self.buy_price
    }
}
