use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;

/// Portfolio-level totals for one polling cycle, rounded to 2dp.
///
/// Money totals cover priced rows only: a holding without a current price
/// adds to neither `total_invested` nor `total_current_value`, so a failed
/// quote does not show up as a loss. A plain sum of every row's invested
/// amount would count it; `unpriced_count` says how many rows were left out.
#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, new)]
pub struct PortfolioSummary {
    total_invested: Decimal,
    total_current_value: Decimal,
    total_profit_loss: Decimal,
    total_return_pct: Option<Decimal>,
    overall_one_day_change_pct: Option<Decimal>,
    /// Unrounded weighted mean; the mood is classified from this value.
    one_day_change_exact: Option<Decimal>,
    priced_count: usize,
    unpriced_count: usize,
}
