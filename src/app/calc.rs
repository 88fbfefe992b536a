use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::{
    app::SymbolNormalizer,
    models::{EnrichedHolding, Holding, PortfolioSummary, Quote},
};

/// Joins holdings with this cycle's quotes (keyed by normalized symbol) and
/// derives row and portfolio metrics. Rows sharing a symbol share its quote.
pub fn compute(
    holdings: &[Holding],
    quotes: &HashMap<String, Quote>,
    normalizer: &SymbolNormalizer,
) -> (Vec<EnrichedHolding>, PortfolioSummary) {
    let absent = Quote::absent();
    let rows: Vec<EnrichedHolding> = holdings
        .iter()
        .map(|holding| {
            let symbol = normalizer.normalize(holding.symbol());
            let quote = quotes.get(&symbol).unwrap_or(&absent);
            EnrichedHolding::from_quote(holding.clone(), symbol, quote)
        })
        .collect();

    let summary = summarize(&rows);
    (rows, summary)
}

/// Totals are accumulated at full precision and rounded once at the end.
/// The weighted one-day change is also kept unrounded for classification.
pub fn summarize(rows: &[EnrichedHolding]) -> PortfolioSummary {
    let mut total_invested = Decimal::ZERO;
    let mut total_current_value = Decimal::ZERO;
    let mut priced_count = 0;

    for row in rows {
        if let Some(value) = row.current_value() {
            total_invested += *row.invested();
            total_current_value += *value;
            priced_count += 1;
        }
    }

    let total_profit_loss = total_current_value - total_invested;
    let total_return_pct = if total_invested.is_zero() {
        None
    } else {
        Some(total_profit_loss / total_invested * Decimal::ONE_HUNDRED)
    };

    let overall = weighted_one_day_change(
        rows.iter()
            .filter_map(|row| Some(((*row.current_value())?, (*row.one_day_return_pct())?))),
    );

    PortfolioSummary::new(
        total_invested.round_dp(2),
        total_current_value.round_dp(2),
        total_profit_loss.round_dp(2),
        total_return_pct.map(|pct| pct.round_dp(2)),
        overall.map(|pct| pct.round_dp(2)),
        overall,
        priced_count,
        rows.len() - priced_count,
    )
}

/// Mean of one-day returns weighted by current value. `None` when nothing
/// qualifies or the weights cancel out.
pub fn weighted_one_day_change(
    rows: impl IntoIterator<Item = (Decimal, Decimal)>,
) -> Option<Decimal> {
    let (weighted, weights) = rows.into_iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(weighted, weights), (value, pct)| (weighted + value * pct, weights + value),
    );

    if weights.is_zero() {
        None
    } else {
        Some(weighted / weights)
    }
}
