use std::str::FromStr;

use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde_json::Value;

use crate::config::DEFAULT_MARKET_SUFFIX;

/// Turns user-entered tickers into the form the market-data provider expects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SymbolNormalizer {
    market_suffix: Option<String>,
}

impl Default for SymbolNormalizer {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MARKET_SUFFIX.to_string()))
    }
}

impl SymbolNormalizer {
    pub fn new(market_suffix: Option<String>) -> Self {
        let market_suffix = market_suffix
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty());
        Self { market_suffix }
    }

    pub fn market_suffix(&self) -> Option<&str> {
        self.market_suffix.as_deref()
    }

    pub fn normalize(&self, raw_symbol: &str) -> String {
        let mut symbol = raw_symbol.trim().to_uppercase();
        if let Some(suffix) = &self.market_suffix {
            if !symbol.ends_with(suffix.as_str()) {
                symbol.push_str(suffix);
            }
        }
        urlencoding::encode(&symbol).into_owned()
    }
}

/// Reads a JSON number or numeric string as a non-negative decimal.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    let parsed = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(Decimal::from_f64),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
        _ => None,
    }?;

    if parsed.is_sign_negative() && !parsed.is_zero() {
        return None;
    }
    Some(parsed)
}

/// Formats money with thousands separators and two decimals.
pub fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let formatted = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}
