use std::{collections::HashSet, fs, path::Path};

use clap::ValueEnum;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use strum_macros::Display;
use tracing::warn;

use crate::{app::utils::parse_decimal, error::LoadError, models::Holding};

const REQUIRED_KEYS: [&str; 3] = ["symbol", "qty", "buy_price"];

/// How the loader treats `qty`/`buy_price` values that are not usable numbers.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum InvalidNumericPolicy {
    /// Coerce to zero and keep the row.
    #[default]
    Zero,
    /// Drop the row.
    SkipRow,
    /// Reject the whole file.
    Fail,
}

pub fn load_portfolio(path: &Path, policy: InvalidNumericPolicy) -> Result<Vec<Holding>, LoadError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(LoadError::format(format!(
            "only .json portfolio files are supported, got {}",
            path.display()
        )));
    }

    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_portfolio(&text, policy)
}

pub fn parse_portfolio(text: &str, policy: InvalidNumericPolicy) -> Result<Vec<Holding>, LoadError> {
    let data: Value = serde_json::from_str(text)?;

    let Value::Array(items) = data else {
        return Err(LoadError::format("expected a list of holdings"));
    };

    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => records.push(obj),
            other => {
                return Err(LoadError::format(format!(
                    "record {} is not an object: {}",
                    idx + 1,
                    other
                )));
            }
        }
    }

    let present: HashSet<&str> = records
        .iter()
        .flat_map(|obj| obj.keys().map(String::as_str))
        .collect();
    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !present.contains(key))
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::format(format!(
            "portfolio must contain keys {:?}, missing {:?}",
            REQUIRED_KEYS, missing
        )));
    }

    let mut holdings = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if let Some(holding) = parse_record(idx + 1, record, policy)? {
            holdings.push(holding);
        }
    }

    Ok(holdings)
}

fn parse_record(
    row: usize,
    record: &Map<String, Value>,
    policy: InvalidNumericPolicy,
) -> Result<Option<Holding>, LoadError> {
    let symbol = match record.get("symbol") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(LoadError::format(format!(
                "record {} has no usable symbol",
                row
            )));
        }
    };

    let Some(quantity) = read_numeric(row, &symbol, record, "qty", policy)? else {
        return Ok(None);
    };
    let Some(buy_price) = read_numeric(row, &symbol, record, "buy_price", policy)? else {
        return Ok(None);
    };

    Ok(Some(Holding::new(symbol, quantity, buy_price)))
}

/// `Ok(None)` means the row should be skipped.
fn read_numeric(
    row: usize,
    symbol: &str,
    record: &Map<String, Value>,
    key: &str,
    policy: InvalidNumericPolicy,
) -> Result<Option<Decimal>, LoadError> {
    let raw = record.get(key).unwrap_or(&Value::Null);
    if let Some(value) = parse_decimal(raw) {
        return Ok(Some(value));
    }

    match policy {
        InvalidNumericPolicy::Zero => {
            warn!(row, symbol, key, value = %raw, "Invalid number, using 0");
            Ok(Some(Decimal::ZERO))
        }
        InvalidNumericPolicy::SkipRow => {
            warn!(row, symbol, key, value = %raw, "Invalid number, skipping row");
            Ok(None)
        }
        InvalidNumericPolicy::Fail => Err(LoadError::format(format!(
            "record {} ({}) has invalid {}: {}",
            row, symbol, key, raw
        ))),
    }
}
