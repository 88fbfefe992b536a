#![cfg(test)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{api::PriceSource, device::Indicator, error::IndicatorError, models::Quote};

#[derive(Default)]
pub struct FakeSource {
    quotes: HashMap<String, Option<Quote>>,
    history: HashMap<String, Result<Vec<Decimal>, String>>,
    detailed: HashMap<String, Option<Decimal>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_quote(mut self, symbol: &str, last: Option<Decimal>, prev: Option<Decimal>) -> Self {
        self.quotes
            .insert(symbol.to_string(), Some(Quote::new(last, prev)));
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.quotes.insert(symbol.to_string(), None);
        self
    }

    pub fn with_history(mut self, symbol: &str, closes: Vec<Decimal>) -> Self {
        self.history.insert(symbol.to_string(), Ok(closes));
        self
    }

    pub fn with_failing_history(mut self, symbol: &str) -> Self {
        self.history
            .insert(symbol.to_string(), Err("history unavailable".to_string()));
        self
    }

    pub fn with_detailed(mut self, symbol: &str, close: Option<Decimal>) -> Self {
        self.detailed.insert(symbol.to_string(), close);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PriceSource for FakeSource {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        self.record(format!("quote:{}", symbol));
        match self.quotes.get(symbol) {
            Some(Some(quote)) => Ok(quote.clone()),
            Some(None) => Err(anyhow!("connection reset")),
            None => Err(anyhow!("unknown symbol {}", symbol)),
        }
    }

    async fn get_history(&self, symbol: &str, days: u32) -> Result<Vec<Decimal>> {
        self.record(format!("history:{}:{}", symbol, days));
        match self.history.get(symbol) {
            Some(Ok(closes)) => Ok(closes.clone()),
            Some(Err(msg)) => Err(anyhow!("{}", msg)),
            None => Ok(Vec::new()),
        }
    }

    async fn get_detailed_previous_close(&self, symbol: &str) -> Result<Option<Decimal>> {
        self.record(format!("detailed:{}", symbol));
        Ok(self.detailed.get(symbol).copied().flatten())
    }
}

/// Records every command; optionally fails all of them.
#[derive(Clone, Default)]
pub struct RecordingIndicator {
    pub commands: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl RecordingIndicator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn record(&self, command: String) -> Result<(), IndicatorError> {
        self.commands.lock().unwrap().push(command);
        if self.fail {
            return Err(IndicatorError::Protocol("device unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Indicator for RecordingIndicator {
    async fn power_on(&self) -> Result<(), IndicatorError> {
        self.record("power_on".to_string())
    }

    async fn power_off(&self) -> Result<(), IndicatorError> {
        self.record("power_off".to_string())
    }

    async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<(), IndicatorError> {
        self.record(format!("set_color({},{},{})", r, g, b))
    }

    async fn set_neutral(&self) -> Result<(), IndicatorError> {
        self.record("set_neutral".to_string())
    }
}
