use derive_getters::Getters;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{error::ConfigError, models::Signal};

/// Cutoffs separating gain, neutral and loss. Both bounds are neutral.
#[derive(Clone, Copy, Debug, Eq, Getters, PartialEq)]
pub struct Thresholds {
    gain: Decimal,
    loss: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            gain: dec!(0.3),
            loss: dec!(-0.3),
        }
    }
}

impl Thresholds {
    pub fn new(gain: Decimal, loss: Decimal) -> Result<Self, ConfigError> {
        if loss > gain {
            return Err(ConfigError::InvalidThresholds {
                gain: gain.to_string(),
                loss: loss.to_string(),
            });
        }
        Ok(Self { gain, loss })
    }

    pub fn classify(&self, overall_one_day_change_pct: Option<Decimal>) -> Signal {
        match overall_one_day_change_pct {
            None => Signal::Unknown,
            Some(pct) if pct > self.gain => Signal::Gain,
            Some(pct) if pct < self.loss => Signal::Loss,
            Some(_) => Signal::Neutral,
        }
    }
}

pub fn classify(overall_one_day_change_pct: Option<Decimal>) -> Signal {
    Thresholds::default().classify(overall_one_day_change_pct)
}
