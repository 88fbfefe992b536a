pub mod protocol;
pub mod session;
pub mod tuya;

use async_trait::async_trait;
use tracing::info;

use crate::{error::IndicatorError, models::Signal};

pub use protocol::ProtocolVersion;
pub use tuya::TuyaBulb;

/// An RGB-capable light used to show the portfolio's mood.
#[async_trait]
pub trait Indicator: Send + Sync {
    async fn power_on(&self) -> Result<(), IndicatorError>;
    async fn power_off(&self) -> Result<(), IndicatorError>;
    async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<(), IndicatorError>;
    async fn set_neutral(&self) -> Result<(), IndicatorError>;
}

pub const GAIN_COLOR: (u8, u8, u8) = (0, 255, 0);
pub const LOSS_COLOR: (u8, u8, u8) = (255, 0, 0);

/// Drives the indicator for a signal. `Unknown` leaves it untouched.
pub async fn apply_signal(indicator: &dyn Indicator, signal: Signal) -> Result<(), IndicatorError> {
    let color = match signal {
        Signal::Unknown => return Ok(()),
        Signal::Gain => Some(GAIN_COLOR),
        Signal::Loss => Some(LOSS_COLOR),
        Signal::Neutral => None,
    };

    indicator.power_on().await?;
    match color {
        Some((r, g, b)) => indicator.set_color(r, g, b).await?,
        None => indicator.set_neutral().await?,
    }

    info!(%signal, "Bulb updated");
    Ok(())
}
