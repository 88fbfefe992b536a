use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use derive_getters::Getters;
use rust_decimal::Decimal;

use crate::{
    app::{InvalidNumericPolicy, SymbolNormalizer, Thresholds},
    device::ProtocolVersion,
    error::ConfigError,
};

pub const DEFAULT_MARKET_SUFFIX: &str = ".NS";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(version, about = "Shows a stock portfolio's one-day mood on a smart bulb")]
pub struct Cli {
    /// Holdings file (JSON list of {symbol, qty, buy_price})
    #[arg(long, env = "PORTFOLIO_FILE", default_value = "portfolio.json")]
    pub portfolio: String,

    /// Seconds between refreshes
    #[arg(long, env = "REFRESH_INTERVAL", default_value_t = 600)]
    pub interval: u64,

    /// Suffix appended to every symbol; pass an empty string to disable
    #[arg(long, env = "MARKET_SUFFIX", default_value = DEFAULT_MARKET_SUFFIX)]
    pub market_suffix: String,

    /// What to do with qty/buy_price values that are not valid numbers
    #[arg(long, value_enum, default_value_t = InvalidNumericPolicy::Zero)]
    pub on_invalid_numeric: InvalidNumericPolicy,

    /// One-day change (%) above which the portfolio counts as a gain
    #[arg(long, default_value = "0.3", allow_hyphen_values = true)]
    pub gain_threshold: Decimal,

    /// One-day change (%) below which the portfolio counts as a loss
    #[arg(long, default_value = "-0.3", allow_hyphen_values = true)]
    pub loss_threshold: Decimal,

    /// Timeout in seconds for each market-data request
    #[arg(long, default_value_t = 10)]
    pub request_timeout: u64,

    /// Timeout in seconds for each bulb command
    #[arg(long, default_value_t = 5)]
    pub device_timeout: u64,

    /// Maximum number of symbols fetched at the same time
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Run one cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Keep previous output instead of clearing the terminal each cycle
    #[arg(long)]
    pub no_clear: bool,

    #[arg(long, default_value = "₹")]
    pub currency_symbol: String,

    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(long, env = "TUYA_DEVICE_ID", hide_env_values = true)]
    pub device_id: Option<String>,

    #[arg(long, env = "TUYA_DEVICE_IP", hide_env_values = true)]
    pub device_ip: Option<String>,

    #[arg(long, env = "TUYA_LOCAL_KEY", hide_env_values = true)]
    pub local_key: Option<String>,

    /// Bulb's LAN protocol version (3.3 or 3.5)
    #[arg(long, env = "TUYA_VERSION", default_value = "3.5")]
    pub protocol_version: String,
}

#[derive(Clone, Debug, Eq, Getters, PartialEq)]
pub struct DeviceCredentials {
    device_id: String,
    device_ip: String,
    local_key: String,
}

impl DeviceCredentials {
    pub fn new(
        device_id: Option<String>,
        device_ip: Option<String>,
        local_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let device_id = require(device_id, "TUYA_DEVICE_ID")?;
        let device_ip = require(device_ip, "TUYA_DEVICE_IP")?;
        let local_key = require(local_key, "TUYA_LOCAL_KEY")?;

        if local_key.len() != 16 {
            return Err(ConfigError::InvalidLocalKey(local_key.len()));
        }

        Ok(Self {
            device_id,
            device_ip,
            local_key,
        })
    }
}

fn require(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingCredential(name))
}

/// Everything the program needs, resolved once at startup.
#[derive(Clone, Debug, Getters)]
pub struct Config {
    portfolio_path: PathBuf,
    interval: Duration,
    normalizer: SymbolNormalizer,
    invalid_numeric: InvalidNumericPolicy,
    thresholds: Thresholds,
    request_timeout: Duration,
    device_timeout: Duration,
    concurrency: usize,
    once: bool,
    clear_screen: bool,
    currency_symbol: String,
    device: DeviceCredentials,
    protocol_version: ProtocolVersion,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let device = DeviceCredentials::new(cli.device_id, cli.device_ip, cli.local_key)?;
        let protocol_version = cli.protocol_version.parse::<ProtocolVersion>()?;

        if cli.interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let thresholds = Thresholds::new(cli.gain_threshold, cli.loss_threshold)?;
        let portfolio_path = PathBuf::from(shellexpand::tilde(&cli.portfolio).into_owned());

        Ok(Self {
            portfolio_path,
            interval: Duration::from_secs(cli.interval),
            normalizer: SymbolNormalizer::new(Some(cli.market_suffix)),
            invalid_numeric: cli.on_invalid_numeric,
            thresholds,
            request_timeout: Duration::from_secs(cli.request_timeout.max(1)),
            device_timeout: Duration::from_secs(cli.device_timeout.max(1)),
            concurrency: cli.concurrency.max(1),
            once: cli.once,
            clear_screen: !cli.no_clear,
            currency_symbol: cli.currency_symbol,
            device,
            protocol_version,
        })
    }
}
