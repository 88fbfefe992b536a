use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use portfolio_mood_light::{
    api::YahooSource,
    app::App,
    config::{Cli, Config, LogFormat},
    device::TuyaBulb,
};
use tokio::sync::oneshot;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    if let Err(err) = dotenv_result {
        if !err.not_found() {
            warn!("Failed to read .env: {}", err);
        }
    }

    let config = Config::from_cli(cli).context("Invalid configuration")?;

    let source = YahooSource::new(*config.request_timeout())?;
    let bulb = TuyaBulb::new(
        config.device().clone(),
        *config.protocol_version(),
        *config.device_timeout(),
    );

    let app = App::load(config, Arc::new(source), Box::new(bulb))
        .context("Failed to load portfolio")?;

    // Registered before the first cycle; an interrupt during a fetch takes
    // effect at the next sleep.
    let (interrupt_tx, interrupt_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = interrupt_tx.send(());
            }
            Err(err) => warn!("Failed to listen for Ctrl+C: {}", err),
        }
    });

    app.run(async {
        if interrupt_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await;

    Ok(())
}
