use std::{
    future::Future,
    io::{self, IsTerminal, Write},
    sync::Arc,
};

use chrono::Local;
use strum_macros::Display;
use tracing::{debug, info, warn};

use crate::{
    api::PriceSource,
    app::{calc, portfolio::load_portfolio, ui},
    config::Config,
    device::{Indicator, apply_signal},
    error::LoadError,
    models::{EnrichedHolding, Holding, PortfolioSummary, Signal},
    services::PriceFetcher,
};

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopState {
    Loading,
    Fetching,
    Computing,
    Presenting,
    Sleeping,
    Stopped,
}

/// What one polling cycle produced.
#[derive(Clone, Debug)]
pub struct CycleOutcome {
    pub rows: Vec<EnrichedHolding>,
    pub summary: PortfolioSummary,
    pub signal: Signal,
}

pub struct App {
    config: Config,
    holdings: Vec<Holding>,
    fetcher: PriceFetcher,
    indicator: Box<dyn Indicator>,
}

impl App {
    pub fn new(
        config: Config,
        holdings: Vec<Holding>,
        source: Arc<dyn PriceSource>,
        indicator: Box<dyn Indicator>,
    ) -> Self {
        let fetcher = PriceFetcher::new(source, *config.concurrency());
        Self {
            config,
            holdings,
            fetcher,
            indicator,
        }
    }

    /// Reads the holdings file once; the list stays fixed for the process.
    pub fn load(
        config: Config,
        source: Arc<dyn PriceSource>,
        indicator: Box<dyn Indicator>,
    ) -> Result<Self, LoadError> {
        enter(LoopState::Loading);
        let holdings = load_portfolio(config.portfolio_path(), *config.invalid_numeric())?;
        info!(
            count = holdings.len(),
            path = %config.portfolio_path().display(),
            "Loaded portfolio"
        );
        Ok(Self::new(config, holdings, source, indicator))
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// Polls until `shutdown` resolves (or after one cycle with `--once`),
    /// then switches the bulb off.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut stdout = io::stdout();
        let clear = *self.config.clear_screen() && stdout.is_terminal();

        loop {
            if clear {
                if let Err(err) = ui::clear_screen(&mut stdout) {
                    debug!("Failed to clear terminal: {}", err);
                }
            }

            if let Err(err) = self.run_cycle(&mut stdout).await {
                warn!("Failed to print report: {}", err);
            }

            if *self.config.once() {
                break;
            }

            let interval = *self.config.interval();
            let _ = writeln!(
                stdout,
                "\nRefreshing in {} seconds... (Ctrl+C to exit)",
                interval.as_secs()
            );

            enter(LoopState::Sleeping);
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        self.shutdown().await;
    }

    pub async fn run_cycle<W: Write>(&self, out: &mut W) -> io::Result<CycleOutcome> {
        enter(LoopState::Fetching);
        let normalizer = self.config.normalizer();
        let symbols: Vec<String> = self
            .holdings
            .iter()
            .map(|holding| normalizer.normalize(holding.symbol()))
            .collect();
        let quotes = self.fetcher.fetch_all(&symbols).await;

        enter(LoopState::Computing);
        let (rows, summary) = calc::compute(&self.holdings, &quotes, normalizer);
        let signal = self.config.thresholds().classify(*summary.one_day_change_exact());
        info!(
            invested = %summary.total_invested(),
            value = %summary.total_current_value(),
            one_day = ?summary.overall_one_day_change_pct(),
            %signal,
            "Cycle computed"
        );

        enter(LoopState::Presenting);
        if let Err(err) = apply_signal(self.indicator.as_ref(), signal).await {
            warn!("Bulb control failed: {}", err);
        }
        ui::render_report(
            out,
            &rows,
            &summary,
            signal,
            self.config.currency_symbol(),
            Local::now(),
        )?;

        Ok(CycleOutcome {
            rows,
            summary,
            signal,
        })
    }

    async fn shutdown(&self) {
        if let Err(err) = self.indicator.power_off().await {
            warn!("Failed to switch bulb off: {}", err);
        }
        enter(LoopState::Stopped);
        info!("Stopped");
    }
}

fn enter(state: LoopState) {
    debug!(%state, "Loop state");
}
