use std::io::{self, Write};

use chrono::{DateTime, Local};
use crossterm::{
    cursor::MoveTo,
    execute,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use rust_decimal::Decimal;

use crate::{
    app::utils::format_money,
    models::{EnrichedHolding, PortfolioSummary, Signal},
};

const PLACEHOLDER: &str = "—";
const TABLE_WIDTH: usize = 74;

pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}

/// Right-aligns a value in `width` columns and colours it by sign.
pub fn colorize(value: Option<Decimal>, suffix: &str, width: usize) -> String {
    let Some(value) = value else {
        return format!("{:>width$}", PLACEHOLDER).dark_grey().to_string();
    };

    let text = format!("{:>width$}", format!("{:.2}{}", value.round_dp(2), suffix));
    if value.is_zero() {
        text.dark_grey().to_string()
    } else if value.is_sign_positive() {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

fn price_cell(value: Option<Decimal>, width: usize) -> String {
    match value {
        Some(value) => format!("{:>width$.2}", value.round_dp(2)),
        None => format!("{:>width$}", PLACEHOLDER),
    }
}

fn signal_label(signal: Signal) -> String {
    let text = signal.to_string();
    match signal {
        Signal::Gain => text.green().to_string(),
        Signal::Loss => text.red().to_string(),
        Signal::Neutral => text.white().to_string(),
        Signal::Unknown => text.dark_grey().to_string(),
    }
}

pub fn render_summary<W: Write>(
    out: &mut W,
    summary: &PortfolioSummary,
    signal: Signal,
    currency: &str,
    now: DateTime<Local>,
) -> io::Result<()> {
    writeln!(out, "\n--- Portfolio Summary ---")?;
    writeln!(out, "Date/Time:         {}", now.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(
        out,
        "Total Invested:    {}{}",
        currency,
        format_money(*summary.total_invested())
    )?;
    writeln!(
        out,
        "Current Value:     {}{}",
        currency,
        format_money(*summary.total_current_value())
    )?;
    writeln!(
        out,
        "Unrealized P/L:    {}{}",
        currency,
        format_money(*summary.total_profit_loss())
    )?;
    writeln!(
        out,
        "Total Return:      {}",
        colorize(*summary.total_return_pct(), "%", 0)
    )?;
    writeln!(
        out,
        "Overall 1D Change: {}",
        colorize(*summary.overall_one_day_change_pct(), "%", 0)
    )?;
    if *summary.unpriced_count() > 0 {
        writeln!(
            out,
            "Unpriced:          {} holding(s) without a current price",
            summary.unpriced_count()
        )?;
    }
    writeln!(out, "Mood:              {}", signal_label(signal))?;
    Ok(())
}

pub fn render_holdings<W: Write>(out: &mut W, rows: &[EnrichedHolding]) -> io::Result<()> {
    writeln!(out, "\nHoldings Overview:")?;
    writeln!(
        out,
        "{:<14} {:>8} {:>10} {:>10} {:>12} {:>8} {:>8}",
        "Symbol", "Qty", "Buy", "Current", "P/L", "Ret%", "1D%"
    )?;
    writeln!(out, "{}", "-".repeat(TABLE_WIDTH))?;

    for row in rows {
        let holding = row.holding();
        writeln!(
            out,
            "{:<14} {:>8} {:>10.2} {} {} {} {}",
            holding.symbol(),
            holding.quantity().normalize().to_string(),
            holding.buy_price().round_dp(2),
            price_cell(*row.current_price(), 10),
            colorize(*row.profit_loss(), "", 12),
            colorize(*row.return_pct(), "%", 8),
            colorize(*row.one_day_return_pct(), "%", 8),
        )?;
    }
    Ok(())
}

/// Full per-cycle report: summary block then the holdings table.
pub fn render_report<W: Write>(
    out: &mut W,
    rows: &[EnrichedHolding],
    summary: &PortfolioSummary,
    signal: Signal,
    currency: &str,
    now: DateTime<Local>,
) -> io::Result<()> {
    render_summary(out, summary, signal, currency, now)?;
    render_holdings(out, rows)?;
    out.flush()
}
