use std::time::Duration;

use anyhow::{Context, Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header::REFERER};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    PriceSource,
    utils::{make_request, parse_response_object},
    yahoo_dto::{YahooChartResponseDto, YahooChartResultDto, YahooQuoteSummaryResponseDto},
};
use crate::models::Quote;

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const REFERER_URL: &str = "https://finance.yahoo.com/";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const MAX_CRUMB_LEN: usize = 100;

/// Yahoo Finance market data. The chart endpoint is open; quoteSummary
/// needs a session cookie plus a crumb token, fetched on first use and
/// cached until Yahoo rejects it.
#[derive(Debug)]
pub struct YahooSource {
    client: Client,
    base_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooSource {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        Self::with_endpoints(request_timeout, BASE_URL, COOKIE_URL)
    }

    pub fn with_endpoints(
        request_timeout: Duration,
        base_url: &str,
        cookie_url: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: cookie_url.to_string(),
            crumb: Mutex::new(None),
        })
    }

    async fn get_chart(&self, symbol: &str, range: &str) -> Result<YahooChartResultDto> {
        let params = format!("range={}&interval=1d", range);
        let res = make_request(
            &self.client,
            &self.base_url,
            &format!("v8/finance/chart/{}", symbol),
            &params,
        )
        .await
        .with_context(|| format!("Yahoo chart ({})", symbol))?;

        let chart = parse_response_object::<YahooChartResponseDto>(
            res,
            &format!("Failed to parse Yahoo chart for {}", symbol),
        )?
        .chart;

        if let Some(error) = chart.error {
            return Err(Error::msg(format!("Yahoo chart ({}): {}", symbol, error.message())));
        }

        chart
            .result
            .and_then(|results| results.into_iter().next())
            .with_context(|| format!("Yahoo chart ({}): no results", symbol))
    }

    /// Cached crumb, or a fresh one when `refresh` is set or none is cached.
    async fn crumb(&self, refresh: bool) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if !refresh {
            if let Some(crumb) = cached.as_ref() {
                return Ok(crumb.clone());
            }
        }

        // Only the Set-Cookie header matters; the page itself is usually a 404.
        self.client
            .get(&self.cookie_url)
            .header(REFERER, REFERER_URL)
            .send()
            .await
            .context("Failed to fetch Yahoo session cookie")?;

        let res = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .header(REFERER, REFERER_URL)
            .send()
            .await
            .context("Failed to fetch Yahoo crumb")?;
        if !res.status().is_success() {
            return Err(Error::msg(format!("Yahoo crumb request failed: {}", res.status())));
        }

        let crumb = parse_crumb(&res.text().await?)?;
        debug!("Fetched Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn send_quote_summary(&self, symbol: &str, crumb: &str) -> Result<Response> {
        let url = quote_summary_url(&self.base_url, symbol, crumb);
        Ok(self.client.get(&url).send().await?)
    }

    async fn get_quote_summary(&self, symbol: &str) -> Result<Value> {
        let mut res = self.send_quote_summary(symbol, &self.crumb(false).await?).await?;
        if res.status() == StatusCode::UNAUTHORIZED {
            debug!(symbol, "Yahoo rejected the crumb, refreshing");
            res = self.send_quote_summary(symbol, &self.crumb(true).await?).await?;
        }

        if !res.status().is_success() {
            return Err(Error::msg(format!("Request failed: {}", res.status())));
        }
        Ok(serde_json::from_str::<Value>(&res.text().await?)?)
    }
}

/// quoteSummary URL for an already URL-safe symbol.
pub fn quote_summary_url(base_url: &str, symbol: &str, crumb: &str) -> String {
    format!(
        "{}/v10/finance/quoteSummary/{}?modules=summaryDetail&crumb={}",
        base_url,
        symbol,
        urlencoding::encode(crumb)
    )
}

/// Validates the body of the getcrumb endpoint.
pub fn parse_crumb(body: &str) -> Result<String> {
    let crumb = body.trim();
    if crumb.contains("<html") || crumb.contains("<!DOCTYPE") {
        return Err(Error::msg("Yahoo returned an HTML page instead of a crumb"));
    }
    if crumb.to_lowercase().contains("too many requests") {
        return Err(Error::msg("Yahoo rate limited the crumb request"));
    }
    if crumb.is_empty() || crumb.len() >= MAX_CRUMB_LEN || crumb.contains(char::is_whitespace) {
        return Err(Error::msg(format!("Unexpected Yahoo crumb: {:?}", crumb)));
    }
    Ok(crumb.to_string())
}

#[async_trait]
impl PriceSource for YahooSource {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let chart = self.get_chart(symbol, "1d").await?;
        let meta = chart.meta();
        let previous_close = (*meta.previous_close()).or(*meta.chart_previous_close());
        Ok(Quote::new(*meta.regular_market_price(), previous_close))
    }

    async fn get_history(&self, symbol: &str, days: u32) -> Result<Vec<Decimal>> {
        let chart = self.get_chart(symbol, &format!("{}d", days)).await?;
        let closes = chart.closes();
        let skip = closes.len().saturating_sub(days as usize);
        Ok(closes.into_iter().skip(skip).collect())
    }

    async fn get_detailed_previous_close(&self, symbol: &str) -> Result<Option<Decimal>> {
        let res = self
            .get_quote_summary(symbol)
            .await
            .with_context(|| format!("Yahoo quoteSummary ({})", symbol))?;

        let summary = parse_response_object::<YahooQuoteSummaryResponseDto>(
            res,
            &format!("Failed to parse Yahoo quoteSummary for {}", symbol),
        )?
        .quote_summary;

        if let Some(error) = summary.error {
            return Err(Error::msg(format!(
                "Yahoo quoteSummary ({}): {}",
                symbol,
                error.message()
            )));
        }

        let previous_close = summary
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| {
                let detail = result.summary_detail().as_ref()?;
                *detail.previous_close().as_ref()?.raw()
            });

        Ok(previous_close)
    }
}
