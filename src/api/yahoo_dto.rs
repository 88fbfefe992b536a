use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct YahooChartResponseDto {
    pub chart: YahooChartDto,
}

#[derive(Debug, Deserialize)]
pub struct YahooChartDto {
    pub result: Option<Vec<YahooChartResultDto>>,
    pub error: Option<YahooErrorDto>,
}

#[derive(Debug, Deserialize, Getters)]
pub struct YahooChartResultDto {
    meta: YahooChartMetaDto,
    #[serde(default)]
    indicators: Option<YahooIndicatorsDto>,
}

#[derive(Debug, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct YahooChartMetaDto {
    regular_market_price: Option<Decimal>,
    previous_close: Option<Decimal>,
    chart_previous_close: Option<Decimal>,
}

#[derive(Debug, Deserialize, Getters)]
pub struct YahooIndicatorsDto {
    #[serde(default)]
    quote: Vec<YahooIndicatorQuoteDto>,
}

#[derive(Debug, Deserialize, Getters)]
pub struct YahooIndicatorQuoteDto {
    #[serde(default)]
    close: Vec<Option<Decimal>>,
}

#[derive(Debug, Deserialize, Getters)]
pub struct YahooErrorDto {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResponseDto {
    pub quote_summary: YahooQuoteSummaryDto,
}

#[derive(Debug, Deserialize)]
pub struct YahooQuoteSummaryDto {
    pub result: Option<Vec<YahooQuoteSummaryResultDto>>,
    pub error: Option<YahooErrorDto>,
}

#[derive(Debug, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResultDto {
    summary_detail: Option<YahooSummaryDetailDto>,
}

#[derive(Debug, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct YahooSummaryDetailDto {
    previous_close: Option<YahooRawValueDto>,
}

#[derive(Debug, Deserialize, Getters)]
pub struct YahooRawValueDto {
    raw: Option<Decimal>,
}

impl YahooChartResultDto {
    /// Non-null closes, oldest first.
    pub fn closes(&self) -> Vec<Decimal> {
        self.indicators
            .as_ref()
            .and_then(|indicators| indicators.quote.first())
            .map(|quote| quote.close.iter().flatten().copied().collect())
            .unwrap_or_default()
    }
}

impl YahooErrorDto {
    pub fn message(&self) -> String {
        match &self.description {
            Some(description) => format!("{} ({})", self.code, description),
            None => self.code.clone(),
        }
    }
}
