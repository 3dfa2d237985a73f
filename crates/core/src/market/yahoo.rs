use crate::config::Settings;
use crate::market::provider::MarketDataProvider;
use crate::market::types::{
    is_valid_symbol, CompanyProfile, DailyBar, HistoryPeriod, StatementTable,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use yahoo_finance_api as yahoo;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; tickerdesk/0.1)";

// 2016-01-01T00:00:00Z. Annual statements older than this are never the latest column.
const TIMESERIES_START: i64 = 1_451_606_400;

/// Yahoo timeseries type -> statement line-item label.
const INCOME_ITEMS: &[(&str, &str)] = &[
    ("annualTotalRevenue", "Total Revenue"),
    ("annualNetIncome", "Net Income"),
];
const BALANCE_ITEMS: &[(&str, &str)] = &[
    ("annualTotalAssets", "Total Assets"),
    ("annualTotalDebt", "Total Debt"),
];

/// Daily history comes from `yahoo_finance_api`; the quote summary and fundamentals timeseries
/// endpoints are not covered by that crate and are requested directly.
pub struct YahooFinanceProvider {
    connector: yahoo::YahooConnector,
    http: reqwest::Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .market_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let connector = yahoo::YahooConnector::new()
            .map_err(|e| anyhow::anyhow!("failed to build yahoo connector: {e}"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            connector,
            http,
            base_url,
        })
    }

    /// `{base}/{segments..}/{symbol}` with the symbol escaped as a single path segment.
    fn endpoint(&self, segments: &[&str], symbol: &str) -> Result<Url> {
        endpoint_url(&self.base_url, segments, symbol)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        if !status.is_success() {
            anyhow::bail!("market data HTTP {status}: {text}");
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("market data response has unexpected shape: {text}"))
    }

    async fn fundamentals(&self, symbol: &str, items: &[(&str, &str)]) -> Result<StatementTable> {
        let types = items
            .iter()
            .map(|(kind, _)| *kind)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.endpoint(&["ws", "fundamentals-timeseries", "v1", "finance", "timeseries"], symbol)?;
        let envelope: TimeseriesEnvelope = self
            .get_json(
                url,
                &[
                    ("symbol", symbol.to_string()),
                    ("type", types),
                    ("period1", TIMESERIES_START.to_string()),
                    ("period2", Utc::now().timestamp().to_string()),
                ],
            )
            .await?;
        statement_from_timeseries(envelope, items)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn daily_history(&self, symbol: &str, period: HistoryPeriod) -> Result<Vec<DailyBar>> {
        // The connector formats the ticker into its request path unescaped.
        anyhow::ensure!(is_valid_symbol(symbol), "invalid ticker symbol {symbol:?}");

        let response = self
            .connector
            .get_quote_range(symbol, "1d", period.as_range())
            .await
            .map_err(|e| anyhow::anyhow!("yahoo history request for {symbol} failed: {e}"))?;
        let quotes = response
            .quotes()
            .map_err(|e| anyhow::anyhow!("yahoo history for {symbol} has no quotes: {e}"))?;

        let mut out = Vec::with_capacity(quotes.len());
        for q in &quotes {
            if let Some(bar) = bar_from_quote(q.timestamp as i64, q.close, q.volume)? {
                out.push(bar);
            }
        }
        Ok(out)
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let url = self.endpoint(&["v10", "finance", "quoteSummary"], symbol)?;
        let envelope: QuoteSummaryEnvelope = self
            .get_json(url, &[("modules", "price,summaryDetail".to_string())])
            .await?;
        profile_from_quote_summary(envelope)
    }

    async fn income_statement(&self, symbol: &str) -> Result<StatementTable> {
        self.fundamentals(symbol, INCOME_ITEMS).await
    }

    async fn balance_sheet(&self, symbol: &str) -> Result<StatementTable> {
        self.fundamentals(symbol, BALANCE_ITEMS).await
    }
}

fn endpoint_url(base_url: &str, segments: &[&str], symbol: &str) -> Result<Url> {
    let mut url =
        Url::parse(base_url).with_context(|| format!("invalid market data base url {base_url}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("market data base url cannot take a path: {base_url}"))?
        .pop_if_empty()
        .extend(segments)
        .push(symbol);
    Ok(url)
}

/// Skips bars without a usable close.
fn bar_from_quote(timestamp: i64, close: f64, volume: u64) -> Result<Option<DailyBar>> {
    if !close.is_finite() || close <= 0.0 {
        return Ok(None);
    }
    let date = DateTime::<Utc>::from_timestamp(timestamp, 0)
        .with_context(|| format!("invalid bar timestamp {timestamp}"))?
        .date_naive();
    Ok(Some(DailyBar {
        date,
        close,
        volume: Some(volume),
    }))
}

fn profile_from_quote_summary(envelope: QuoteSummaryEnvelope) -> Result<CompanyProfile> {
    if let Some(err) = envelope.quote_summary.error {
        anyhow::bail!("quoteSummary error {}: {}", err.code, err.description);
    }

    let result = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .context("quoteSummary returned no result")?;

    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();

    Ok(CompanyProfile {
        long_name: price.long_name.filter(|s| !s.trim().is_empty()),
        market_cap: price
            .market_cap
            .raw
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64),
        trailing_pe: detail.trailing_pe.raw,
        fifty_two_week_high: detail.fifty_two_week_high.raw,
        fifty_two_week_low: detail.fifty_two_week_low.raw,
    })
}

fn statement_from_timeseries(
    envelope: TimeseriesEnvelope,
    items: &[(&str, &str)],
) -> Result<StatementTable> {
    if let Some(err) = envelope.timeseries.error {
        anyhow::bail!("timeseries error {}: {}", err.code, err.description);
    }

    let mut table = StatementTable::default();
    for entry in envelope.timeseries.result.unwrap_or_default() {
        // Each entry carries its series under a key named after its type.
        let Some(kind) = entry.pointer("/meta/type/0").and_then(Value::as_str) else {
            continue;
        };
        let Some((_, label)) = items.iter().find(|(k, _)| *k == kind) else {
            continue;
        };
        let Some(points) = entry.get(kind).and_then(Value::as_array) else {
            continue;
        };

        for point in points {
            let Some(period) = point
                .get("asOfDate")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let Some(value) = point.pointer("/reportedValue/raw").and_then(Value::as_f64) else {
                continue;
            };
            table.insert(label, period, value);
        }
    }
    Ok(table)
}

#[derive(Debug, Deserialize)]
struct YahooError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryEnvelope {
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_detail: Option<SummaryDetailModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    market_cap: RawValue,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetailModule {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: RawValue,
    #[serde(default, rename = "fiftyTwoWeekHigh")]
    fifty_two_week_high: RawValue,
    #[serde(default, rename = "fiftyTwoWeekLow")]
    fifty_two_week_low: RawValue,
}

#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<YahooError>,
}
