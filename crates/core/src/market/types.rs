use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const MAX_SYMBOL_LEN: usize = 32;

/// Ticker syntax the market data endpoints accept: ASCII letters, digits and `.^=-`
/// (`BRK-B`, `^GSPC`, `EURUSD=X`).
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'))
}

/// Lookback window for daily history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl HistoryPeriod {
    pub fn as_range(self) -> &'static str {
        match self {
            HistoryPeriod::OneDay => "1d",
            HistoryPeriod::FiveDays => "5d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}

impl FromStr for HistoryPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "1d" => HistoryPeriod::OneDay,
            "5d" => HistoryPeriod::FiveDays,
            "1mo" => HistoryPeriod::OneMonth,
            "3mo" => HistoryPeriod::ThreeMonths,
            "6mo" => HistoryPeriod::SixMonths,
            "1y" => HistoryPeriod::OneYear,
            "2y" => HistoryPeriod::TwoYears,
            "5y" => HistoryPeriod::FiveYears,
            other => anyhow::bail!("unsupported history period: {other}"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub market_cap: Option<u64>,
    pub trailing_pe: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

/// Annual statement keyed by line-item label ("Total Revenue", "Total Debt", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    /// Reporting period end dates, most recent first.
    pub periods: Vec<NaiveDate>,
    pub items: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl StatementTable {
    pub fn latest_period(&self) -> Option<NaiveDate> {
        self.periods.first().copied()
    }

    pub fn value(&self, label: &str, period: NaiveDate) -> Option<f64> {
        self.items.get(label)?.get(&period).copied()
    }

    pub fn insert(&mut self, label: &str, period: NaiveDate, value: f64) {
        if let Err(pos) = self.periods.binary_search_by(|p| period.cmp(p)) {
            self.periods.insert(pos, period);
        }
        self.items
            .entry(label.to_string())
            .or_default()
            .insert(period, value);
    }
}
