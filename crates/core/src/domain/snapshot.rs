use serde::{Serialize, Serializer};
use std::fmt;

/// Rendered in place of a statement figure the provider does not report.
pub const UNKNOWN_MARKER: &str = "N/A";

/// A reported number, or the explicit "unknown" marker when the line item is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Figure {
    Value(f64),
    Unknown,
}

impl From<Option<f64>> for Figure {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Figure::Unknown, Figure::Value)
    }
}

impl Serialize for Figure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Figure::Value(v) => serializer.serialize_f64(*v),
            Figure::Unknown => serializer.serialize_str(UNKNOWN_MARKER),
        }
    }
}

/// Outcome of a per-symbol data fetch.
///
/// Fetchers never fail hard on provider problems; they return `Unavailable` and the reason flows
/// into prompts as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataResult<T> {
    Snapshot(T),
    Unavailable { error: String },
}

impl<T> DataResult<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        DataResult::Unavailable {
            error: reason.into(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DataResult::Snapshot(_) => None,
            DataResult::Unavailable { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub company_name: String,
    /// 0 when unknown.
    pub market_cap: u64,
    pub pe_ratio: Figure,
    /// 0 when unknown.
    pub fifty_two_week_high: f64,
    /// 0 when unknown.
    pub fifty_two_week_low: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub symbol: String,
    pub period: String,
    pub revenue: Figure,
    pub net_income: Figure,
    pub total_assets: Figure,
    pub total_debt: Figure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSignal {
    Bullish,
    Bearish,
}

impl fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendSignal::Bullish => f.write_str("bullish"),
            TrendSignal::Bearish => f.write_str("bearish"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub rsi: Option<f64>,
    pub volume: Option<u64>,
    pub trend_signal: TrendSignal,
}

/// Everything fetched for one symbol before analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolData {
    pub symbol: String,
    pub price: DataResult<PriceSnapshot>,
    pub financials: DataResult<FinancialSnapshot>,
    pub technicals: DataResult<TechnicalSnapshot>,
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn figure_serializes_as_number_or_marker() {
        assert_eq!(serde_json::to_value(Figure::Value(1.5)).unwrap(), json!(1.5));
        assert_eq!(serde_json::to_value(Figure::Unknown).unwrap(), json!("N/A"));
        assert_eq!(Figure::from(None), Figure::Unknown);
    }

    #[test]
    fn unavailable_serializes_as_error_object() {
        let r: DataResult<PriceSnapshot> = DataResult::unavailable("No data for XYZ");
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"error": "No data for XYZ"})
        );
        assert_eq!(r.error(), Some("No data for XYZ"));
    }

    #[test]
    fn technical_snapshot_serializes_nulls_and_lowercase_trend() {
        let snap = TechnicalSnapshot {
            symbol: "AAPL".to_string(),
            current_price: 101.25,
            sma_20: None,
            sma_50: None,
            rsi: Some(55.1),
            volume: None,
            trend_signal: TrendSignal::Bearish,
        };
        let v = serde_json::to_value(DataResult::Snapshot(snap)).unwrap();
        assert_eq!(v["sma_20"], json!(null));
        assert_eq!(v["trend_signal"], json!("bearish"));
        assert_eq!(v["symbol"], json!("AAPL"));
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round2(123.456), 123.46);
        assert_eq!(round2(99.994), 99.99);
    }
}
