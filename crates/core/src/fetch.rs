use crate::domain::snapshot::{
    round2, DataResult, Figure, FinancialSnapshot, PriceSnapshot, SymbolData, TechnicalSnapshot,
};
use crate::indicators::{self, RSI_PERIOD, SMA_LONG, SMA_SHORT};
use crate::market::{CompanyProfile, HistoryPeriod, MarketDataProvider};
use anyhow::Result;
use chrono::Datelike;

pub const TOTAL_REVENUE: &str = "Total Revenue";
pub const NET_INCOME: &str = "Net Income";
pub const TOTAL_ASSETS: &str = "Total Assets";
pub const TOTAL_DEBT: &str = "Total Debt";

/// Latest close plus static profile fields.
pub async fn fetch_price(provider: &dyn MarketDataProvider, symbol: &str) -> DataResult<PriceSnapshot> {
    soften(symbol, "price", try_fetch_price(provider, symbol).await)
}

/// Most recent annual income statement and balance sheet figures.
pub async fn fetch_financials(
    provider: &dyn MarketDataProvider,
    symbol: &str,
) -> DataResult<FinancialSnapshot> {
    soften(symbol, "financials", try_fetch_financials(provider, symbol).await)
}

/// Moving averages, RSI and trend over `period` of daily closes.
pub async fn fetch_technicals(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    period: HistoryPeriod,
) -> DataResult<TechnicalSnapshot> {
    soften(
        symbol,
        "technicals",
        try_fetch_technicals(provider, symbol, period).await,
    )
}

/// Trims each requested symbol and drops blank entries, keeping order and case.
pub fn normalize_symbols(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Runs all three fetchers for each symbol, one symbol at a time.
pub async fn collect_symbol_data(
    provider: &dyn MarketDataProvider,
    symbols: &[String],
    technical_period: HistoryPeriod,
) -> Vec<SymbolData> {
    let mut out = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let price = fetch_price(provider, symbol).await;
        let financials = fetch_financials(provider, symbol).await;
        let technicals = fetch_technicals(provider, symbol, technical_period).await;

        tracing::info!(
            %symbol,
            provider = provider.provider_name(),
            price_error = price.error(),
            financials_error = financials.error(),
            technicals_error = technicals.error(),
            "collected market data"
        );

        out.push(SymbolData {
            symbol: symbol.clone(),
            price,
            financials,
            technicals,
        });
    }
    out
}

fn soften<T>(symbol: &str, kind: &'static str, res: Result<DataResult<T>>) -> DataResult<T> {
    match res {
        Ok(r) => r,
        Err(err) => {
            tracing::warn!(%symbol, kind, error = %err, "market data fetch failed; marking unavailable");
            DataResult::unavailable(format!("{err:#}"))
        }
    }
}

async fn try_fetch_price(
    provider: &dyn MarketDataProvider,
    symbol: &str,
) -> Result<DataResult<PriceSnapshot>> {
    let history = provider.daily_history(symbol, HistoryPeriod::OneDay).await?;
    let Some(last) = history.last() else {
        return Ok(DataResult::unavailable(format!(
            "Could not retrieve data for {symbol}"
        )));
    };

    // Profile fields are optional; a failed lookup keeps the price and uses the fallbacks.
    let profile = match provider.company_profile(symbol).await {
        Ok(profile) => profile,
        Err(err) => {
            tracing::warn!(%symbol, error = %format!("{err:#}"), "company profile unavailable; using fallbacks");
            CompanyProfile::default()
        }
    };

    Ok(DataResult::Snapshot(PriceSnapshot {
        symbol: symbol.to_string(),
        current_price: round2(last.close),
        company_name: profile.long_name.unwrap_or_else(|| symbol.to_string()),
        market_cap: profile.market_cap.unwrap_or(0),
        pe_ratio: profile.trailing_pe.into(),
        fifty_two_week_high: profile.fifty_two_week_high.unwrap_or(0.0),
        fifty_two_week_low: profile.fifty_two_week_low.unwrap_or(0.0),
    }))
}

async fn try_fetch_financials(
    provider: &dyn MarketDataProvider,
    symbol: &str,
) -> Result<DataResult<FinancialSnapshot>> {
    let income = provider.income_statement(symbol).await?;
    let Some(period) = income.latest_period() else {
        return Ok(DataResult::unavailable(format!("No financials for {symbol}")));
    };

    // Balance sheet figures are read at the income statement's latest period.
    let balance = provider.balance_sheet(symbol).await?;

    Ok(DataResult::Snapshot(FinancialSnapshot {
        symbol: symbol.to_string(),
        period: period.year().to_string(),
        revenue: Figure::from(income.value(TOTAL_REVENUE, period)),
        net_income: Figure::from(income.value(NET_INCOME, period)),
        total_assets: Figure::from(balance.value(TOTAL_ASSETS, period)),
        total_debt: Figure::from(balance.value(TOTAL_DEBT, period)),
    }))
}

async fn try_fetch_technicals(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    period: HistoryPeriod,
) -> Result<DataResult<TechnicalSnapshot>> {
    let bars = provider.daily_history(symbol, period).await?;
    let Some(last) = bars.last() else {
        return Ok(DataResult::unavailable(format!(
            "No historical data for {symbol}"
        )));
    };

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let sma_20 = indicators::sma(&closes, SMA_SHORT);
    let sma_50 = indicators::sma(&closes, SMA_LONG);
    let rsi = indicators::rsi(&closes, RSI_PERIOD);

    Ok(DataResult::Snapshot(TechnicalSnapshot {
        symbol: symbol.to_string(),
        current_price: round2(last.close),
        sma_20: sma_20.map(round2),
        sma_50: sma_50.map(round2),
        rsi: rsi.map(round2),
        volume: last.volume,
        trend_signal: indicators::trend_signal(last.close, sma_20, sma_50),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::TrendSignal;
    use crate::market::provider::fake::StaticMarketData;
    use crate::market::StatementTable;
    use chrono::NaiveDate;

    fn expect_snapshot<T: std::fmt::Debug>(result: DataResult<T>) -> T {
        match result {
            DataResult::Snapshot(s) => s,
            other => panic!("expected a snapshot, got {other:?}"),
        }
    }

    fn fy(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap()
    }

    #[tokio::test]
    async fn price_snapshot_rounds_and_fills_profile() {
        let provider = StaticMarketData::default()
            .with_closes("MSFT", &[410.0, 415.456])
            .with_profile(
                "MSFT",
                CompanyProfile {
                    long_name: Some("Microsoft Corporation".to_string()),
                    market_cap: Some(3_100_000_000_000),
                    trailing_pe: Some(35.2),
                    fifty_two_week_high: Some(468.35),
                    fifty_two_week_low: None,
                },
            );

        let snap = expect_snapshot(fetch_price(&provider, "MSFT").await);
        assert_eq!(snap.current_price, 415.46);
        assert_eq!(snap.company_name, "Microsoft Corporation");
        assert_eq!(snap.market_cap, 3_100_000_000_000);
        assert_eq!(snap.pe_ratio, Figure::Value(35.2));
        assert_eq!(snap.fifty_two_week_high, 468.35);
        assert_eq!(snap.fifty_two_week_low, 0.0);
    }

    #[tokio::test]
    async fn price_defaults_when_profile_is_sparse() {
        let provider = StaticMarketData::default().with_closes("XYZ", &[5.0]);
        let snap = expect_snapshot(fetch_price(&provider, "XYZ").await);
        assert_eq!(snap.company_name, "XYZ");
        assert_eq!(snap.market_cap, 0);
        assert_eq!(snap.pe_ratio, Figure::Unknown);
    }

    #[tokio::test]
    async fn price_survives_profile_failure() {
        let provider = StaticMarketData::default()
            .with_closes("AAPL", &[190.0, 191.239])
            .failing_profile("AAPL");

        let snap = expect_snapshot(fetch_price(&provider, "AAPL").await);
        assert_eq!(snap.current_price, 191.24);
        assert_eq!(snap.company_name, "AAPL");
        assert_eq!(snap.market_cap, 0);
        assert_eq!(snap.pe_ratio, Figure::Unknown);
        assert_eq!(snap.fifty_two_week_high, 0.0);
        assert_eq!(snap.fifty_two_week_low, 0.0);
    }

    #[test]
    fn normalizes_requested_symbols() {
        let raw = vec![" AAPL ".to_string(), "".to_string(), "   ".to_string(), "brk-b".to_string()];
        assert_eq!(normalize_symbols(&raw), vec!["AAPL".to_string(), "brk-b".to_string()]);
    }

    #[tokio::test]
    async fn price_soft_fails_on_empty_history_and_provider_error() {
        let provider = StaticMarketData::default().failing("BAD");

        let empty = fetch_price(&provider, "NONE").await;
        assert_eq!(empty.error(), Some("Could not retrieve data for NONE"));

        let failed = fetch_price(&provider, "BAD").await;
        assert!(failed.error().unwrap().contains("provider unavailable for BAD"));
    }

    #[tokio::test]
    async fn financials_use_latest_period_and_mark_missing_items_unknown() {
        let mut income = StatementTable::default();
        income.insert(TOTAL_REVENUE, fy(2023), 90.0);
        income.insert(TOTAL_REVENUE, fy(2024), 100.0);
        income.insert(NET_INCOME, fy(2024), 20.0);

        let mut balance = StatementTable::default();
        balance.insert(TOTAL_ASSETS, fy(2024), 500.0);
        balance.insert(TOTAL_DEBT, fy(2023), 120.0);

        let provider = StaticMarketData::default().with_statements("ACME", income, balance);
        let snap = expect_snapshot(fetch_financials(&provider, "ACME").await);

        assert_eq!(snap.period, "2024");
        assert_eq!(snap.revenue, Figure::Value(100.0));
        assert_eq!(snap.net_income, Figure::Value(20.0));
        assert_eq!(snap.total_assets, Figure::Value(500.0));
        // Only reported for an older period.
        assert_eq!(snap.total_debt, Figure::Unknown);
    }

    #[tokio::test]
    async fn financials_without_total_debt_line_item() {
        let mut income = StatementTable::default();
        income.insert(TOTAL_REVENUE, fy(2024), 100.0);
        income.insert(NET_INCOME, fy(2024), 20.0);
        let mut balance = StatementTable::default();
        balance.insert(TOTAL_ASSETS, fy(2024), 500.0);

        let provider = StaticMarketData::default().with_statements("ACME", income, balance);
        let snap = expect_snapshot(fetch_financials(&provider, "ACME").await);

        assert_eq!(snap.total_debt, Figure::Unknown);
        assert_eq!(snap.revenue, Figure::Value(100.0));
        assert_eq!(snap.net_income, Figure::Value(20.0));
        assert_eq!(snap.total_assets, Figure::Value(500.0));
    }

    #[tokio::test]
    async fn financials_soft_fail_without_statement() {
        let provider = StaticMarketData::default();
        let snap = fetch_financials(&provider, "ACME").await;
        assert_eq!(snap.error(), Some("No financials for ACME"));
    }

    #[tokio::test]
    async fn short_history_is_bearish_with_null_indicators() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let provider = StaticMarketData::default().with_closes("NEW", &closes);

        let snap = expect_snapshot(fetch_technicals(&provider, "NEW", HistoryPeriod::SixMonths).await);
        assert_eq!(snap.current_price, 109.0);
        assert_eq!(snap.sma_20, None);
        assert_eq!(snap.sma_50, None);
        assert_eq!(snap.rsi, None);
        assert_eq!(snap.volume, Some(1_009));
        assert_eq!(snap.trend_signal, TrendSignal::Bearish);
    }

    #[tokio::test]
    async fn steady_uptrend_is_bullish() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let provider = StaticMarketData::default().with_closes("UP", &closes);

        let snap = expect_snapshot(fetch_technicals(&provider, "UP", HistoryPeriod::SixMonths).await);
        assert_eq!(snap.sma_20, Some(149.5));
        assert_eq!(snap.sma_50, Some(134.5));
        assert!(snap.rsi.is_some());
        assert_eq!(snap.trend_signal, TrendSignal::Bullish);
    }

    #[tokio::test]
    async fn technicals_soft_fail_on_empty_history() {
        let provider = StaticMarketData::default();
        let snap = fetch_technicals(&provider, "GONE", HistoryPeriod::SixMonths).await;
        assert_eq!(snap.error(), Some("No historical data for GONE"));
    }

    #[tokio::test]
    async fn collects_every_symbol_in_order() {
        let provider = StaticMarketData::default()
            .with_closes("A", &[1.0, 2.0])
            .failing("B");
        let symbols = vec!["A".to_string(), "B".to_string()];

        let data = collect_symbol_data(&provider, &symbols, HistoryPeriod::SixMonths).await;
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].symbol, "A");
        assert_eq!(data[0].price.error(), None);
        assert_eq!(data[0].financials.error(), Some("No financials for A"));
        assert!(data[1].technicals.error().is_some());
    }
}
