use crate::domain::analysis::ComparisonResult;
use crate::market::{HistoryPeriod, MarketDataProvider};

/// Trailing 6-month simple return, `last / first - 1`, for each symbol.
///
/// Symbols whose history is empty, fails to load, or yields a non-finite return are left out of
/// `returns` and listed in `omitted` instead.
pub async fn compare_returns(
    provider: &dyn MarketDataProvider,
    symbols: &[String],
) -> ComparisonResult {
    let mut out = ComparisonResult::default();

    for symbol in symbols {
        match provider.daily_history(symbol, HistoryPeriod::SixMonths).await {
            Ok(bars) => {
                let ret = match (bars.first(), bars.last()) {
                    (Some(first), Some(last)) => Some(last.close / first.close - 1.0),
                    _ => None,
                };
                match ret.filter(|r| r.is_finite()) {
                    Some(r) => {
                        out.returns.insert(symbol.clone(), r);
                    }
                    None => {
                        tracing::warn!(%symbol, bars = bars.len(), "no usable history; omitting from comparison");
                        out.omitted.push(symbol.clone());
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "history fetch failed; omitting from comparison");
                out.omitted.push(symbol.clone());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::provider::fake::StaticMarketData;

    fn symbols(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn computes_simple_returns() {
        let provider = StaticMarketData::default()
            .with_closes("A", &[100.0, 105.0, 110.0])
            .with_closes("B", &[50.0, 45.0]);

        let res = compare_returns(&provider, &symbols(&["A", "B"])).await;
        assert_eq!(res.returns.len(), 2);
        assert!((res.returns["A"] - 0.10).abs() < 1e-12);
        assert!((res.returns["B"] + 0.10).abs() < 1e-12);
        assert!(res.omitted.is_empty());
    }

    #[tokio::test]
    async fn omits_symbols_without_history() {
        let provider = StaticMarketData::default()
            .with_closes("A", &[100.0, 110.0])
            .with_closes("EMPTY", &[])
            .with_closes("ZERO", &[0.0, 10.0])
            .failing("ERR");

        let res = compare_returns(&provider, &symbols(&["A", "EMPTY", "ERR", "ZERO"])).await;
        assert_eq!(res.returns.keys().collect::<Vec<_>>(), vec!["A"]);
        assert!(!res.returns.contains_key("EMPTY"));
        assert_eq!(res.omitted, symbols(&["EMPTY", "ERR", "ZERO"]));
    }

    #[tokio::test]
    async fn single_bar_history_is_flat() {
        let provider = StaticMarketData::default().with_closes("ONE", &[42.0]);
        let res = compare_returns(&provider, &symbols(&["ONE"])).await;
        assert_eq!(res.returns["ONE"], 0.0);
    }
}
