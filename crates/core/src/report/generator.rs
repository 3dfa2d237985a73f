use crate::agents::{COORDINATOR, FUNDAMENTAL_ANALYST, MARKET_ANALYST, RISK_ANALYST, TECHNICAL_ANALYST};
use crate::compare::compare_returns;
use crate::domain::analysis::AnalysisBundle;
use crate::domain::snapshot::SymbolData;
use crate::fetch::collect_symbol_data;
use crate::llm::LlmClient;
use crate::market::{HistoryPeriod, MarketDataProvider};
use crate::report::prompts;
use std::collections::BTreeMap;
use std::time::Instant;

/// Runs the fetch -> analyst -> coordinator pipeline for one request.
///
/// Every provider and model call is awaited in turn; N symbols cost 3N + 2 model calls. Any
/// model failure aborts the whole report.
pub struct ReportGenerator<'a> {
    market: &'a dyn MarketDataProvider,
    llm: &'a dyn LlmClient,
    technical_period: HistoryPeriod,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(market: &'a dyn MarketDataProvider, llm: &'a dyn LlmClient) -> Self {
        Self {
            market,
            llm,
            technical_period: HistoryPeriod::SixMonths,
        }
    }

    pub fn with_technical_period(mut self, period: HistoryPeriod) -> Self {
        self.technical_period = period;
        self
    }

    pub async fn generate(&self, symbols: &[String]) -> anyhow::Result<String> {
        anyhow::ensure!(!symbols.is_empty(), "at least one symbol is required");
        let started = Instant::now();

        let data = collect_symbol_data(self.market, symbols, self.technical_period).await;
        let analyses = self.analyze(&data).await?;

        let comparison = compare_returns(self.market, symbols).await;
        let market_view = MARKET_ANALYST
            .run(self.llm, prompts::market_prompt(&comparison)?)
            .await?;

        let prompt = prompts::coordinator_prompt(&comparison, &market_view, &analyses)?;
        let report = COORDINATOR.run(self.llm, prompt).await?;

        tracing::info!(
            symbols = symbols.len(),
            compared = comparison.returns.len(),
            omitted = comparison.omitted.len(),
            provider = %self.llm.provider(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report generated"
        );
        Ok(report)
    }

    async fn analyze(&self, data: &[SymbolData]) -> anyhow::Result<BTreeMap<String, AnalysisBundle>> {
        let mut out = BTreeMap::new();
        for item in data {
            let fundamental = FUNDAMENTAL_ANALYST
                .run(self.llm, prompts::fundamental_prompt(item)?)
                .await?;
            let technical = TECHNICAL_ANALYST
                .run(self.llm, prompts::technical_prompt(item)?)
                .await?;
            let risk = RISK_ANALYST
                .run(self.llm, prompts::risk_prompt(item)?)
                .await?;

            tracing::info!(symbol = %item.symbol, "symbol analyzed");
            out.insert(
                item.symbol.clone(),
                AnalysisBundle {
                    fundamental,
                    technical,
                    risk,
                },
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedLlm;
    use crate::market::provider::fake::StaticMarketData;

    fn symbols(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn issues_three_calls_per_symbol_then_market_and_coordinator() {
        let provider = StaticMarketData::default()
            .with_closes("A", &[100.0, 125.0])
            .with_closes("B", &[50.0, 25.0]);
        let llm = ScriptedLlm::new(|idx, _| Ok(format!("reply#{idx}")));

        let report = ReportGenerator::new(&provider, &llm)
            .generate(&symbols(&["A", "B"]))
            .await
            .unwrap();
        assert_eq!(report, "reply#7");

        let calls = llm.calls();
        assert_eq!(calls.len(), 3 * 2 + 2);

        let systems: Vec<String> = calls.iter().map(|c| c.system.clone().unwrap()).collect();
        assert_eq!(systems[0], FUNDAMENTAL_ANALYST.system_prompt());
        assert_eq!(systems[1], TECHNICAL_ANALYST.system_prompt());
        assert_eq!(systems[2], RISK_ANALYST.system_prompt());
        assert_eq!(systems[3], FUNDAMENTAL_ANALYST.system_prompt());
        assert_eq!(systems[6], MARKET_ANALYST.system_prompt());
        assert_eq!(systems[7], COORDINATOR.system_prompt());

        assert!(calls[0].prompt.starts_with("Fundamental analysis for A."));
        assert!(calls[4].prompt.starts_with("Technical analysis for B."));
        assert_eq!(
            calls[6].prompt,
            "Compare stock performance (6M total return): {\"A\":0.25,\"B\":-0.5}"
        );

        let coordinator = &calls[7].prompt;
        assert!(coordinator.contains("Market: {\"A\":0.25,\"B\":-0.5}"));
        assert!(coordinator.contains("Market View: reply#6"));
        assert!(coordinator.contains("Fundamentals: {\"A\":\"reply#0\",\"B\":\"reply#3\"}"));
        assert!(coordinator.contains("Technicals: {\"A\":\"reply#1\",\"B\":\"reply#4\"}"));
        assert!(coordinator.contains("Risks: {\"A\":\"reply#2\",\"B\":\"reply#5\"}"));
    }

    #[tokio::test]
    async fn missing_data_flows_into_prompts_as_error_text() {
        let provider = StaticMarketData::default();
        let llm = ScriptedLlm::new(|_, _| Ok("noted".to_string()));

        ReportGenerator::new(&provider, &llm)
            .generate(&symbols(&["GHOST"]))
            .await
            .unwrap();

        let calls = llm.calls();
        assert!(calls[1]
            .prompt
            .contains("\"error\": \"No historical data for GHOST\""));
        assert!(calls[3]
            .prompt
            .ends_with("{}\nNo 6M price history was available for: GHOST."));
    }

    #[tokio::test]
    async fn agent_failure_aborts_generation() {
        let provider = StaticMarketData::default().with_closes("A", &[1.0, 2.0]);
        let llm = ScriptedLlm::new(|idx, _| {
            if idx == 2 {
                anyhow::bail!("model overloaded");
            }
            Ok("fine".to_string())
        });

        let err = ReportGenerator::new(&provider, &llm)
            .generate(&symbols(&["A"]))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("risk agent call failed: model overloaded"));
        assert_eq!(llm.calls().len(), 3);
    }

    #[tokio::test]
    async fn rejects_empty_symbol_list() {
        let provider = StaticMarketData::default();
        let llm = ScriptedLlm::new(|_, _| Ok(String::new()));
        assert!(ReportGenerator::new(&provider, &llm).generate(&[]).await.is_err());
        assert!(llm.calls().is_empty());
    }
}
