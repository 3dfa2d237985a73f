use crate::market::types::{CompanyProfile, DailyBar, HistoryPeriod, StatementTable};
use anyhow::Result;

/// Read-only market data keyed by ticker symbol.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars over `period`, oldest first.
    async fn daily_history(&self, symbol: &str, period: HistoryPeriod) -> Result<Vec<DailyBar>>;

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile>;

    async fn income_statement(&self, symbol: &str) -> Result<StatementTable>;

    async fn balance_sheet(&self, symbol: &str) -> Result<StatementTable>;
}
