pub mod provider;
pub mod types;
pub mod yahoo;

pub use provider::MarketDataProvider;
pub use types::{is_valid_symbol, CompanyProfile, DailyBar, HistoryPeriod, StatementTable};
