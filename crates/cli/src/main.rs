use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tickerdesk_core::domain::analysis::ComparisonResult;
use tickerdesk_core::domain::snapshot::SymbolData;
use tickerdesk_core::fetch::normalize_symbols;
use tickerdesk_core::llm::error::LlmDiagnosticsError;
use tickerdesk_core::market::yahoo::YahooFinanceProvider;
use tickerdesk_core::market::{is_valid_symbol, HistoryPeriod};
use tickerdesk_core::report::ReportGenerator;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "tickerdesk")]
struct Args {
    /// Ticker symbols to compare, e.g. AAPL MSFT.
    #[arg(required = true)]
    symbols: Vec<String>,

    /// Fetch and print the market data only, without calling the model.
    #[arg(long)]
    dry_run: bool,

    /// History window used for the technical indicators.
    #[arg(long, default_value = "6mo")]
    period: HistoryPeriod,
}

#[derive(Debug, Serialize)]
struct DryRunOutput {
    symbols: Vec<SymbolData>,
    comparison: ComparisonResult,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tickerdesk_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let symbols = normalize_symbols(&args.symbols);
    anyhow::ensure!(!symbols.is_empty(), "at least one non-blank symbol is required");
    if let Some(bad) = symbols.iter().find(|s| !is_valid_symbol(s)) {
        anyhow::bail!("invalid symbol: {bad}");
    }

    let market = YahooFinanceProvider::from_settings(&settings)?;

    if args.dry_run {
        let data =
            tickerdesk_core::fetch::collect_symbol_data(&market, &symbols, args.period).await;
        let comparison = tickerdesk_core::compare::compare_returns(&market, &symbols).await;
        tracing::info!(
            dry_run = true,
            symbols = symbols.len(),
            compared = comparison.returns.len(),
            "fetched market data"
        );

        let out = DryRunOutput {
            symbols: data,
            comparison,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("failed to serialize dry-run output")?
        );
        return Ok(());
    }

    let llm = tickerdesk_core::llm::connect_from_settings(&settings)?;
    let result = ReportGenerator::new(&market, llm.as_ref())
        .with_technical_period(args.period)
        .generate(&symbols)
        .await;

    match result {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
                tracing::error!(
                    provider = %diag.provider,
                    stage = diag.stage,
                    raw_output = diag.raw_output.as_deref().unwrap_or(""),
                    "model call rejected"
                );
            }
            tracing::error!(symbols = ?symbols, error = %format!("{err:#}"), "report run failed");
            Err(err)
        }
    }
}

fn init_sentry(settings: &tickerdesk_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
