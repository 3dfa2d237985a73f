use crate::domain::analysis::{AnalysisBundle, ComparisonResult};
use crate::domain::snapshot::SymbolData;
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;

fn pretty<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize prompt data")
}

fn compact<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string(value).context("failed to serialize prompt data")
}

pub fn fundamental_prompt(data: &SymbolData) -> anyhow::Result<String> {
    let price = pretty(&data.price)?;
    let financials = pretty(&data.financials)?;
    Ok(format!(
        "Fundamental analysis for {symbol}. Data:\n\
Price: {price}\n\
Financials: {financials}\n\
Deliver: bullet key points, valuation view if possible, and a 1-10 fundamental score.",
        symbol = data.symbol
    ))
}

pub fn technical_prompt(data: &SymbolData) -> anyhow::Result<String> {
    let technicals = pretty(&data.technicals)?;
    Ok(format!(
        "Technical analysis for {symbol}. Indicators: {technicals}.\n\
Interpret RSI(14), SMA(20), SMA(50), volume; produce signals and a 1-10 technical score.",
        symbol = data.symbol
    ))
}

pub fn risk_prompt(data: &SymbolData) -> anyhow::Result<String> {
    let price = pretty(&data.price)?;
    let financials = pretty(&data.financials)?;
    Ok(format!(
        "Risk analysis for {symbol}. Context: Price {price}, Financials {financials}.\n\
List top 3 risks, mitigants, and a 1-10 risk score (lower is riskier).",
        symbol = data.symbol
    ))
}

pub fn market_prompt(comparison: &ComparisonResult) -> anyhow::Result<String> {
    let mut out = format!(
        "Compare stock performance (6M total return): {}",
        compact(&comparison.returns)?
    );
    if !comparison.omitted.is_empty() {
        out.push_str(&format!(
            "\nNo 6M price history was available for: {}.",
            comparison.omitted.join(", ")
        ));
    }
    Ok(out)
}

pub fn coordinator_prompt(
    comparison: &ComparisonResult,
    market_view: &str,
    analyses: &BTreeMap<String, AnalysisBundle>,
) -> anyhow::Result<String> {
    let fundamentals: BTreeMap<&str, &str> = analyses
        .iter()
        .map(|(s, a)| (s.as_str(), a.fundamental.as_str()))
        .collect();
    let technicals: BTreeMap<&str, &str> = analyses
        .iter()
        .map(|(s, a)| (s.as_str(), a.technical.as_str()))
        .collect();
    let risks: BTreeMap<&str, &str> = analyses
        .iter()
        .map(|(s, a)| (s.as_str(), a.risk.as_str()))
        .collect();

    Ok(format!(
        "You are the investment coordinator. Combine the following per-symbol analyses \
(fundamental, technical, risk) with market context to produce a final investor-friendly report.\n\
Market: {market}\n\
Market View: {market_view}\n\n\
Fundamentals: {fundamentals}\n\n\
Technicals: {technicals}\n\n\
Risks: {risks}\n\n\
Output:\n\
- Summary of market context\n\
- Per-symbol section with scores (fundamental, technical, risk) and key bullets\n\
- Overall Buy/Hold/Sell with target range if possible\n\
- Ranked list of symbols with short rationale\n",
        market = compact(&comparison.returns)?,
        fundamentals = compact(&fundamentals)?,
        technicals = compact(&technicals)?,
        risks = compact(&risks)?,
    ))
}
