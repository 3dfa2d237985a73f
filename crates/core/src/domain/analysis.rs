use serde::Serialize;
use std::collections::BTreeMap;

/// Trailing simple returns by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Symbol -> fractional return (0.15 = +15%). Only symbols with usable history appear here.
    pub returns: BTreeMap<String, f64>,
    /// Symbols dropped from `returns` because no usable history came back.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<String>,
}

/// Free-text output of the three per-symbol analysts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisBundle {
    pub fundamental: String,
    pub technical: String,
    pub risk: String,
}
