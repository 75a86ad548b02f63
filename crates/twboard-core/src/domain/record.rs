use serde::{Deserialize, Serialize};

/// Canonical, shape-independent representation of one equity's daily data.
///
/// `volume` is counted in lots; `rank` is assigned by the ranking pass and
/// is not intrinsic to the instrument (0 until assigned).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub code: String,
    pub name: String,
    pub volume: u64,
    pub price: f64,
    pub change: f64,
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    #[serde(rename = "previousClose")]
    pub previous_close: f64,
    #[serde(rename = "transaction")]
    pub transaction_count: u64,
    #[serde(default)]
    pub rank: u32,
}

impl StockRecord {
    /// Records with no traded volume are excluded from the ranked universe.
    pub fn is_rankable(&self) -> bool {
        !self.code.is_empty() && self.volume > 0
    }
}
