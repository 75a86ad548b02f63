use serde::{Deserialize, Serialize};

/// Sentinel value used when a per-symbol financial field is unavailable.
pub const UNAVAILABLE: &str = "N/A";

/// One tracked global market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
}

/// One entry of the exchange's industry code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub code: String,
    pub name: String,
}

/// One entry of the ETF directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtfEntry {
    pub code: String,
    pub name: String,
    pub index: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub manager: String,
}

/// Company profile from the listed-company directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockProfile {
    pub code: String,
    pub name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub industry: String,
    pub chairman: String,
    pub listed: String,
    pub website: String,
}

/// Per-symbol financial snapshot. Every field is a display string so the
/// unavailable placeholder can carry the `"N/A"` sentinel uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceSnapshot {
    pub code: String,
    pub name: String,
    pub eps: String,
    pub revenue: String,
    #[serde(rename = "operatingIncome")]
    pub operating_income: String,
    #[serde(rename = "netIncome")]
    pub net_income: String,
}

impl FinanceSnapshot {
    /// Fully-populated placeholder served when the upstream snapshot cannot
    /// be fetched; the finance endpoint never fails outright.
    pub fn unavailable(code: &str) -> Self {
        Self {
            code: code.to_owned(),
            name: UNAVAILABLE.to_owned(),
            eps: UNAVAILABLE.to_owned(),
            revenue: UNAVAILABLE.to_owned(),
            operating_income: UNAVAILABLE.to_owned(),
            net_income: UNAVAILABLE.to_owned(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.eps == UNAVAILABLE && self.revenue == UNAVAILABLE
    }
}
