use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SourceError;

/// One positional upstream row; cells may be strings or bare numbers.
pub type RawRow = Vec<Value>;

/// Column header of the daily-summary envelope, carried verbatim from the
/// exchange so downstream consumers see the documented layout.
pub const DAILY_SUMMARY_FIELDS: [&str; 16] = [
    "證券代號",
    "證券名稱",
    "成交股數",
    "成交筆數",
    "成交金額",
    "開盤價",
    "最高價",
    "最低價",
    "收盤價",
    "漲跌(+/-)",
    "漲跌價差",
    "最後揭示買價",
    "最後揭示買量",
    "最後揭示賣價",
    "最後揭示賣量",
    "本益比",
];

/// Raw upstream envelope, serialized unchanged over `/api/stock-data`.
///
/// Exactly one of two layouts is populated: the daily-index shape keeps its
/// rows in `data9` (with an optional `fields9` header), the full-day-summary
/// shape uses `fields` + `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MarketEnvelope {
    #[serde(default)]
    pub stat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<RawRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields9: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data9: Option<Vec<RawRow>>,
    #[serde(
        rename = "isHistoricalData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_historical_data: Option<bool>,
    #[serde(
        rename = "originalDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_date: Option<String>,
    #[serde(
        rename = "currentDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_date: Option<String>,
}

/// Shape-tagged view over an envelope's rows, selected by payload
/// discriminant rather than by caller convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyShape {
    /// All-exchange rows keyed positionally; transaction count sits at a
    /// fixed offset validated against the header when one is present.
    DailyIndex,
    /// One row per instrument in the documented full-day column order.
    FullDaySummary,
}

impl DailyShape {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyIndex => "daily_index",
            Self::FullDaySummary => "full_day_summary",
        }
    }
}

impl MarketEnvelope {
    pub fn is_ok(&self) -> bool {
        self.stat == "OK"
    }

    /// Select the decoder for this envelope by its payload discriminant.
    pub fn classify(&self) -> Result<DailyShape, SourceError> {
        if !self.is_ok() {
            return Err(SourceError::bad_shape(format!(
                "upstream status marker was '{}', expected 'OK'",
                self.stat
            )));
        }
        if self.data9.is_some() {
            return Ok(DailyShape::DailyIndex);
        }
        if self.data.is_some() {
            return Ok(DailyShape::FullDaySummary);
        }
        Err(SourceError::bad_shape(
            "envelope carries neither 'data9' nor 'data' rows",
        ))
    }

    /// Rows of the selected shape. Empty only for an envelope that fails
    /// classification.
    pub fn rows(&self) -> &[RawRow] {
        match (self.data9.as_deref(), self.data.as_deref()) {
            (Some(rows), _) => rows,
            (None, Some(rows)) => rows,
            (None, None) => &[],
        }
    }

    /// Tag a successfully acquired envelope as historical disclosure for
    /// the caller.
    pub fn mark_historical(&mut self, original_date: String, current_date: String) {
        self.is_historical_data = Some(true);
        self.original_date = Some(original_date);
        self.current_date = Some(current_date);
    }
}
