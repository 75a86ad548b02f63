//! Ranks the normalized universe by trading volume and answers ad-hoc
//! filter queries over it.

use serde::Deserialize;

use crate::domain::StockRecord;

/// Display cutoff: only the top N instruments by volume are ranked.
pub const RANKED_UNIVERSE_LIMIT: usize = 500;

/// Tolerance for the equality predicate on decimal fields.
const EQUALITY_EPSILON: f64 = 0.01;

/// Stable sort by descending volume (ties keep upstream order), truncate
/// to the display cutoff, assign dense 1-based ranks. Records with no
/// traded volume are excluded first. Idempotent.
pub fn rank(mut records: Vec<StockRecord>) -> Vec<StockRecord> {
    records.retain(StockRecord::is_rankable);
    records.sort_by(|left, right| right.volume.cmp(&left.volume));
    records.truncate(RANKED_UNIVERSE_LIMIT);
    for (index, record) in records.iter_mut().enumerate() {
        record.rank = index as u32 + 1;
    }
    records
}

/// Field a filter query applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    /// Substring match against either code or name.
    #[serde(rename = "name")]
    CodeOrName,
    #[serde(rename = "volume")]
    Volume,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "change")]
    ChangePercent,
    #[serde(rename = "transaction")]
    TransactionCount,
}

/// Predicate applied to the selected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCondition {
    Contains,
    Greater,
    Less,
    Equal,
}

/// One ad-hoc filter query over a ranked set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockFilter {
    #[serde(rename = "type")]
    pub field: FilterField,
    pub condition: FilterCondition,
    pub value: String,
}

/// Apply a filter. An empty value means "no filter" and returns the input
/// unchanged; a non-numeric value on a numeric field matches nothing.
pub fn filter(records: &[StockRecord], query: &StockFilter) -> Vec<StockRecord> {
    let value = query.value.trim();
    if value.is_empty() {
        return records.to_vec();
    }

    match query.field {
        FilterField::CodeOrName => {
            if query.condition != FilterCondition::Contains {
                return Vec::new();
            }
            let needle = value.to_lowercase();
            records
                .iter()
                .filter(|record| {
                    record.code.to_lowercase().contains(&needle)
                        || record.name.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect()
        }
        numeric_field => {
            let stripped = value.replace(',', "");
            let Ok(threshold) = stripped.parse::<f64>() else {
                // Non-numeric input resolves to "no match", never an error.
                return Vec::new();
            };
            records
                .iter()
                .filter(|record| {
                    let actual = numeric_value(record, numeric_field);
                    match query.condition {
                        FilterCondition::Greater => actual > threshold,
                        FilterCondition::Less => actual < threshold,
                        FilterCondition::Equal => (actual - threshold).abs() < EQUALITY_EPSILON,
                        FilterCondition::Contains => false,
                    }
                })
                .cloned()
                .collect()
        }
    }
}

fn numeric_value(record: &StockRecord, field: FilterField) -> f64 {
    match field {
        FilterField::Volume => record.volume as f64,
        FilterField::Price => record.price,
        FilterField::ChangePercent => record.change_percent,
        FilterField::TransactionCount => record.transaction_count as f64,
        FilterField::CodeOrName => 0.0,
    }
}
