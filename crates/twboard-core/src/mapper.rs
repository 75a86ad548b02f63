//! Maps each known upstream row shape into the canonical record.

use tracing::debug;

use crate::domain::StockRecord;
use crate::envelope::{DailyShape, MarketEnvelope, RawRow};
use crate::error::SourceError;
use crate::numeric::{cell_f64, cell_str, cell_u64};

/// Minimum column count per shape; shorter rows are discarded before
/// mapping.
pub const DAILY_INDEX_MIN_FIELDS: usize = 16;
pub const FULL_DAY_MIN_FIELDS: usize = 10;

/// Default position of the transaction-count column in the daily-index
/// shape. The layout is otherwise undocumented upstream, so the offset is
/// validated against the field-name header whenever one is present.
const DAILY_INDEX_TRANSACTION_OFFSET: usize = 3;
const TRANSACTION_HEADER: &str = "成交筆數";

/// Resolve the transaction-count offset for a daily-index envelope,
/// preferring the header over the fixed offset.
pub fn transaction_index(fields: Option<&[String]>) -> usize {
    let Some(fields) = fields else {
        return DAILY_INDEX_TRANSACTION_OFFSET;
    };
    match fields.iter().position(|name| name == TRANSACTION_HEADER) {
        Some(index) => {
            if index != DAILY_INDEX_TRANSACTION_OFFSET {
                debug!(
                    index,
                    "daily-index transaction column moved; following the header"
                );
            }
            index
        }
        None => DAILY_INDEX_TRANSACTION_OFFSET,
    }
}

/// Decode one daily-index row. `None` when the row is too short.
pub fn map_daily_index_row(row: &RawRow, transaction_index: usize) -> Option<StockRecord> {
    if row.len() < DAILY_INDEX_MIN_FIELDS {
        return None;
    }

    let price = cell_f64(&row[8]);
    let change = cell_f64(&row[9]);

    Some(StockRecord {
        code: cell_str(&row[0]).trim().to_owned(),
        name: cell_str(&row[1]).trim().to_owned(),
        volume: cell_u64(&row[2]),
        price,
        change,
        change_percent: cell_f64(&row[10]),
        open: cell_f64(&row[5]),
        high: cell_f64(&row[6]),
        low: cell_f64(&row[7]),
        previous_close: price - change,
        transaction_count: row.get(transaction_index).map(cell_u64).unwrap_or(0),
        rank: 0,
    })
}

/// Decode one full-day-summary row: code, name, traded shares, traded
/// value, open, high, low, close, price change, transaction count.
pub fn map_full_day_row(row: &RawRow) -> Option<StockRecord> {
    if row.len() < FULL_DAY_MIN_FIELDS {
        return None;
    }

    let traded_shares = cell_u64(&row[2]);
    let price = cell_f64(&row[7]);
    let change = cell_f64(&row[8]);
    let previous_close = price - change;
    let change_percent = if previous_close > 0.0 {
        change / previous_close * 100.0
    } else {
        0.0
    };

    Some(StockRecord {
        code: cell_str(&row[0]).trim().to_owned(),
        name: cell_str(&row[1]).trim().to_owned(),
        // Traded shares to lot volume, floored.
        volume: traded_shares / 1000,
        price,
        change,
        change_percent,
        open: cell_f64(&row[4]),
        high: cell_f64(&row[5]),
        low: cell_f64(&row[6]),
        previous_close,
        transaction_count: cell_u64(&row[9]),
        rank: 0,
    })
}

/// Decode an acquired envelope into canonical records, dropping rows that
/// fail the per-shape field-count check or map to an empty code or
/// non-positive volume.
pub fn normalize_envelope(envelope: &MarketEnvelope) -> Result<Vec<StockRecord>, SourceError> {
    let shape = envelope.classify()?;
    let records = match shape {
        DailyShape::DailyIndex => {
            let offset = transaction_index(envelope.fields9.as_deref());
            envelope
                .rows()
                .iter()
                .filter_map(|row| map_daily_index_row(row, offset))
                .filter(StockRecord::is_rankable)
                .collect()
        }
        DailyShape::FullDaySummary => envelope
            .rows()
            .iter()
            .filter_map(map_full_day_row)
            .filter(StockRecord::is_rankable)
            .collect(),
    };
    Ok(records)
}
