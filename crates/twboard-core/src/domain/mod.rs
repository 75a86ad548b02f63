pub mod models;
pub mod record;
pub mod trading_day;

pub use models::{EtfEntry, FinanceSnapshot, IndexQuote, Industry, StockProfile, UNAVAILABLE};
pub use record::StockRecord;
pub use trading_day::{format_compact, market_today, parse_compact, previous_trading_day};
