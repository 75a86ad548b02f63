//! Core pipeline for twboard.
//!
//! This crate contains:
//! - Canonical domain models and trading-day arithmetic
//! - Upstream envelope decoding and row normalization
//! - Data source adapters and the date-fallback acquisition loop
//! - Volume ranking, filter queries, and the TTL resource cache

pub mod adapters;
pub mod cache;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod mapper;
pub mod numeric;
pub mod ranking;
pub mod resources;

pub use adapters::{DailyIndexSource, FullDaySource, MarketDataSource, SourceId};
pub use cache::{CacheOutcome, Cached, ResourceCache, ResourceKey, DEFAULT_TTL};
pub use domain::{
    format_compact, market_today, parse_compact, previous_trading_day, EtfEntry, FinanceSnapshot,
    IndexQuote, Industry, StockProfile, StockRecord, UNAVAILABLE,
};
pub use envelope::{DailyShape, MarketEnvelope, RawRow, DAILY_SUMMARY_FIELDS};
pub use error::{SourceError, SourceErrorKind};
pub use fallback::{Acquirer, MAX_ATTEMPTS, PACING_DELAY};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient,
    BROWSER_USER_AGENT,
};
pub use mapper::normalize_envelope;
pub use ranking::{filter, rank, FilterCondition, FilterField, StockFilter, RANKED_UNIVERSE_LIMIT};
pub use resources::{sample_industries, ResourceService, TRACKED_INDICES};
