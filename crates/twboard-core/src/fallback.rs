//! Date-by-date fallback across upstream shapes.

use std::sync::Arc;
use std::time::Duration;

use time::Date;
use tracing::{info, warn};

use crate::adapters::{DailyIndexSource, FullDaySource, MarketDataSource};
use crate::domain::{format_compact, market_today, previous_trading_day};
use crate::envelope::MarketEnvelope;
use crate::error::SourceError;
use crate::http_client::HttpClient;

/// Maximum candidate trading dates tried per acquisition.
pub const MAX_ATTEMPTS: u32 = 5;

/// Courtesy delay between candidate dates; fixed, not a backoff strategy.
pub const PACING_DELAY: Duration = Duration::from_secs(1);

/// Drives the acquisition loop: for each candidate trading date the known
/// shapes are tried in priority order; on double failure the loop steps
/// back one trading day until the attempt budget is exhausted.
pub struct Acquirer {
    sources: Vec<Arc<dyn MarketDataSource>>,
    max_attempts: u32,
    pacing_delay: Duration,
}

impl Acquirer {
    /// Production acquirer: daily-index first, full-day summary second.
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self::with_sources(vec![
            Arc::new(DailyIndexSource::new(Arc::clone(&http))),
            Arc::new(FullDaySource::new(http)),
        ])
    }

    pub fn with_sources(sources: Vec<Arc<dyn MarketDataSource>>) -> Self {
        Self {
            sources,
            max_attempts: MAX_ATTEMPTS,
            pacing_delay: PACING_DELAY,
        }
    }

    pub fn with_pacing(mut self, pacing_delay: Duration) -> Self {
        self.pacing_delay = pacing_delay;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Acquire the most recent daily universe, starting at today's date.
    pub async fn acquire_daily_data(&self) -> Result<MarketEnvelope, SourceError> {
        self.acquire_from(market_today()).await
    }

    /// Acquisition loop with an explicit starting date. The first
    /// successful payload terminates the loop; a success on any retry
    /// beyond the first candidate is tagged historical with both dates.
    pub async fn acquire_from(&self, start: Date) -> Result<MarketEnvelope, SourceError> {
        let mut candidate = start;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.pacing_delay).await;
            }

            let date_str = format_compact(candidate);
            info!(
                date = %date_str,
                attempt = attempt + 1,
                budget = self.max_attempts,
                "acquiring daily market data"
            );

            for source in &self.sources {
                match source.fetch_daily(candidate).await {
                    Ok(mut envelope) => {
                        if attempt > 0 {
                            envelope.mark_historical(date_str, format_compact(start));
                        }
                        return Ok(envelope);
                    }
                    Err(error) => {
                        warn!(
                            source = %source.id(),
                            date = %date_str,
                            error = %error,
                            "upstream fetch failed; continuing fallback"
                        );
                    }
                }
            }

            candidate = previous_trading_day(candidate);
        }

        Err(SourceError::exhausted(self.max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FetchFuture, SourceId};
    use crate::error::SourceErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use time::macros::date;

    /// Scripted source: fails until `succeed_on_call`, counting calls.
    struct CountingSource {
        id: SourceId,
        calls: AtomicU32,
        succeed_on_call: u32,
    }

    impl CountingSource {
        fn new(id: SourceId, succeed_on_call: u32) -> Self {
            Self {
                id,
                calls: AtomicU32::new(0),
                succeed_on_call,
            }
        }

        fn never(id: SourceId) -> Self {
            Self::new(id, u32::MAX)
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MarketDataSource for CountingSource {
        fn id(&self) -> SourceId {
            self.id
        }

        fn fetch_daily(&self, _date: Date) -> FetchFuture<'_> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Box::pin(async move {
                if call >= self.succeed_on_call {
                    Ok(MarketEnvelope {
                        stat: String::from("OK"),
                        data9: Some(Vec::new()),
                        ..MarketEnvelope::default()
                    })
                } else {
                    Err(SourceError::timeout("scripted failure"))
                }
            })
        }
    }

    fn acquirer(sources: Vec<Arc<dyn MarketDataSource>>) -> Acquirer {
        Acquirer::with_sources(sources).with_pacing(Duration::ZERO)
    }

    #[tokio::test]
    async fn first_candidate_success_is_not_historical() {
        let primary = Arc::new(CountingSource::new(SourceId::DailyIndex, 1));
        let envelope = acquirer(vec![primary.clone()])
            .acquire_from(date!(2024 - 06 - 14))
            .await
            .expect("acquisition succeeds");

        assert_eq!(primary.calls(), 1);
        assert_eq!(envelope.is_historical_data, None);
        assert_eq!(envelope.original_date, None);
    }

    #[tokio::test]
    async fn secondary_shape_is_tried_when_primary_fails() {
        let primary = Arc::new(CountingSource::never(SourceId::DailyIndex));
        let secondary = Arc::new(CountingSource::new(SourceId::FullDay, 1));

        acquirer(vec![primary.clone(), secondary.clone()])
            .acquire_from(date!(2024 - 06 - 14))
            .await
            .expect("secondary succeeds");

        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn retry_success_is_tagged_historical_with_both_dates() {
        // Fails on Friday, succeeds on Thursday.
        let primary = Arc::new(CountingSource::new(SourceId::DailyIndex, 2));
        let envelope = acquirer(vec![primary])
            .acquire_from(date!(2024 - 06 - 14))
            .await
            .expect("acquisition succeeds");

        assert_eq!(envelope.is_historical_data, Some(true));
        assert_eq!(envelope.original_date.as_deref(), Some("20240613"));
        assert_eq!(envelope.current_date.as_deref(), Some("20240614"));
    }

    #[tokio::test]
    async fn budget_exhaustion_is_terminal_after_five_attempts() {
        let primary = Arc::new(CountingSource::never(SourceId::DailyIndex));
        let secondary = Arc::new(CountingSource::never(SourceId::FullDay));

        let error = acquirer(vec![primary.clone(), secondary.clone()])
            .acquire_from(date!(2024 - 06 - 14))
            .await
            .expect_err("must exhaust");

        assert_eq!(error.kind(), SourceErrorKind::Exhausted);
        assert_eq!(primary.calls(), MAX_ATTEMPTS);
        assert_eq!(secondary.calls(), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn candidate_dates_skip_weekends() {
        // Starting Monday the 17th, the third candidate is Thursday the
        // 13th: Mon 17 -> Fri 14 -> Thu 13, never Sat/Sun.
        let primary = Arc::new(CountingSource::new(SourceId::DailyIndex, 3));
        let envelope = acquirer(vec![primary])
            .acquire_from(date!(2024 - 06 - 17))
            .await
            .expect("acquisition succeeds");

        assert_eq!(envelope.original_date.as_deref(), Some("20240613"));
    }
}
