use std::sync::Arc;

use time::Date;

use crate::adapters::{decode_response, FetchFuture, MarketDataSource, SourceId, EXCHANGE_BASE_URL};
use crate::domain::format_compact;
use crate::envelope::{MarketEnvelope, DAILY_SUMMARY_FIELDS};
use crate::error::SourceError;
use crate::http_client::{HttpClient, HttpRequest};

/// Adapter for the per-instrument full-day report (`STOCK_DAY_ALL`), the
/// secondary shape tried when the daily index is unavailable.
///
/// The raw report has no header; rows are re-emitted under the documented
/// daily-summary `fields`/`data` envelope so consumers only ever see one of
/// two envelope layouts.
pub struct FullDaySource {
    http: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl FullDaySource {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http, EXCHANGE_BASE_URL)
    }

    pub fn with_base_url(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timeout_ms: 10_000,
        }
    }
}

impl MarketDataSource for FullDaySource {
    fn id(&self) -> SourceId {
        SourceId::FullDay
    }

    fn fetch_daily(&self, date: Date) -> FetchFuture<'_> {
        let request = HttpRequest::get(format!("{}/STOCK_DAY_ALL", self.base_url))
            .with_query("response", "json")
            .with_query("date", &format_compact(date))
            .with_browser_user_agent()
            .with_timeout_ms(self.timeout_ms);

        Box::pin(async move {
            let upstream = decode_response(self.http.execute(request).await)?;
            let upstream_ok = upstream.is_ok();
            let Some(rows) = upstream.data else {
                return Err(SourceError::bad_shape(
                    "full-day report returned no 'data' rows",
                ));
            };
            if !upstream_ok {
                return Err(SourceError::bad_shape(format!(
                    "full-day report status marker was '{}'",
                    upstream.stat
                )));
            }

            Ok(MarketEnvelope {
                stat: String::from("OK"),
                title: Some(String::from("個股日成交資訊")),
                fields: Some(
                    DAILY_SUMMARY_FIELDS
                        .iter()
                        .map(|name| String::from(*name))
                        .collect(),
                ),
                data: Some(rows),
                ..MarketEnvelope::default()
            })
        })
    }
}
