use std::sync::Arc;

use time::Date;

use crate::adapters::{decode_response, FetchFuture, MarketDataSource, SourceId, EXCHANGE_BASE_URL};
use crate::domain::format_compact;
use crate::error::SourceError;
use crate::http_client::{HttpClient, HttpRequest};

/// Adapter for the all-exchange daily-index report (`MI_INDEX`), the
/// primary shape. Rows arrive keyed positionally in `data9`.
pub struct DailyIndexSource {
    http: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl DailyIndexSource {
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

impl MarketDataSource for DailyIndexSource {
    fn id(&self) -> SourceId {
        SourceId::DailyIndex
    }

    fn fetch_daily(&self, date: Date) -> FetchFuture<'_> {
        let request = HttpRequest::get(format!("{}/MI_INDEX", self.base_url))
            .with_query("response", "json")
            .with_query("date", &format_compact(date))
            .with_query("type", "ALL")
            .with_browser_user_agent()
            .with_timeout_ms(self.timeout_ms);

        Box::pin(async move {
            let envelope = decode_response(self.http.execute(request).await)?;
            if !envelope.is_ok() || envelope.data9.is_none() {
                return Err(SourceError::bad_shape(
                    "daily-index report returned no 'data9' rows",
                ));
            }
            Ok(envelope)
        })
    }
}
