mod daily_index;
mod full_day;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Date;

pub use daily_index::DailyIndexSource;
pub use full_day::FullDaySource;

use crate::envelope::MarketEnvelope;
use crate::error::SourceError;
use crate::http_client::{HttpError, HttpResponse};

/// Production base URL of the exchange report endpoints.
pub const EXCHANGE_BASE_URL: &str = "https://www.twse.com.tw/exchangeReport";

/// Identifies one upstream payload shape, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    DailyIndex,
    FullDay,
}

impl SourceId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyIndex => "daily_index",
            Self::FullDay => "full_day",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<MarketEnvelope, SourceError>> + Send + 'a>>;

/// Upstream source adapter contract: one implementation per payload shape.
pub trait MarketDataSource: Send + Sync {
    fn id(&self) -> SourceId;
    fn fetch_daily(&self, date: Date) -> FetchFuture<'_>;
}

/// Map a transport outcome to a decoded envelope, classifying failures.
pub(crate) fn decode_response(
    outcome: Result<HttpResponse, HttpError>,
) -> Result<MarketEnvelope, SourceError> {
    let response = outcome.map_err(|error| {
        if error.is_timeout() {
            SourceError::timeout(error.message().to_owned())
        } else {
            SourceError::unavailable(error.message().to_owned())
        }
    })?;

    if !response.is_success() {
        return Err(SourceError::http_status(response.status));
    }

    serde_json::from_str::<MarketEnvelope>(&response.body)
        .map_err(|error| SourceError::bad_shape(format!("undecodable envelope: {error}")))
}
