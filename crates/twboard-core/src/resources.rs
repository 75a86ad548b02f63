//! Fetchers for ancillary datasets: global index quotes, the industry code
//! table, the ETF directory, and per-symbol profile/finance snapshots.

use std::sync::Arc;

use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::warn;

use crate::domain::{EtfEntry, FinanceSnapshot, IndexQuote, Industry, StockProfile};
use crate::error::SourceError;
use crate::http_client::{HttpClient, HttpError, HttpRequest};

/// Production base URL for index quote charts.
pub const QUOTE_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Production base URL for the exchange's open-data directory endpoints.
pub const OPENAPI_BASE_URL: &str = "https://openapi.twse.com.tw/v1";

/// Global indices shown on the board, in display order.
pub const TRACKED_INDICES: [(&str, &str); 6] = [
    ("^TWII", "台股加權"),
    ("^N225", "日經 225"),
    ("^HSI", "恒生指數"),
    ("^GSPC", "S&P 500"),
    ("^DJI", "道瓊工業"),
    ("^IXIC", "那斯達克"),
];

/// Industry code table served when the upstream directory is unreachable.
const INDUSTRY_TABLE: [(&str, &str); 22] = [
    ("01", "水泥工業"),
    ("02", "食品工業"),
    ("03", "塑膠工業"),
    ("04", "紡織纖維"),
    ("05", "電機機械"),
    ("06", "電器電纜"),
    ("08", "玻璃陶瓷"),
    ("09", "造紙工業"),
    ("10", "鋼鐵工業"),
    ("11", "橡膠工業"),
    ("12", "汽車工業"),
    ("14", "建材營造"),
    ("15", "航運業"),
    ("16", "觀光餐旅"),
    ("17", "金融保險"),
    ("18", "貿易百貨"),
    ("20", "其他"),
    ("24", "半導體業"),
    ("25", "電腦及週邊設備業"),
    ("26", "光電業"),
    ("27", "通信網路業"),
    ("28", "電子零組件業"),
];

/// The built-in industry table, used as offline sample data.
pub fn sample_industries() -> Vec<Industry> {
    INDUSTRY_TABLE
        .iter()
        .map(|(code, name)| Industry {
            code: (*code).to_owned(),
            name: (*name).to_owned(),
        })
        .collect()
}

fn industry_name(code: &str) -> String {
    INDUSTRY_TABLE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| (*name).to_owned())
        .unwrap_or_else(|| code.to_owned())
}

/// Upstream fetchers for every ancillary resource type. All calls go
/// through the injected transport; the service holds no mutable state.
#[derive(Clone)]
pub struct ResourceService {
    http: Arc<dyn HttpClient>,
    quote_base_url: String,
    openapi_base_url: String,
}

impl ResourceService {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            quote_base_url: String::from(QUOTE_BASE_URL),
            openapi_base_url: String::from(OPENAPI_BASE_URL),
        }
    }

    pub fn with_base_urls(
        http: Arc<dyn HttpClient>,
        quote_base_url: impl Into<String>,
        openapi_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            quote_base_url: quote_base_url.into(),
            openapi_base_url: openapi_base_url.into(),
        }
    }

    /// Fetch every tracked index concurrently. A failed symbol is logged
    /// and omitted; only an empty result set fails the call.
    pub async fn fetch_global_indices(&self) -> Result<Vec<IndexQuote>, SourceError> {
        let mut tasks = JoinSet::new();
        for (position, (symbol, name)) in TRACKED_INDICES.iter().enumerate() {
            let http = Arc::clone(&self.http);
            let url = format!("{}/{}", self.quote_base_url, urlencoding::encode(symbol));
            let symbol = (*symbol).to_owned();
            let name = (*name).to_owned();
            tasks.spawn(async move {
                (position, fetch_index_quote(http, url, symbol, name).await)
            });
        }

        let mut quotes = Vec::with_capacity(TRACKED_INDICES.len());
        while let Some(joined) = tasks.join_next().await {
            let Ok((position, outcome)) = joined else {
                continue;
            };
            match outcome {
                Ok(quote) => quotes.push((position, quote)),
                Err(error) => {
                    warn!(error = %error, "omitting index quote after fetch failure");
                }
            }
        }

        if quotes.is_empty() {
            return Err(SourceError::unavailable(
                "no global index quote could be fetched",
            ));
        }

        quotes.sort_by_key(|(position, _)| *position);
        Ok(quotes.into_iter().map(|(_, quote)| quote).collect())
    }

    /// Distinct industry codes present in the listed-company directory,
    /// resolved to display names.
    pub async fn fetch_industries(&self) -> Result<Vec<Industry>, SourceError> {
        let rows = self.fetch_directory_rows().await?;

        let mut codes: Vec<String> = rows
            .into_iter()
            .map(|row| row.industry)
            .filter(|code| !code.trim().is_empty())
            .collect();
        codes.sort();
        codes.dedup();

        if codes.is_empty() {
            return Err(SourceError::bad_shape(
                "company directory carried no industry codes",
            ));
        }

        Ok(codes
            .into_iter()
            .map(|code| Industry {
                name: industry_name(&code),
                code,
            })
            .collect())
    }

    /// Company profile for one symbol from the listed-company directory.
    pub async fn fetch_stock_profile(&self, symbol: &str) -> Result<StockProfile, SourceError> {
        let rows = self.fetch_directory_rows().await?;
        let row = rows
            .into_iter()
            .find(|row| row.code == symbol)
            .ok_or_else(|| SourceError::symbol_not_found(symbol))?;

        Ok(StockProfile {
            code: row.code,
            name: row.name,
            full_name: row.full_name,
            industry: industry_name(&row.industry),
            chairman: row.chairman,
            listed: row.listed,
            website: row.website,
        })
    }

    /// The exchange's ETF directory.
    pub async fn fetch_etf_list(&self) -> Result<Vec<EtfEntry>, SourceError> {
        let url = format!("{}/opendata/t187ap47_L", self.openapi_base_url);
        let rows: Vec<EtfRow> = self.get_json(&url).await?;
        if rows.is_empty() {
            return Err(SourceError::bad_shape("ETF directory was empty"));
        }

        Ok(rows
            .into_iter()
            .map(|row| EtfEntry {
                code: row.code,
                name: row.name,
                index: row.index,
                kind: row.kind,
                manager: row.manager,
            })
            .collect())
    }

    /// Financial snapshot for one symbol from the income statement
    /// summary. Symbols absent from the summary are `SymbolNotFound`.
    pub async fn fetch_finance(&self, symbol: &str) -> Result<FinanceSnapshot, SourceError> {
        let url = format!("{}/opendata/t187ap06_L", self.openapi_base_url);
        let rows: Vec<FinanceRow> = self.get_json(&url).await?;
        let row = rows
            .into_iter()
            .find(|row| row.code == symbol)
            .ok_or_else(|| SourceError::symbol_not_found(symbol))?;

        Ok(FinanceSnapshot {
            code: row.code,
            name: row.name,
            eps: row.eps,
            revenue: row.revenue,
            operating_income: row.operating_income,
            net_income: row.net_income,
        })
    }

    async fn fetch_directory_rows(&self) -> Result<Vec<DirectoryRow>, SourceError> {
        let url = format!("{}/opendata/t187ap03_L", self.openapi_base_url);
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, SourceError> {
        let request = HttpRequest::get(url).with_browser_user_agent();
        let response = self
            .http
            .execute(request)
            .await
            .map_err(transport_to_source)?;
        if !response.is_success() {
            return Err(SourceError::http_status(response.status));
        }
        serde_json::from_str(&response.body)
            .map_err(|error| SourceError::bad_shape(format!("undecodable payload: {error}")))
    }
}

async fn fetch_index_quote(
    http: Arc<dyn HttpClient>,
    url: String,
    symbol: String,
    name: String,
) -> Result<IndexQuote, SourceError> {
    let request = HttpRequest::get(url)
        .with_query("interval", "1d")
        .with_query("range", "1d")
        .with_browser_user_agent();

    let response = http.execute(request).await.map_err(transport_to_source)?;
    if !response.is_success() {
        return Err(SourceError::http_status(response.status));
    }

    let chart: ChartResponse = serde_json::from_str(&response.body)
        .map_err(|error| SourceError::bad_shape(format!("undecodable chart: {error}")))?;
    let meta = chart
        .chart
        .result
        .and_then(|mut results| results.pop())
        .map(|result| result.meta)
        .ok_or_else(|| SourceError::bad_shape("chart response carried no result"))?;

    let price = meta
        .regular_market_price
        .ok_or_else(|| SourceError::bad_shape("chart meta carried no market price"))?;
    let previous_close = meta
        .previous_close
        .or(meta.chart_previous_close)
        .unwrap_or(0.0);

    let change = round2(price - previous_close);
    let change_percent = if previous_close > 0.0 {
        round2(change / previous_close * 100.0)
    } else {
        0.0
    };

    Ok(IndexQuote {
        name,
        symbol,
        price: round2(price),
        change,
        change_percent,
    })
}

fn transport_to_source(error: HttpError) -> SourceError {
    if error.is_timeout() {
        SourceError::timeout(error.message().to_owned())
    } else {
        SourceError::unavailable(error.message().to_owned())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "previousClose")]
    previous_close: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DirectoryRow {
    #[serde(rename = "公司代號")]
    code: String,
    #[serde(rename = "公司簡稱", default)]
    name: String,
    #[serde(rename = "公司名稱", default)]
    full_name: String,
    #[serde(rename = "產業別", default)]
    industry: String,
    #[serde(rename = "董事長", default)]
    chairman: String,
    #[serde(rename = "上市日期", default)]
    listed: String,
    #[serde(rename = "網址", default)]
    website: String,
}

#[derive(Debug, Deserialize)]
struct EtfRow {
    #[serde(rename = "基金代號")]
    code: String,
    #[serde(rename = "基金名稱", default)]
    name: String,
    #[serde(rename = "標的指數名稱", default)]
    index: String,
    #[serde(rename = "基金類型", default)]
    kind: String,
    #[serde(rename = "經理公司", default)]
    manager: String,
}

#[derive(Debug, Deserialize)]
struct FinanceRow {
    #[serde(rename = "公司代號")]
    code: String,
    #[serde(rename = "公司名稱", default)]
    name: String,
    #[serde(rename = "基本每股盈餘（元）", default)]
    eps: String,
    #[serde(rename = "營業收入", default)]
    revenue: String,
    #[serde(rename = "營業利益（損失）", default)]
    operating_income: String,
    #[serde(rename = "本期淨利（淨損）", default)]
    net_income: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceErrorKind;
    use crate::http_client::{HttpResponse, StaticHttpClient};

    fn chart_body(price: f64, previous_close: f64) -> String {
        format!(
            r#"{{"chart":{{"result":[{{"meta":{{"regularMarketPrice":{price},"previousClose":{previous_close}}}}}],"error":null}}}}"#
        )
    }

    #[tokio::test]
    async fn failed_index_symbols_are_omitted_not_fatal() {
        let client = Arc::new(
            StaticHttpClient::new()
                .with_response("%5ETWII", Ok(HttpResponse::ok_json(chart_body(22000.0, 21800.0))))
                .with_response("%5EGSPC", Ok(HttpResponse::ok_json(chart_body(5400.0, 5350.0)))),
        );
        let service = ResourceService::with_base_urls(client, "https://q.test/chart", "https://api.test/v1");

        let quotes = service
            .fetch_global_indices()
            .await
            .expect("partial success");

        let symbols: Vec<&str> = quotes.iter().map(|quote| quote.symbol.as_str()).collect();
        assert_eq!(symbols, ["^TWII", "^GSPC"]);
        assert_eq!(quotes[0].change, 200.0);
        assert!((quotes[0].change_percent - 0.92).abs() < 0.005);
    }

    #[tokio::test]
    async fn all_symbols_failing_is_unavailable() {
        let service = ResourceService::with_base_urls(
            Arc::new(StaticHttpClient::new()),
            "https://q.test/chart",
            "https://api.test/v1",
        );

        let error = service
            .fetch_global_indices()
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn directory_lookup_miss_is_symbol_not_found() {
        let body = r#"[{"公司代號":"2330","公司簡稱":"台積電","公司名稱":"台灣積體電路製造股份有限公司","產業別":"24"}]"#;
        let client = Arc::new(
            StaticHttpClient::new().with_response("t187ap03_L", Ok(HttpResponse::ok_json(body))),
        );
        let service =
            ResourceService::with_base_urls(client, "https://q.test/chart", "https://api.test/v1");

        let profile = service
            .fetch_stock_profile("2330")
            .await
            .expect("known symbol resolves");
        assert_eq!(profile.industry, "半導體業");

        let error = service
            .fetch_stock_profile("9999")
            .await
            .expect_err("unknown symbol");
        assert_eq!(error.kind(), SourceErrorKind::SymbolNotFound);
    }

    #[tokio::test]
    async fn industries_are_distinct_and_sorted() {
        let body = r#"[
            {"公司代號":"2330","產業別":"24"},
            {"公司代號":"2303","產業別":"24"},
            {"公司代號":"1101","產業別":"01"},
            {"公司代號":"9999","產業別":""}
        ]"#;
        let client = Arc::new(
            StaticHttpClient::new().with_response("t187ap03_L", Ok(HttpResponse::ok_json(body))),
        );
        let service =
            ResourceService::with_base_urls(client, "https://q.test/chart", "https://api.test/v1");

        let industries = service.fetch_industries().await.expect("industries");
        assert_eq!(
            industries,
            vec![
                Industry {
                    code: "01".into(),
                    name: "水泥工業".into()
                },
                Industry {
                    code: "24".into(),
                    name: "半導體業".into()
                },
            ]
        );
    }

    #[test]
    fn sample_table_is_well_formed() {
        let sample = sample_industries();
        assert!(!sample.is_empty());
        assert!(sample.iter().all(|industry| !industry.code.is_empty()));
    }
}
