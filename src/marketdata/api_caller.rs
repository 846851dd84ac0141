use super::super::model;
use super::response;
use crate::http::client::{self, RequestError};
use chrono::{DateTime, FixedOffset};
use std::{collections::HashMap, time::Duration};
use url::Url;

// Base URL for the Yahoo Finance chart API.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// Fixed window and granularity of an add request.
const RANGE: &str = "7d";
const INTERVAL: &str = "1d";

// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Source of recent daily bars for a symbol.
///
/// `None` covers both "no data" and any provider failure; callers cannot tell them apart.
pub trait DailyBarSource {
    async fn fetch(&self, symbol: &str) -> Option<model::PriceTable>;
}

/// Daily bars from the Yahoo Finance chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooChart {
    base_url: Url,
    timeout: Option<Duration>,
}

impl YahooChart {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Self {
        Self { base_url, timeout }
    }
}

impl DailyBarSource for YahooChart {
    async fn fetch(&self, symbol: &str) -> Option<model::PriceTable> {
        match request_daily_bars(&self.base_url, symbol, self.timeout).await {
            Ok(table) if table.is_empty() => {
                log::warn!("No daily bars returned for {}", symbol);
                None
            }
            Ok(table) => {
                log::info!("Fetched {} daily bars for {}", table.rows.len(), symbol);
                Some(table)
            }
            Err(err) => {
                log::warn!("Error fetching daily bars for {}: {}", symbol, err);
                None
            }
        }
    }
}

// Checks the error block of a chart response.
fn check_error(err: &Option<response::ChartError>) -> Result<(), RequestError> {
    match err {
        None => Ok(()),
        Some(err) => Err(RequestError::Other(format!(
            "{}: {}",
            err.code,
            err.description.as_deref().unwrap_or("Unknown error")
        ))),
    }
}

// Builds `{base}/v8/finance/chart/{symbol}` with the symbol percent-encoded as a path segment.
fn chart_url(base_url: &Url, symbol: &str) -> Result<Url, RequestError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| RequestError::Other(format!("{} cannot be a base URL", base_url)))?
        .pop_if_empty()
        .extend(["v8", "finance", "chart", symbol]);
    Ok(url)
}

/// Fetches the last 7 days of daily bars for a given stock symbol.
pub async fn request_daily_bars(
    base_url: &Url,            // Provider base URL.
    symbol: &str,              // Stock symbol.
    timeout: Option<Duration>, // Per-request timeout.
) -> Result<model::PriceTable, RequestError> {
    let resp = client::get::<response::ChartResponse>(
        chart_url(base_url, symbol)?,
        HashMap::from([("range", RANGE), ("interval", INTERVAL)]),
        HashMap::from([("User-Agent", USER_AGENT)]),
        timeout,
    )
    .await?;
    check_error(&resp.chart.error)?;

    let result = resp
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| RequestError::Other("No data".into()))?;

    to_price_table(symbol, result)
}

fn to_price_table(
    symbol: &str,
    result: response::ChartResult,
) -> Result<model::PriceTable, RequestError> {
    let timestamps = result.timestamp.unwrap_or_default();
    if timestamps.is_empty() {
        return Ok(model::PriceTable {
            symbol: symbol.into(),
            rows: Vec::new(),
        });
    }

    let offset = FixedOffset::east_opt(result.meta.gmtoffset).ok_or_else(|| {
        RequestError::Other(format!("Invalid gmtoffset {}", result.meta.gmtoffset))
    })?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| RequestError::Other("No quote data".into()))?;

    let mut rows = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.into_iter().enumerate() {
        // Bars are stamped at the session open; the exchange-local date is the trading day.
        let date = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| RequestError::Other(format!("Invalid timestamp {}", ts)))?
            .with_timezone(&offset)
            .date_naive();
        rows.push(model::FetchedRow {
            date,
            open: cell(&quote.open, i),
            high: cell(&quote.high, i),
            low: cell(&quote.low, i),
            close: cell(&quote.close, i),
            volume: cell(&quote.volume, i),
        });
    }

    Ok(model::PriceTable {
        symbol: symbol.into(),
        rows,
    })
}

// Short columns read as missing values.
fn cell<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // 2024-01-02 14:30 UTC, the NYSE open.
    const JAN_2_OPEN: i64 = 1_704_205_800;
    const DAY: i64 = 86_400;

    fn chart_body() -> serde_json::Value {
        json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
                    "timestamp": [JAN_2_OPEN, JAN_2_OPEN + DAY, JAN_2_OPEN + 2 * DAY],
                    "indicators": {
                        "quote": [{
                            "open": [187.15, 184.22, 182.15],
                            "high": [188.44, 185.88, 183.09],
                            "low": [183.89, 183.43, 180.88],
                            "close": [185.64, 184.25, 181.91],
                            "volume": [82488700, null, 71983600]
                        }]
                    }
                }],
                "error": null
            }
        })
    }

    fn base_url(server: &MockServer) -> Url {
        Url::parse(&server.uri()).unwrap()
    }

    #[tokio::test]
    async fn maps_chart_rows_to_exchange_dates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .and(query_param("range", "7d"))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
            .mount(&server)
            .await;

        let table = request_daily_bars(&base_url(&server), "AAPL", None)
            .await
            .unwrap();

        assert_eq!(table.symbol, "AAPL");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(table.rows[2].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(table.rows[0].close, Some(185.64));
        assert_eq!(table.rows[1].volume, None);
        assert_eq!(table.rows[2].volume, Some(71983600));
    }

    #[tokio::test]
    async fn short_columns_become_missing_values() {
        let server = MockServer::start().await;
        let mut body = chart_body();
        body["chart"]["result"][0]["indicators"]["quote"][0]["low"] = json!([183.89]);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let table = request_daily_bars(&base_url(&server), "AAPL", None)
            .await
            .unwrap();
        assert_eq!(table.rows[0].low, Some(183.89));
        assert_eq!(table.rows[1].low, None);
        assert_eq!(table.rows[2].low, None);
    }

    #[tokio::test]
    async fn symbol_is_sent_as_a_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/2330.TW"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
            .expect(1)
            .mount(&server)
            .await;

        let source = YahooChart::new(base_url(&server), None);
        let table = source.fetch("2330.TW").await.unwrap();
        assert_eq!(table.symbol, "2330.TW");
    }

    #[tokio::test]
    async fn provider_error_payload_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": null,
                    "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
                }
            })))
            .mount(&server)
            .await;

        let err = request_daily_bars(&base_url(&server), "NOPE", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("symbol may be delisted"));

        let source = YahooChart::new(base_url(&server), None);
        assert!(source.fetch("NOPE").await.is_none());
    }

    #[tokio::test]
    async fn http_failure_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let source = YahooChart::new(base_url(&server), None);
        assert!(source.fetch("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn empty_result_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": [{
                        "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
                        "indicators": { "quote": [{}] }
                    }],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let table = request_daily_bars(&base_url(&server), "AAPL", None)
            .await
            .unwrap();
        assert!(table.is_empty());

        let source = YahooChart::new(base_url(&server), None);
        assert!(source.fetch("AAPL").await.is_none());
    }

    #[test]
    fn chart_url_appends_to_base_path() {
        let base = Url::parse("http://localhost:8080/proxy/").unwrap();
        let url = chart_url(&base, "BRK/B").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/v8/finance/chart/BRK%2FB");
    }
}
