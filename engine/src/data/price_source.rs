// Where per-ticker closing prices come from. The table builder only sees the trait.
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::csv_parser::PriceCsvParser;
use crate::config::PriceSourceSettings;
use crate::error::{BreadthError, Result};

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily closes for `ticker` on or after `start`, keyed by trading date.
    async fn fetch_closes(&self, ticker: &str, start: NaiveDate) -> Result<BTreeMap<NaiveDate, f64>>;
}

pub fn from_settings(settings: &PriceSourceSettings) -> Result<Box<dyn PriceSource>> {
    match settings {
        PriceSourceSettings::Yahoo { base_url, timeout_secs } => {
            Ok(Box::new(YahooChartSource::new(base_url.clone(), Duration::from_secs(*timeout_secs))?))
        }
        PriceSourceSettings::CsvDir { path } => Ok(Box::new(CsvDirectorySource::new(path.clone()))),
    }
}

/// One `<TICKER>.csv` per ticker in a directory.
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PriceSource for CsvDirectorySource {
    async fn fetch_closes(&self, ticker: &str, start: NaiveDate) -> Result<BTreeMap<NaiveDate, f64>> {
        let path = self.dir.join(format!("{}.csv", ticker));
        if !path.is_file() {
            return Err(BreadthError::FetchError(format!("No price file for '{}' at '{}'", ticker, path.display())));
        }
        PriceCsvParser::load_closes(path, start)
    }
}

/// Daily bars from a Yahoo-style chart endpoint (`{base_url}/{ticker}`).
pub struct YahooChartSource {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartSource {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(BreadthError::ConfigError(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(timeout)
            .build()
            .map_err(|e| BreadthError::FetchError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    fn build_url(&self, ticker: &str, start: NaiveDate) -> String {
        let period1 = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0);
        let period2 = Utc::now().timestamp();
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url, ticker, period1, period2
        )
    }
}

#[async_trait]
impl PriceSource for YahooChartSource {
    async fn fetch_closes(&self, ticker: &str, start: NaiveDate) -> Result<BTreeMap<NaiveDate, f64>> {
        let url = self.build_url(ticker, start);
        tracing::debug!(ticker, %url, "Fetching daily bars");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BreadthError::FetchError(format!("HTTP {} for '{}'", status, ticker)));
        }
        let body = response.text().await?;
        parse_chart_response(&body, start)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Extracts adjusted closes (plain closes when no adjusted series is present).
/// Null and non-positive bars are skipped.
fn parse_chart_response(json: &str, start: NaiveDate) -> Result<BTreeMap<NaiveDate, f64>> {
    let response: ChartResponse = serde_json::from_str(json)
        .map_err(|e| BreadthError::FetchError(format!("Failed to parse chart response: {}", e)))?;

    if let Some(error) = response.chart.error {
        return Err(BreadthError::FetchError(format!("API error [{}]: {}", error.code, error.description)));
    }

    let data = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| BreadthError::FetchError("No data returned".to_string()))?;

    let adjusted = data.indicators.adjclose.and_then(|a| a.into_iter().next()).map(|a| a.adjclose);
    let closes = match adjusted {
        Some(adjusted) if !adjusted.is_empty() => adjusted,
        _ => data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
    };

    let mut result = BTreeMap::new();
    for (timestamp, close) in data.timestamp.iter().zip(closes) {
        let Some(close) = close.filter(|c| c.is_finite() && *c > 0.0) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(*timestamp, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        if date >= start {
            result.insert(date, close);
        }
    }
    Ok(result)
}
