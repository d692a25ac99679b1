use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use thiserror::Error;

use super::types::FxBar;
use crate::backfill::RateTable;
use crate::ingestion::coerce::decimal_from_f64;
use crate::retry::{HttpStatusError, RetryPolicy};

pub const TIINGO_API_BASE: &str = "https://api.tiingo.com";
pub const DEFAULT_PAIR: &str = "gbpusd";

#[derive(Debug, Error)]
pub enum RateClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl HttpStatusError for RateClientError {
    fn http_status(&self) -> Option<u16> {
        match self {
            RateClientError::Status { status, .. } => Some(*status),
            RateClientError::Http(e) => e.status().map(|s| s.as_u16()),
            RateClientError::Unexpected(_) => None,
        }
    }
}

/// Source of daily closing FX rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// All daily closes between `start` and `end` inclusive, in one request.
    async fn fetch_historical_rates(&self, start: NaiveDate, end: NaiveDate) -> Result<RateTable, RateClientError>;
}

#[derive(Debug, Clone)]
pub struct TiingoClient {
    http: Client,
    base_url: String,
    api_token: String,
    pair: String,
    retry: RetryPolicy,
}

impl TiingoClient {
    pub fn new(http: Client, api_token: String) -> Self {
        Self {
            http,
            base_url: TIINGO_API_BASE.into(),
            api_token,
            pair: DEFAULT_PAIR.into(),
            retry: RetryPolicy::rate_provider(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Lower-case pair code such as `gbpusd`.
    pub fn with_pair(mut self, pair: &str) -> Self {
        self.pair = pair.to_lowercase();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn prices_url(&self, start: NaiveDate, end: NaiveDate) -> Result<Url, RateClientError> {
        let raw = format!("{}/tiingo/fx/{}/prices", self.base_url, self.pair);
        Url::parse_with_params(
            &raw,
            &[
                ("startDate", start.format("%Y-%m-%d").to_string()),
                ("endDate", end.format("%Y-%m-%d").to_string()),
                ("resampleFreq", "1day".to_string()),
            ],
        )
        .map_err(|e| RateClientError::Unexpected(format!("bad URL {raw}: {e}")))
    }

    async fn get_bars(&self, url: &Url) -> Result<Vec<FxBar>, RateClientError> {
        let resp = self
            .http
            .get(url.clone())
            .header("Authorization", format!("Token {}", self.api_token))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RateClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bars: Vec<FxBar> = resp.json().await?;
        Ok(bars)
    }
}

/// Key each bar by calendar day. Later bars for the same day win; bars with
/// a short date or a non-finite close are dropped.
pub fn rates_from_bars(bars: &[FxBar]) -> RateTable {
    bars.iter()
        .filter_map(|bar| {
            let day = NaiveDate::parse_from_str(bar.day_key()?, "%Y-%m-%d").ok()?;
            let close = decimal_from_f64(bar.close)?;
            Some((day, close))
        })
        .collect()
}

#[async_trait]
impl RateSource for TiingoClient {
    async fn fetch_historical_rates(&self, start: NaiveDate, end: NaiveDate) -> Result<RateTable, RateClientError> {
        let url = self.prices_url(start, end)?;
        let bars = self.retry.run("tiingo", |_| self.get_bars(&url)).await?;
        let rates = rates_from_bars(&bars);

        tracing::info!(
            pair = %self.pair,
            start = %start,
            end = %end,
            days = rates.len(),
            "Fetched historical FX rates"
        );
        Ok(rates)
    }
}
