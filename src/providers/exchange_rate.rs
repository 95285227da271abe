use crate::core::error::FeedError;
use crate::core::rates::{RateFeed, RateTable};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://open.er-api.com";

/// Rate feed backed by the ExchangeRate-API open access endpoint.
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent("cambio/1.0")
            .build()
            .map_err(|e| FeedError::Unavailable(format!("Failed to build HTTP client: {e}")))?;
        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    base_code: Option<String>,
    rates: Option<HashMap<String, f64>>,
    time_last_update_unix: Option<i64>,
}

#[async_trait]
impl RateFeed for ExchangeRateApiProvider {
    #[instrument(name = "RateFeedFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<RateTable, FeedError> {
        let url = format!("{}/v6/latest/{}", self.base_url, base.to_uppercase());
        debug!("Requesting rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(format!("Request error: {e} for base: {base}")))?;

        if !response.status().is_success() {
            return Err(FeedError::Unavailable(format!(
                "HTTP error: {} for base: {}",
                response.status(),
                base
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FeedError::Unavailable(format!("Failed to read response body: {e}")))?;

        let data: LatestRatesResponse = serde_json::from_str(&text).map_err(|e| {
            FeedError::Malformed(format!("Failed to parse JSON response for {base}: {e}"))
        })?;

        if data.result.as_deref() != Some("success") {
            return Err(FeedError::Malformed(format!(
                "Feed reported failure for {}: {}",
                base,
                data.error_type.as_deref().unwrap_or("no success indicator")
            )));
        }

        if let Some(code) = data.base_code.as_deref() {
            if !code.eq_ignore_ascii_case(base) {
                return Err(FeedError::Malformed(format!(
                    "Requested rates for {base} but received {code}"
                )));
            }
        }

        let rates = data
            .rates
            .filter(|rates| !rates.is_empty())
            .ok_or_else(|| FeedError::Malformed(format!("No rates found for base: {base}")))?;

        if let Some(updated) = data
            .time_last_update_unix
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        {
            debug!(%updated, "Feed last updated");
        }

        let table = RateTable::new(base, rates);
        if table.is_empty() {
            return Err(FeedError::Malformed(format!(
                "No usable rates found for base: {base}"
            )));
        }
        Ok(table)
    }
}
