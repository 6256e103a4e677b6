//! eNAM market data client
//!
//! Proxies the government electronic market trade-data endpoint. The
//! upstream accepts a form-encoded POST and returns rows nested one level
//! deep; `flatten_rows` collapses them into a single order-preserving
//! sequence.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// eNAM trade-data client
#[derive(Clone)]
pub struct EnamClient {
    api_endpoint: String,
    http_client: Client,
}

/// A trade-data query forwarded to the upstream
#[derive(Debug, Clone)]
pub struct TradeDataQuery {
    pub state: String,
    pub market: String,
    pub commodity: String,
    pub from_date: String,
    pub to_date: String,
}

#[derive(Debug, Deserialize)]
struct EnamResponse {
    #[serde(default)]
    data: Vec<Value>,
}

impl EnamClient {
    /// Create a new eNAM client
    pub fn new(api_endpoint: String) -> Self {
        Self {
            api_endpoint,
            http_client: Client::new(),
        }
    }

    /// Fetch trade rows for a query, flattened into a single sequence
    pub async fn fetch_trade_data(&self, query: &TradeDataQuery) -> AppResult<Vec<Value>> {
        let params = [
            ("language", "en"),
            ("stateName", query.state.as_str()),
            ("apmcName", query.market.as_str()),
            ("commodityName", query.commodity.as_str()),
            ("fromDate", query.from_date.as_str()),
            ("toDate", query.to_date.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.api_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::MarketData(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MarketData(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let body: EnamResponse = response
            .json()
            .await
            .map_err(|e| AppError::MarketData(format!("Failed to parse response: {}", e)))?;

        Ok(flatten_rows(body.data))
    }
}

/// Flatten rows nested one array level deep, preserving order
///
/// The upstream sometimes groups rows per page into sub-arrays. Scalar and
/// object entries pass through unchanged.
pub fn flatten_rows(rows: Vec<Value>) -> Vec<Value> {
    let mut flat = Vec::with_capacity(rows.len());
    for row in rows {
        match row {
            Value::Array(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat
}
