//! Market price proxy service
//!
//! Thin pass-through to the government trade-data API. No caching, no
//! pagination beyond upstream, no retry; upstream failures propagate to
//! the caller.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::external::enam::{EnamClient, TradeDataQuery};

/// Market price service
#[derive(Clone)]
pub struct MarketService {
    enam: EnamClient,
}

/// Input for a trade-data query
#[derive(Debug, Deserialize)]
pub struct TradeDataInput {
    pub state: String,
    pub market: String,
    pub commodity: String,
    pub from_date: String,
    pub to_date: String,
}

impl MarketService {
    /// Create a new MarketService instance
    pub fn new(enam: EnamClient) -> Self {
        Self { enam }
    }

    /// Forward the query upstream and return the flattened rows unmodified
    pub async fn trade_data(&self, input: TradeDataInput) -> AppResult<Vec<Value>> {
        for (field, value) in [
            ("state", &input.state),
            ("market", &input.market),
            ("commodity", &input.commodity),
            ("from_date", &input.from_date),
            ("to_date", &input.to_date),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation {
                    field: field.to_string(),
                    message: format!("{} is required", field),
                });
            }
        }

        let query = TradeDataQuery {
            state: input.state,
            market: input.market,
            commodity: input.commodity,
            from_date: input.from_date,
            to_date: input.to_date,
        };

        self.enam.fetch_trade_data(&query).await
    }
}
