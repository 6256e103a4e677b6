//! HTTP handlers for the market-price proxy

use axum::{extract::State, Json};
use serde_json::Value;

use crate::error::AppResult;
use crate::services::market::TradeDataInput;
use crate::services::MarketService;
use crate::AppState;

/// Forward a trade-data query to the eNAM API and return the flattened rows
pub async fn enam_trade_data(
    State(state): State<AppState>,
    Json(input): Json<TradeDataInput>,
) -> AppResult<Json<Vec<Value>>> {
    let service = MarketService::new(state.enam.clone());
    let rows = service.trade_data(input).await?;
    Ok(Json(rows))
}
