/// Axum handlers for the explorer endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ExplorerError;
use crate::explorer::{Explorer, PageParams};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<Explorer>;

/// Query parameters are kept as strings so junk values fall back to defaults
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub include_balance: Option<String>,
    pub raw: Option<String>,
}

impl ExplorerQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page.clone(),
            page_size: self.page_size.clone(),
        }
    }
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("1")
}

/// GET /
pub async fn mining_info_handler(
    State(explorer): State<AppState>,
) -> Result<Json<Value>, ExplorerError> {
    Ok(Json(explorer.mining_info().await?))
}

/// GET /overview
pub async fn overview_handler(
    State(explorer): State<AppState>,
) -> Result<Json<NetworkOverview>, ExplorerError> {
    Ok(Json(explorer.overview().await?))
}

/// GET /chain-info
pub async fn chain_info_handler(
    State(explorer): State<AppState>,
) -> Result<Json<Value>, ExplorerError> {
    Ok(Json(explorer.chain_info().await?))
}

/// GET /address/:address
pub async fn address_handler(
    State(explorer): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<ExplorerQuery>,
) -> Result<Json<AddressHistoryPage>, ExplorerError> {
    let page = explorer
        .address(&address, &query.page_params(), flag(&query.include_balance))
        .await?;
    Ok(Json(page))
}

/// GET /address/ with the address left out
pub async fn missing_address_handler() -> ExplorerError {
    ExplorerError::BadRequest("Address is required".to_string())
}

/// GET /block/:hashOrHeight
pub async fn block_handler(
    State(explorer): State<AppState>,
    Path(hash_or_height): Path<String>,
) -> Result<Json<BlockView>, ExplorerError> {
    Ok(Json(explorer.block(&hash_or_height).await?))
}

/// GET /block/ with the hash or height left out
pub async fn missing_block_handler() -> ExplorerError {
    ExplorerError::BadRequest("Block hash or height is required".to_string())
}

/// GET /blocks?page=&pageSize=
pub async fn blocks_handler(
    State(explorer): State<AppState>,
    Query(query): Query<ExplorerQuery>,
) -> Result<Json<BlockListing>, ExplorerError> {
    Ok(Json(explorer.blocks(&query.page_params()).await?))
}

/// GET /tx/:txid?raw=1
pub async fn tx_handler(
    State(explorer): State<AppState>,
    Path(txid): Path<String>,
    Query(query): Query<ExplorerQuery>,
) -> Result<Json<TxView>, ExplorerError> {
    Ok(Json(explorer.tx(&txid, flag(&query.raw)).await?))
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
