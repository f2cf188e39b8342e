// src/handlers/dcf.rs
use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use warp::Rejection;

use super::error::ApiError;
use crate::models::KeyStats;
use crate::services::dcf::{run_dcf, DcfAssumptions};
use crate::AppState;
use crate::BoxError;

/// Cache-or-fetch one raw API document. Cached copies are stored as raw
/// JSON so a model change never strands a stale shape in the cache: if the
/// cached value no longer deserializes it is refetched.
pub(crate) async fn cached_document<T, F, Fut>(
    state: &AppState,
    key: &str,
    ttl: Option<Duration>,
    fetch: F,
) -> Result<T, BoxError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, BoxError>>,
{
    if let Some(value) = state.cache.get(key).await {
        if let Ok(document) = serde_json::from_value(value) {
            return Ok(document);
        }
    }

    info!("cache miss for {}, fetching from API", key);
    let document = fetch().await?;
    state.cache.set(key, serde_json::to_value(&document)?, ttl).await;
    Ok(document)
}

pub async fn get_dcf(symbol: String, state: Arc<AppState>) -> Result<impl warp::Reply, Rejection> {
    info!("Handling DCF request for {}", symbol);

    let assumptions = DcfAssumptions::default();
    let last = assumptions.historical_years as u32;

    let stats: KeyStats = cached_document(
        &state,
        &format!("{}_stats", symbol),
        None,
        || state.iex.get_stats(&symbol),
    )
    .await
    .map_err(|e| {
        error!("Failed to fetch stats for {}: {}", symbol, e);
        warp::reject::custom(ApiError::external_error(format!(
            "Failed to fetch stats: {}",
            e
        )))
    })?;

    let balance_sheet = cached_document(
        &state,
        &format!("{}_balancesheet", symbol),
        None,
        || state.iex.get_balancesheet(&symbol, last),
    )
    .await
    .map_err(|e| {
        error!("Failed to fetch balance sheet for {}: {}", symbol, e);
        warp::reject::custom(ApiError::external_error(format!(
            "Failed to fetch balance sheet: {}",
            e
        )))
    })?;

    let income = cached_document(
        &state,
        &format!("{}_income", symbol),
        None,
        || state.iex.get_income(&symbol, last),
    )
    .await
    .map_err(|e| {
        error!("Failed to fetch income statement for {}: {}", symbol, e);
        warp::reject::custom(ApiError::external_error(format!(
            "Failed to fetch income statement: {}",
            e
        )))
    })?;

    let cash_flow = cached_document(
        &state,
        &format!("{}_cashflow", symbol),
        None,
        || state.iex.get_cashflow(&symbol, last),
    )
    .await
    .map_err(|e| {
        error!("Failed to fetch cash flow statement for {}: {}", symbol, e);
        warp::reject::custom(ApiError::external_error(format!(
            "Failed to fetch cash flow statement: {}",
            e
        )))
    })?;

    match run_dcf(&balance_sheet, &cash_flow, &income, &stats, &assumptions) {
        Ok(valuation) => {
            info!(
                "DCF for {}: fair value per share {:.2}",
                symbol, valuation.fair_value_per_share
            );
            Ok(warp::reply::json(&json!({
                "assumptions": assumptions,
                "valuation": valuation,
            })))
        }
        Err(e) => {
            error!("DCF computation failed for {}: {}", symbol, e);
            Err(warp::reject::custom(ApiError::valuation_error(
                e.to_string(),
            )))
        }
    }
}
