// src/handlers/company.rs
use std::sync::Arc;

use chrono::Duration;
use log::{error, info};
use warp::Rejection;

use super::dcf::cached_document;
use super::error::ApiError;
use crate::models::{CompanyLogo, KeyStats};
use crate::AppState;

pub async fn get_company_logo(
    symbol: String,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, Rejection> {
    info!("Handling logo request for {}", symbol);

    let logo: CompanyLogo = cached_document(
        &state,
        &format!("{}_logo", symbol),
        Some(Duration::hours(24)),
        || state.iex.get_logo(&symbol),
    )
    .await
    .map_err(|e| {
        error!("Failed to fetch logo for {}: {}", symbol, e);
        warp::reject::custom(ApiError::external_error(format!(
            "Failed to fetch logo: {}",
            e
        )))
    })?;

    Ok(warp::reply::json(&logo))
}

pub async fn get_company_stats(
    symbol: String,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, Rejection> {
    info!("Handling stats request for {}", symbol);

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

    Ok(warp::reply::json(&stats))
}
