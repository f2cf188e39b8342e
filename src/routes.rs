// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::info;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::company::{get_company_logo, get_company_stats};
use crate::handlers::dcf::get_dcf;
use crate::handlers::error::{ApiError, ApiErrorKind};
use crate::AppState;

// Map our custom rejections to status codes the dashboard can act on.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = match api_error.kind {
            ApiErrorKind::External => warp::http::StatusCode::BAD_GATEWAY,
            ApiErrorKind::Valuation => warp::http::StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorKind::Internal => warp::http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        message = api_error.message.clone();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let dcf_route = warp::path!("api" / "v1" / "dcf" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_dcf);

    let logo_route = warp::path!("api" / "v1" / "company" / String / "logo")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_company_logo);

    let stats_route = warp::path!("api" / "v1" / "company" / String / "stats")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_company_stats);

    info!("All routes configured successfully.");

    dcf_route
        .or(logo_route)
        .or(stats_route)
        .recover(handle_rejection)
}
