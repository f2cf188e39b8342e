use dotenv::dotenv;
use log::{info, warn};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use dcf_dashboard::services::cache::CacheStore;
use dcf_dashboard::services::iex::IexClient;
use dcf_dashboard::{routes, AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let port_str = env::var("PORT").unwrap_or_else(|_| {
        warn!("$PORT not set, defaulting to 3030");
        "3030".to_string()
    });

    let port: u16 = port_str.parse().expect("PORT must be a number");
    info!("Using PORT: {}", port);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!("Will bind to: {}", addr);

    let iex = IexClient::from_env().expect("IEX client configuration (set IEX_TOKEN)");
    let state = Arc::new(AppState {
        iex,
        cache: CacheStore::new(),
    });

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
}
