// src/lib.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared state handed to every handler: the market-data client and the
/// process-local document cache.
pub struct AppState {
    pub iex: services::iex::IexClient,
    pub cache: services::cache::CacheStore,
}
