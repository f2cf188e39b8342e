// src/services/iex.rs
//
// Thin typed client for the IEX Cloud REST API. Statement endpoints take a
// `last` count so the dashboard can pull exactly the historical window the
// valuation needs.

use log::info;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::env;

use crate::models::{BalanceSheetReport, CashFlowReport, CompanyLogo, IncomeReport, KeyStats};
use crate::BoxError;

const PRODUCTION_BASE_URL: &str = "https://cloud.iexapis.com/stable";
const SANDBOX_BASE_URL: &str = "https://sandbox.iexapis.com/stable";

pub struct IexClient {
    client: Client,
    token: String,
    base_url: String,
}

impl IexClient {
    pub fn new(token: impl Into<String>, sandbox: bool) -> Self {
        let base_url = if sandbox {
            SANDBOX_BASE_URL
        } else {
            PRODUCTION_BASE_URL
        };
        IexClient {
            client: Client::new(),
            token: token.into(),
            base_url: base_url.to_string(),
        }
    }

    /// Reads `IEX_TOKEN` (required) and `IEX_ENVIRONMENT` (`sandbox` or
    /// `production`, defaults to production).
    pub fn from_env() -> Result<Self, BoxError> {
        let token = env::var("IEX_TOKEN").map_err(|_| "IEX_TOKEN is not set")?;
        let sandbox = env::var("IEX_ENVIRONMENT")
            .map(|v| v.eq_ignore_ascii_case("sandbox"))
            .unwrap_or(false);
        Ok(Self::new(token, sandbox))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, String)],
    ) -> Result<T, BoxError> {
        let url = format!("{}{}", self.base_url, path);
        info!("Fetching {}", url);

        let mut query: Vec<(&str, String)> = vec![("token", self.token.clone())];
        query.extend_from_slice(extra_query);

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("IEX request to {} failed with status {}", path, status).into());
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn get_stats(&self, symbol: &str) -> Result<KeyStats, BoxError> {
        self.get_json(&format!("/stock/{}/advanced-stats", symbol), &[])
            .await
    }

    pub async fn get_income(&self, symbol: &str, last: u32) -> Result<IncomeReport, BoxError> {
        self.get_json(
            &format!("/stock/{}/income", symbol),
            &[("period", "annual".to_string()), ("last", last.to_string())],
        )
        .await
    }

    pub async fn get_cashflow(&self, symbol: &str, last: u32) -> Result<CashFlowReport, BoxError> {
        self.get_json(
            &format!("/stock/{}/cash-flow", symbol),
            &[("period", "annual".to_string()), ("last", last.to_string())],
        )
        .await
    }

    pub async fn get_balancesheet(
        &self,
        symbol: &str,
        last: u32,
    ) -> Result<BalanceSheetReport, BoxError> {
        self.get_json(
            &format!("/stock/{}/balance-sheet", symbol),
            &[("period", "annual".to_string()), ("last", last.to_string())],
        )
        .await
    }

    pub async fn get_logo(&self, symbol: &str) -> Result<CompanyLogo, BoxError> {
        self.get_json(&format!("/stock/{}/logo", symbol), &[]).await
    }
}
