use anyhow::{anyhow, Result};
use dotenv::dotenv;
use log::{error, info};

use dcf_dashboard::services::iex::IexClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "MSFT".to_string());
    info!("Testing IEX endpoints for {}...", symbol);

    let client = IexClient::from_env().map_err(|e| anyhow!(e))?;

    match client.get_stats(&symbol).await {
        Ok(stats) => info!("SUCCESS: stats: {:?}", stats),
        Err(e) => {
            error!("ERROR: Failed to fetch stats: {}", e);
            return Err(anyhow!(e));
        }
    }

    match client.get_logo(&symbol).await {
        Ok(logo) => info!("SUCCESS: logo: {:?}", logo),
        Err(e) => {
            error!("ERROR: Failed to fetch logo: {}", e);
            return Err(anyhow!(e));
        }
    }

    Ok(())
}
