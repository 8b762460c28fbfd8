use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{debug, info};

use common::logger;
use gateway::{GatewayConfig, server, variants};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("Edge starting up...");

    let config = GatewayConfig::from_env()?;
    info!("Serving the {} variant", config.variant);

    let store = variants::open_store(&config).await?;
    let router = Arc::new(variants::build_router(&config, store));

    let listener = TcpListener::bind(config.bind).await?;
    server::serve(listener, router).await?;
    Ok(())
}
