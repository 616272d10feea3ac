use log::{info, warn};
use std::error::Error;

mod alerts;
mod analysis;
mod config;
mod dispatch;
mod portfolio;
mod scheduler;
mod stock;

use alerts::NotificationEngine;
use config::AppConfig;
use dispatch::DispatcherFactory;
use portfolio::Portfolio;
use scheduler::Scheduler;
use stock::{ProviderConfig, ProviderFactory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();
    info!("Starting portfolio alert bot...");

    let config = AppConfig::from_env()?;
    let portfolio = Portfolio::load(&config.portfolio_path)?;
    info!(
        "📁 Loaded {} positions from {}",
        portfolio.len(),
        config.portfolio_path.display()
    );
    info!("🎯 Alert thresholds: {}", config.thresholds);

    let mut provider = ProviderFactory::create("alpha_vantage")?;
    provider
        .initialize(ProviderConfig {
            api_key: config.alpha_vantage_api_key.clone(),
            base_url: None,
            timeout: config.http_timeout_secs,
            rate_limit: Some(config.alpha_vantage_rate_limit),
        })
        .await?;
    if let Err(e) = provider.health_check().await {
        warn!("⚠️ {} health check failed: {e}", provider.name());
    }

    let dispatcher = DispatcherFactory::create(&config.messaging, config.http_timeout_secs)?;
    info!(
        "🚀 Using {} for market data, alerts go out via {}",
        provider.name(),
        config.messaging.channel
    );

    let engine = NotificationEngine::new(
        provider,
        dispatcher,
        config.thresholds,
        config.engine,
        config.messaging.from,
        config.messaging.to,
    );

    Scheduler::new(engine, portfolio, config.check_interval, config.poll_interval)
        .run_forever()
        .await;

    Ok(())
}
