//! Promo Code Service - 服务入口

use promo_code::bootstrap;
use promo_config::AppConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir)?;

    bootstrap::init_runtime(&config);

    let _service = bootstrap::build_service(&config).await?;
    info!("Promo code service ready");

    // 等待关闭信号
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    Ok(())
}
