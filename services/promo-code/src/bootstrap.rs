//! 服务启动
//!
//! 负责日志初始化、连接池创建和数据库迁移。

use std::sync::Arc;

use promo_adapter_postgres::{PostgresConfig, check_connection, create_pool};
use promo_config::AppConfig;
use promo_errors::{AppError, AppResult};
use promo_telemetry::LogFormat;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use crate::application::PromoCodeService;
use crate::infrastructure::PostgresUnitOfWorkFactory;

/// 初始化服务运行时
pub fn init_runtime(config: &AppConfig) {
    promo_telemetry::init(
        &config.telemetry.log_level,
        LogFormat::for_env(&config.app_env),
    );

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );
}

/// 由数据库配置生成连接池配置
pub fn postgres_config(config: &AppConfig) -> PostgresConfig {
    PostgresConfig::new(config.database.url.expose_secret().as_str())
        .with_max_connections(config.database.max_connections)
        .with_min_connections(config.database.min_connections)
        .with_connect_timeout(config.database.connect_timeout())
        .with_idle_timeout(config.database.idle_timeout())
}

/// 创建连接池并执行迁移
pub async fn connect(config: &AppConfig) -> AppResult<PgPool> {
    let pool = create_pool(&postgres_config(config)).await?;
    check_connection(&pool).await?;
    info!(
        "PostgreSQL connection pool created (max_connections: {})",
        config.database.max_connections
    );

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to run migrations: {}", e)))?;
    info!("Database migrations applied");

    Ok(pool)
}

/// 组装基于 PostgreSQL 的促销码服务
pub async fn build_service(
    config: &AppConfig,
) -> AppResult<PromoCodeService<PostgresUnitOfWorkFactory>> {
    let pool = connect(config).await?;
    let uow_factory = Arc::new(PostgresUnitOfWorkFactory::new(pool));
    Ok(PromoCodeService::new(uow_factory))
}
