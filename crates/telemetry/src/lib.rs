//! telemetry - 可观测性库

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读（开发环境）
    Pretty,
    /// JSON（生产环境）
    Json,
}

impl LogFormat {
    /// 根据运行环境选择输出格式
    pub fn for_env(app_env: &str) -> Self {
        if app_env == "production" {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// 初始化 tracing
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// 按格式初始化 tracing
pub fn init(log_level: &str, format: LogFormat) {
    match format {
        LogFormat::Pretty => init_tracing(log_level),
        LogFormat::Json => init_tracing_json(log_level),
    }
}
