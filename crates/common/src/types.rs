//! 通用类型定义

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// 租户 ID
///
/// 由请求边界解析后显式传入每个服务调用，核心层从不自行推导。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
#[display("{_0}")]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// 审计信息（系统维护的时间戳）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditInfo {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// 刷新更新时间
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::new()
    }
}
