//! 促销码实体

use chrono::{DateTime, Utc};
use promo_common::{AuditInfo, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 促销码 ID（由存储分配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoCodeId(pub i64);

impl std::fmt::Display for PromoCodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PromoCodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// 无法识别的枚举标签
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {label}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

/// 折扣类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "PERCENTAGE",
            Self::Fixed => "FIXED",
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE" => Ok(Self::Percentage),
            "FIXED" => Ok(Self::Fixed),
            other => Err(UnknownLabel {
                kind: "discount type",
                label: other.to_string(),
            }),
        }
    }
}

/// 促销码状态
///
/// 只是调用方提供的标签，核心层不做任何状态流转。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromoCodeStatus {
    Active,
    Inactive,
    Expired,
}

impl PromoCodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::str::FromStr for PromoCodeStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(UnknownLabel {
                kind: "promo code status",
                label: other.to_string(),
            }),
        }
    }
}

/// 调用方可写的促销码条款
///
/// 实体与对外结构共用这一份字段定义，新增字段时两边同时生效。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeTerms {
    pub code: String,
    pub amount: Decimal,
    pub discount_type: DiscountType,
    pub expiry_date: DateTime<Utc>,
    pub usage_limit: i32,
    pub status: PromoCodeStatus,
}

/// 待持久化的新促销码
#[derive(Debug, Clone)]
pub struct NewPromoCode {
    pub tenant_id: TenantId,
    pub terms: PromoCodeTerms,
    pub usage_count: i32,
    pub audit_info: AuditInfo,
}

impl NewPromoCode {
    /// 租户由调用上下文决定，使用次数总是从 0 开始
    pub fn new(tenant_id: TenantId, terms: PromoCodeTerms) -> Self {
        Self {
            tenant_id,
            terms,
            usage_count: 0,
            audit_info: AuditInfo::new(),
        }
    }
}

/// 促销码实体
#[derive(Debug, Clone, PartialEq)]
pub struct PromoCode {
    pub id: PromoCodeId,
    pub tenant_id: TenantId,
    pub terms: PromoCodeTerms,
    pub usage_count: i32,
    pub audit_info: AuditInfo,
}

impl PromoCode {
    /// 由存储分配 ID 后生成实体
    pub fn from_new(id: PromoCodeId, new: NewPromoCode) -> Self {
        Self {
            id,
            tenant_id: new.tenant_id,
            terms: new.terms,
            usage_count: new.usage_count,
            audit_info: new.audit_info,
        }
    }

    /// 整体覆盖条款；使用次数、租户和创建时间保持不变
    pub fn revise(&mut self, terms: PromoCodeTerms) {
        self.terms = terms;
        self.audit_info.touch();
    }

    pub fn belongs_to(&self, tenant_id: &TenantId) -> bool {
        &self.tenant_id == tenant_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.audit_info.created_at
    }
}
