//! 促销码对外数据结构
//!
//! 输入与输出共用 [`PromoCodeDto`]。`id`、`usageCount`、`createdAt`、
//! `updatedAt` 只在输出时填写，输入中的这些字段会被忽略；
//! 租户 ID 从不出现在对外结构中。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::promo_code::{PromoCode, PromoCodeId, PromoCodeTerms};

/// 促销码对外结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PromoCodeId>,
    #[serde(flatten)]
    pub terms: PromoCodeTerms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PromoCodeDto {
    /// 仅包含可写字段的输入结构
    pub fn from_terms(terms: PromoCodeTerms) -> Self {
        Self {
            id: None,
            terms,
            usage_count: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// 取出可写字段，只读字段被丢弃
    pub fn into_terms(self) -> PromoCodeTerms {
        self.terms
    }
}

impl From<&PromoCode> for PromoCodeDto {
    fn from(entity: &PromoCode) -> Self {
        Self {
            id: Some(entity.id),
            terms: entity.terms.clone(),
            usage_count: Some(entity.usage_count),
            created_at: Some(entity.audit_info.created_at),
            updated_at: Some(entity.audit_info.updated_at),
        }
    }
}

impl From<PromoCode> for PromoCodeDto {
    fn from(entity: PromoCode) -> Self {
        Self {
            id: Some(entity.id),
            terms: entity.terms,
            usage_count: Some(entity.usage_count),
            created_at: Some(entity.audit_info.created_at),
            updated_at: Some(entity.audit_info.updated_at),
        }
    }
}
