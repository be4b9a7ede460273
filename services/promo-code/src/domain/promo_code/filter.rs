//! 促销码过滤条件
//!
//! 过滤请求先被翻译成一组 [`FilterClause`]，各子句之间只有 AND 关系。
//! 租户子句永远存在，其余子句只在对应字段出现时追加。
//! 内存存储直接调用 [`FilterClause::matches`]，PostgreSQL 存储把同一组子句
//! 渲染成 SQL。

use chrono::{DateTime, Utc};
use promo_common::TenantId;
use serde::{Deserialize, Serialize};

use super::promo_code::{PromoCode, PromoCodeStatus};

/// 促销码文本的子串匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMatch {
    /// 区分大小写；只有缺省值才跳过该条件
    CaseSensitive,
    /// 不区分大小写；缺省值或空白字符串都跳过该条件
    CaseInsensitive,
}

/// 促销码过滤请求，所有字段均可选
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeFilter {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub status: Option<PromoCodeStatus>,
    /// 创建时间下界（含）
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// 创建时间上界（含）
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl PromoCodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: PromoCodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn created_from(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn created_until(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    fn code_needle(&self, mode: CodeMatch) -> Option<String> {
        let code = self.code.as_deref()?;
        match mode {
            CodeMatch::CaseSensitive => Some(code.to_string()),
            CodeMatch::CaseInsensitive if code.trim().is_empty() => None,
            CodeMatch::CaseInsensitive => Some(code.to_lowercase()),
        }
    }
}

/// 单个过滤子句
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    TenantIs(TenantId),
    /// 不区分大小写时 `needle` 已转为小写
    CodeContains { needle: String, mode: CodeMatch },
    StatusIs(PromoCodeStatus),
    CreatedFrom(DateTime<Utc>),
    CreatedUntil(DateTime<Utc>),
}

impl FilterClause {
    pub fn matches(&self, promo_code: &PromoCode) -> bool {
        match self {
            Self::TenantIs(tenant_id) => promo_code.belongs_to(tenant_id),
            Self::CodeContains {
                needle,
                mode: CodeMatch::CaseSensitive,
            } => promo_code.terms.code.contains(needle.as_str()),
            Self::CodeContains {
                needle,
                mode: CodeMatch::CaseInsensitive,
            } => promo_code
                .terms
                .code
                .to_lowercase()
                .contains(needle.as_str()),
            Self::StatusIs(status) => promo_code.terms.status == *status,
            Self::CreatedFrom(start) => promo_code.created_at() >= *start,
            Self::CreatedUntil(end) => promo_code.created_at() <= *end,
        }
    }
}

/// 构建租户范围内的合取条件
pub fn conjunction(
    tenant_id: &TenantId,
    filter: &PromoCodeFilter,
    mode: CodeMatch,
) -> Vec<FilterClause> {
    let mut clauses = vec![FilterClause::TenantIs(tenant_id.clone())];

    if let Some(needle) = filter.code_needle(mode) {
        clauses.push(FilterClause::CodeContains { needle, mode });
    }
    if let Some(status) = filter.status {
        clauses.push(FilterClause::StatusIs(status));
    }
    if let Some(start) = filter.start_date {
        clauses.push(FilterClause::CreatedFrom(start));
    }
    if let Some(end) = filter.end_date {
        clauses.push(FilterClause::CreatedUntil(end));
    }

    clauses
}

/// 所有子句都满足时返回 true
pub fn matches_all(clauses: &[FilterClause], promo_code: &PromoCode) -> bool {
    clauses.iter().all(|clause| clause.matches(promo_code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::promo_code::{DiscountType, NewPromoCode, PromoCodeId, PromoCodeTerms};
    use chrono::{Duration, TimeZone};
    use promo_common::AuditInfo;
    use rust_decimal::Decimal;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    fn promo(tenant: &str, code: &str, status: PromoCodeStatus, created_at: DateTime<Utc>) -> PromoCode {
        let mut new = NewPromoCode::new(
            TenantId::new(tenant),
            PromoCodeTerms {
                code: code.to_string(),
                amount: Decimal::new(5, 0),
                discount_type: DiscountType::Fixed,
                expiry_date: at(28),
                usage_limit: 10,
                status,
            },
        );
        new.audit_info = AuditInfo {
            created_at,
            updated_at: created_at,
        };
        PromoCode::from_new(PromoCodeId(1), new)
    }

    #[test]
    fn test_empty_filter_only_scopes_tenant() {
        let tenant = TenantId::new("acme");
        let clauses = conjunction(&tenant, &PromoCodeFilter::new(), CodeMatch::CaseInsensitive);
        assert_eq!(clauses, vec![FilterClause::TenantIs(tenant)]);
    }

    #[test]
    fn test_clause_per_present_field() {
        let tenant = TenantId::new("acme");
        let filter = PromoCodeFilter::new()
            .with_code("Save")
            .with_status(PromoCodeStatus::Active)
            .created_from(at(1))
            .created_until(at(2));

        let clauses = conjunction(&tenant, &filter, CodeMatch::CaseInsensitive);
        assert_eq!(clauses.len(), 5);
        assert_eq!(
            clauses[1],
            FilterClause::CodeContains {
                needle: "save".to_string(),
                mode: CodeMatch::CaseInsensitive,
            }
        );
    }

    #[test]
    fn test_blank_code_skipped_only_when_case_insensitive() {
        let tenant = TenantId::new("acme");
        let filter = PromoCodeFilter::new().with_code("  ");

        assert_eq!(conjunction(&tenant, &filter, CodeMatch::CaseInsensitive).len(), 1);
        assert_eq!(conjunction(&tenant, &filter, CodeMatch::CaseSensitive).len(), 2);
    }

    #[test]
    fn test_tenant_clause_rejects_other_tenant() {
        let clauses = conjunction(
            &TenantId::new("acme"),
            &PromoCodeFilter::new(),
            CodeMatch::CaseSensitive,
        );
        assert!(matches_all(&clauses, &promo("acme", "A", PromoCodeStatus::Active, at(1))));
        assert!(!matches_all(&clauses, &promo("other", "A", PromoCodeStatus::Active, at(1))));
    }

    #[test]
    fn test_code_match_case_sensitivity() {
        let tenant = TenantId::new("acme");
        let stored = promo("acme", "save10off", PromoCodeStatus::Active, at(1));

        let insensitive = conjunction(
            &tenant,
            &PromoCodeFilter::new().with_code("SAVE"),
            CodeMatch::CaseInsensitive,
        );
        assert!(matches_all(&insensitive, &stored));

        let partial = conjunction(
            &tenant,
            &PromoCodeFilter::new().with_code("SAV"),
            CodeMatch::CaseInsensitive,
        );
        assert!(matches_all(&partial, &stored));

        let sensitive = conjunction(
            &tenant,
            &PromoCodeFilter::new().with_code("SAVE"),
            CodeMatch::CaseSensitive,
        );
        assert!(!matches_all(&sensitive, &stored));
    }

    #[test]
    fn test_wildcards_are_literal() {
        let tenant = TenantId::new("acme");
        let clauses = conjunction(
            &tenant,
            &PromoCodeFilter::new().with_code("10%"),
            CodeMatch::CaseSensitive,
        );
        assert!(matches_all(&clauses, &promo("acme", "SAVE10%", PromoCodeStatus::Active, at(1))));
        assert!(!matches_all(&clauses, &promo("acme", "SAVE100", PromoCodeStatus::Active, at(1))));
    }

    #[test]
    fn test_status_is_exact() {
        let tenant = TenantId::new("acme");
        let clauses = conjunction(
            &tenant,
            &PromoCodeFilter::new().with_status(PromoCodeStatus::Expired),
            CodeMatch::CaseInsensitive,
        );
        assert!(matches_all(&clauses, &promo("acme", "A", PromoCodeStatus::Expired, at(1))));
        assert!(!matches_all(&clauses, &promo("acme", "A", PromoCodeStatus::Active, at(1))));
    }

    #[test]
    fn test_created_range_is_inclusive() {
        let tenant = TenantId::new("acme");
        let filter = PromoCodeFilter::new().created_from(at(5)).created_until(at(10));
        let clauses = conjunction(&tenant, &filter, CodeMatch::CaseInsensitive);

        let check = |created_at| {
            matches_all(&clauses, &promo("acme", "A", PromoCodeStatus::Active, created_at))
        };

        assert!(check(at(5)));
        assert!(check(at(10)));
        assert!(check(at(7)));
        assert!(!check(at(5) - Duration::seconds(1)));
        assert!(!check(at(10) + Duration::seconds(1)));
    }

    #[test]
    fn test_filter_deserializes_camel_case() {
        let filter: PromoCodeFilter = serde_json::from_str(
            r#"{"code":"SAVE","status":"ACTIVE","startDate":"2025-03-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(filter.code.as_deref(), Some("SAVE"));
        assert_eq!(filter.status, Some(PromoCodeStatus::Active));
        assert_eq!(
            filter.start_date,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert!(filter.end_date.is_none());
    }
}
