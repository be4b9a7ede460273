//! Transactional repositories for promo codes
//!
//! These repositories use a shared transaction instead of a connection pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promo_common::{AuditInfo, TenantId};
use promo_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error_mapper::map_sqlx_error;
use crate::domain::promo_code::filter::{self, FilterClause};
use crate::domain::promo_code::{
    CodeMatch, NewPromoCode, PromoCode, PromoCodeFilter, PromoCodeId, PromoCodeRepository,
    PromoCodeTerms, UnknownLabel,
};

/// Shared transaction type
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

const PROMO_CODE_COLUMNS: &str = "id, tenant_id, code, amount, discount_type, expiry_date, \
     usage_limit, usage_count, status, created_at, updated_at";

fn not_found(id: PromoCodeId) -> AppError {
    AppError::not_found(format!("Promo code not found with id: {}", id))
}

pub struct TxPromoCodeRepository {
    tx: SharedTx,
}

impl TxPromoCodeRepository {
    pub fn new(tx: SharedTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl PromoCodeRepository for TxPromoCodeRepository {
    async fn insert(&self, promo_code: &NewPromoCode) -> AppResult<PromoCode> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
            r#"
            INSERT INTO promo_codes (tenant_id, code, amount, discount_type, expiry_date,
                                     usage_limit, usage_count, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PROMO_CODE_COLUMNS
        ))
        .bind(promo_code.tenant_id.as_str())
        .bind(&promo_code.terms.code)
        .bind(promo_code.terms.amount)
        .bind(promo_code.terms.discount_type.as_str())
        .bind(promo_code.terms.expiry_date)
        .bind(promo_code.terms.usage_limit)
        .bind(promo_code.usage_count)
        .bind(promo_code.terms.status.as_str())
        .bind(promo_code.audit_info.created_at)
        .bind(promo_code.audit_info.updated_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        row.into_promo_code()
    }

    async fn update(&self, promo_code: &PromoCode) -> AppResult<PromoCode> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
            r#"
            UPDATE promo_codes
            SET code = $3, amount = $4, discount_type = $5, expiry_date = $6,
                usage_limit = $7, status = $8, updated_at = $9
            WHERE id = $1 AND tenant_id = $2
            RETURNING {}
            "#,
            PROMO_CODE_COLUMNS
        ))
        .bind(promo_code.id.0)
        .bind(promo_code.tenant_id.as_str())
        .bind(&promo_code.terms.code)
        .bind(promo_code.terms.amount)
        .bind(promo_code.terms.discount_type.as_str())
        .bind(promo_code.terms.expiry_date)
        .bind(promo_code.terms.usage_limit)
        .bind(promo_code.terms.status.as_str())
        .bind(promo_code.audit_info.updated_at)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(r) => r.into_promo_code(),
            None => Err(not_found(promo_code.id)),
        }
    }

    async fn delete(&self, id: PromoCodeId, tenant_id: &TenantId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let result = sqlx::query("DELETE FROM promo_codes WHERE id = $1 AND tenant_id = $2")
            .bind(id.0)
            .bind(tenant_id.as_str())
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    async fn find_by_tenant_id(&self, tenant_id: &TenantId) -> AppResult<Vec<PromoCode>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let rows = sqlx::query_as::<_, PromoCodeRow>(&format!(
            "SELECT {} FROM promo_codes WHERE tenant_id = $1 ORDER BY id",
            PROMO_CODE_COLUMNS
        ))
        .bind(tenant_id.as_str())
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(PromoCodeRow::into_promo_code).collect()
    }

    async fn find_by_id_and_tenant_id(
        &self,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> AppResult<Option<PromoCode>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
            "SELECT {} FROM promo_codes WHERE id = $1 AND tenant_id = $2",
            PROMO_CODE_COLUMNS
        ))
        .bind(id.0)
        .bind(tenant_id.as_str())
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(PromoCodeRow::into_promo_code).transpose()
    }

    async fn find_by_code_and_tenant_id(
        &self,
        code: &str,
        tenant_id: &TenantId,
    ) -> AppResult<Option<PromoCode>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let row = sqlx::query_as::<_, PromoCodeRow>(&format!(
            "SELECT {} FROM promo_codes WHERE tenant_id = $1 AND code = $2 ORDER BY id LIMIT 1",
            PROMO_CODE_COLUMNS
        ))
        .bind(tenant_id.as_str())
        .bind(code)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(PromoCodeRow::into_promo_code).transpose()
    }

    async fn find_matching(
        &self,
        tenant_id: &TenantId,
        filter: &PromoCodeFilter,
        code_match: CodeMatch,
    ) -> AppResult<Vec<PromoCode>> {
        let clauses = filter::conjunction(tenant_id, filter, code_match);
        let mut query_builder = build_filter_query(&clauses);

        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let rows = query_builder
            .build_query_as::<PromoCodeRow>()
            .fetch_all(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(PromoCodeRow::into_promo_code).collect()
    }
}

/// 把合取子句渲染成 SQL
///
/// 子串匹配使用 `strpos`，`%` 和 `_` 按字面量处理。
fn build_filter_query(clauses: &[FilterClause]) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new(format!(
        "SELECT {} FROM promo_codes WHERE ",
        PROMO_CODE_COLUMNS
    ));

    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            query_builder.push(" AND ");
        }
        push_clause(&mut query_builder, clause);
    }

    query_builder.push(" ORDER BY id");
    query_builder
}

fn push_clause(query_builder: &mut QueryBuilder<'static, Postgres>, clause: &FilterClause) {
    match clause {
        FilterClause::TenantIs(tenant_id) => {
            query_builder.push("tenant_id = ");
            query_builder.push_bind(tenant_id.0.clone());
        }
        FilterClause::CodeContains {
            needle,
            mode: CodeMatch::CaseSensitive,
        } => {
            query_builder.push("strpos(code, ");
            query_builder.push_bind(needle.clone());
            query_builder.push(") > 0");
        }
        FilterClause::CodeContains {
            needle,
            mode: CodeMatch::CaseInsensitive,
        } => {
            query_builder.push("strpos(lower(code), ");
            query_builder.push_bind(needle.clone());
            query_builder.push(") > 0");
        }
        FilterClause::StatusIs(status) => {
            query_builder.push("status = ");
            query_builder.push_bind(status.as_str());
        }
        FilterClause::CreatedFrom(start) => {
            query_builder.push("created_at >= ");
            query_builder.push_bind(*start);
        }
        FilterClause::CreatedUntil(end) => {
            query_builder.push("created_at <= ");
            query_builder.push_bind(*end);
        }
    }
}

// ============ 数据行映射 ============

#[derive(sqlx::FromRow)]
struct PromoCodeRow {
    id: i64,
    tenant_id: String,
    code: String,
    amount: Decimal,
    discount_type: String,
    expiry_date: DateTime<Utc>,
    usage_limit: i32,
    usage_count: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PromoCodeRow {
    fn into_promo_code(self) -> AppResult<PromoCode> {
        let map_label = |e: UnknownLabel| AppError::database(e.to_string());

        Ok(PromoCode {
            id: PromoCodeId(self.id),
            tenant_id: TenantId::new(self.tenant_id),
            terms: PromoCodeTerms {
                code: self.code,
                amount: self.amount,
                discount_type: self.discount_type.parse().map_err(map_label)?,
                expiry_date: self.expiry_date,
                usage_limit: self.usage_limit,
                status: self.status.parse().map_err(map_label)?,
            },
            usage_count: self.usage_count,
            audit_info: AuditInfo {
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::promo_code::PromoCodeStatus;
    use chrono::TimeZone;

    #[test]
    fn test_filter_query_tenant_only() {
        let clauses = filter::conjunction(
            &TenantId::new("acme"),
            &PromoCodeFilter::new(),
            CodeMatch::CaseSensitive,
        );
        let sql = build_filter_query(&clauses).into_sql();

        assert!(sql.ends_with("FROM promo_codes WHERE tenant_id = $1 ORDER BY id"));
    }

    #[test]
    fn test_filter_query_all_clauses() {
        let filter = PromoCodeFilter::new()
            .with_code("SAVE")
            .with_status(PromoCodeStatus::Active)
            .created_from(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
            .created_until(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
        let clauses = filter::conjunction(&TenantId::new("acme"), &filter, CodeMatch::CaseInsensitive);
        let sql = build_filter_query(&clauses).into_sql();

        assert!(sql.contains(
            "WHERE tenant_id = $1 AND strpos(lower(code), $2) > 0 AND status = $3 \
             AND created_at >= $4 AND created_at <= $5 ORDER BY id"
        ));
    }

    #[test]
    fn test_filter_query_case_sensitive_code() {
        let clauses = filter::conjunction(
            &TenantId::new("acme"),
            &PromoCodeFilter::new().with_code("SAVE"),
            CodeMatch::CaseSensitive,
        );
        let sql = build_filter_query(&clauses).into_sql();

        assert!(sql.contains("AND strpos(code, $2) > 0"));
        assert!(!sql.contains("lower("));
    }

    #[test]
    fn test_row_with_unknown_status_is_database_error() {
        let now = Utc::now();
        let row = PromoCodeRow {
            id: 1,
            tenant_id: "acme".to_string(),
            code: "WELCOME10".to_string(),
            amount: Decimal::new(10, 0),
            discount_type: "PERCENTAGE".to_string(),
            expiry_date: now,
            usage_limit: 100,
            usage_count: 0,
            status: "ARCHIVED".to_string(),
            created_at: now,
            updated_at: now,
        };

        let err = row.into_promo_code().unwrap_err();
        assert!(matches!(err, AppError::Database(msg) if msg.contains("ARCHIVED")));
    }
}
