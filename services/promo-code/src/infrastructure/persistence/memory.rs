//! 内存 Unit of Work 实现
//!
//! 工作单元开始时独占整个存储并复制一份暂存状态，所有读写都落在暂存状态上。
//! 提交时写回，回滚时丢弃。同一时刻只有一个工作单元持有存储。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use promo_common::TenantId;
use promo_errors::{AppError, AppResult};
use promo_ports::{AccessMode, Transactional};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::promo_code::filter;
use crate::domain::promo_code::{
    CodeMatch, NewPromoCode, PromoCode, PromoCodeFilter, PromoCodeId, PromoCodeRepository,
};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

#[derive(Debug, Clone)]
struct MemoryState {
    next_id: i64,
    rows: BTreeMap<PromoCodeId, PromoCode>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

/// 内存 Unit of Work 工厂
#[derive(Clone, Default)]
pub struct InMemoryUnitOfWorkFactory {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryUnitOfWorkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已提交的全部记录（按 ID 排序）
    pub async fn stored(&self) -> Vec<PromoCode> {
        self.state.lock().await.rows.values().cloned().collect()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUnitOfWorkFactory {
    async fn begin(&self, mode: AccessMode) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();

        Ok(Box::new(InMemoryUnitOfWork {
            guard,
            repo: InMemoryPromoCodeRepository {
                staged: Mutex::new(staged),
                mode,
            },
        }))
    }
}

/// 内存 Unit of Work
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    repo: InMemoryPromoCodeRepository,
}

impl UnitOfWork for InMemoryUnitOfWork {
    fn promo_codes(&self) -> &dyn PromoCodeRepository {
        &self.repo
    }
}

#[async_trait]
impl Transactional for InMemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Self { mut guard, repo } = *self;
        *guard = repo.staged.into_inner();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

/// 暂存状态上的促销码仓储
pub struct InMemoryPromoCodeRepository {
    staged: Mutex<MemoryState>,
    mode: AccessMode,
}

impl InMemoryPromoCodeRepository {
    fn ensure_writable(&self, statement: &str) -> AppResult<()> {
        if self.mode.is_read_only() {
            return Err(AppError::database(format!(
                "cannot execute {} in a read-only transaction",
                statement
            )));
        }
        Ok(())
    }
}

fn not_found(id: PromoCodeId) -> AppError {
    AppError::not_found(format!("Promo code not found with id: {}", id))
}

#[async_trait]
impl PromoCodeRepository for InMemoryPromoCodeRepository {
    async fn insert(&self, promo_code: &NewPromoCode) -> AppResult<PromoCode> {
        self.ensure_writable("INSERT")?;

        let mut state = self.staged.lock().await;
        let id = PromoCodeId(state.next_id);
        state.next_id += 1;

        let saved = PromoCode::from_new(id, promo_code.clone());
        state.rows.insert(id, saved.clone());
        Ok(saved)
    }

    async fn update(&self, promo_code: &PromoCode) -> AppResult<PromoCode> {
        self.ensure_writable("UPDATE")?;

        let mut state = self.staged.lock().await;
        let stored = state
            .rows
            .get_mut(&promo_code.id)
            .filter(|stored| stored.belongs_to(&promo_code.tenant_id))
            .ok_or_else(|| not_found(promo_code.id))?;

        // 与 SQL UPDATE 一致：只覆盖条款和更新时间
        stored.terms = promo_code.terms.clone();
        stored.audit_info.updated_at = promo_code.audit_info.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, id: PromoCodeId, tenant_id: &TenantId) -> AppResult<()> {
        self.ensure_writable("DELETE")?;

        let mut state = self.staged.lock().await;
        match state.rows.get(&id) {
            Some(stored) if stored.belongs_to(tenant_id) => {
                state.rows.remove(&id);
                Ok(())
            }
            _ => Err(not_found(id)),
        }
    }

    async fn find_by_tenant_id(&self, tenant_id: &TenantId) -> AppResult<Vec<PromoCode>> {
        let state = self.staged.lock().await;
        Ok(state
            .rows
            .values()
            .filter(|p| p.belongs_to(tenant_id))
            .cloned()
            .collect())
    }

    async fn find_by_id_and_tenant_id(
        &self,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> AppResult<Option<PromoCode>> {
        let state = self.staged.lock().await;
        Ok(state
            .rows
            .get(&id)
            .filter(|p| p.belongs_to(tenant_id))
            .cloned())
    }

    async fn find_by_code_and_tenant_id(
        &self,
        code: &str,
        tenant_id: &TenantId,
    ) -> AppResult<Option<PromoCode>> {
        let state = self.staged.lock().await;
        Ok(state
            .rows
            .values()
            .find(|p| p.belongs_to(tenant_id) && p.terms.code == code)
            .cloned())
    }

    async fn find_matching(
        &self,
        tenant_id: &TenantId,
        filter: &PromoCodeFilter,
        code_match: CodeMatch,
    ) -> AppResult<Vec<PromoCode>> {
        let clauses = filter::conjunction(tenant_id, filter, code_match);
        let state = self.staged.lock().await;
        Ok(state
            .rows
            .values()
            .filter(|p| filter::matches_all(&clauses, p))
            .cloned()
            .collect())
    }
}
