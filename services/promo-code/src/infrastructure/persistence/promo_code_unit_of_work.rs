//! PostgreSQL Unit of Work 实现

use async_trait::async_trait;
use promo_adapter_postgres::{IsolationLevel, TransactionManager, TransactionOptions};
use promo_errors::{AppError, AppResult};
use promo_ports::{AccessMode, Transactional};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::tx_repositories::{SharedTx, TxPromoCodeRepository};
use crate::domain::promo_code::PromoCodeRepository;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// Postgres Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    manager: TransactionManager,
    isolation_level: IsolationLevel,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            manager: TransactionManager::new(pool),
            isolation_level: IsolationLevel::default(),
        }
    }

    /// 所有工作单元使用的隔离级别，默认 READ COMMITTED
    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = level;
        self
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self, mode: AccessMode) -> AppResult<Box<dyn UnitOfWork>> {
        let options = TransactionOptions::from(mode).with_isolation_level(self.isolation_level);
        let tx = self.manager.begin_with_options(&options).await?;

        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }
}

/// Postgres Unit of Work 实现
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    promo_code_repo: TxPromoCodeRepository,
}

impl PostgresUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        let tx = Arc::new(Mutex::new(Some(tx)));

        Self {
            tx: tx.clone(),
            promo_code_repo: TxPromoCodeRepository::new(tx),
        }
    }

    async fn take_tx(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))
    }
}

impl UnitOfWork for PostgresUnitOfWork {
    fn promo_codes(&self) -> &dyn PromoCodeRepository {
        &self.promo_code_repo
    }
}

#[async_trait]
impl Transactional for PostgresUnitOfWork {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let tx = self.take_tx().await?;
        TransactionManager::commit(tx).await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let tx = self.take_tx().await?;
        TransactionManager::rollback(tx).await
    }
}
