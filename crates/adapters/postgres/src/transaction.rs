//! PostgreSQL 事务管理
//!
//! 每个事务开始后立即执行一条 `SET TRANSACTION`，
//! 让隔离级别和读写模式在第一条业务语句之前生效。

use std::fmt;

use promo_errors::{AppError, AppResult};
use promo_ports::AccessMode;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

/// 事务隔离级别
///
/// PostgreSQL 把 READ UNCOMMITTED 当作 READ COMMITTED 处理，因此不单独提供。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// 事务选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub isolation_level: IsolationLevel,
    pub access_mode: AccessMode,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = level;
        self
    }

    pub fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// 生成 SET TRANSACTION 语句
    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl From<AccessMode> for TransactionOptions {
    fn from(mode: AccessMode) -> Self {
        Self::new().with_access_mode(mode)
    }
}

impl fmt::Display for TransactionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = if self.access_mode.is_read_only() {
            "READ ONLY"
        } else {
            "READ WRITE"
        };
        write!(
            f,
            "SET TRANSACTION ISOLATION LEVEL {}, {}",
            self.isolation_level.as_sql(),
            access
        )
    }
}

/// 事务管理器
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
}

impl TransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按选项开始事务
    pub async fn begin_with_options(
        &self,
        options: &TransactionOptions,
    ) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        let statement = options.to_sql();
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to set transaction options: {}", e)))?;

        debug!(options = %statement, "Transaction started");
        Ok(tx)
    }

    pub async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))
    }

    pub async fn rollback(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_sql() {
        assert_eq!(
            TransactionOptions::new().to_sql(),
            "SET TRANSACTION ISOLATION LEVEL READ COMMITTED, READ WRITE"
        );
    }

    #[test]
    fn test_options_from_access_mode() {
        let options = TransactionOptions::from(AccessMode::ReadOnly);
        assert_eq!(options.isolation_level, IsolationLevel::ReadCommitted);
        assert_eq!(
            options.to_sql(),
            "SET TRANSACTION ISOLATION LEVEL READ COMMITTED, READ ONLY"
        );
    }

    #[test]
    fn test_serializable_read_write() {
        let options = TransactionOptions::from(AccessMode::ReadWrite)
            .with_isolation_level(IsolationLevel::Serializable);
        assert_eq!(
            options.to_sql(),
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE, READ WRITE"
        );
    }

    #[test]
    fn test_repeatable_read_sql() {
        assert_eq!(IsolationLevel::RepeatableRead.as_sql(), "REPEATABLE READ");
    }
}
