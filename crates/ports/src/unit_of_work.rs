//! Unit of Work trait 定义

use async_trait::async_trait;
use promo_errors::AppResult;

/// 事务访问模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    /// 读写
    #[default]
    ReadWrite,
    /// 只读
    ReadOnly,
}

impl AccessMode {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

/// 可提交 / 回滚的工作单元
///
/// 两个方法都消费 `self`，事务结束后不可再使用。
#[async_trait]
pub trait Transactional: Send + Sync {
    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
