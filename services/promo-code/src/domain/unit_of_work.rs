//! Unit of Work 模式
//!
//! 每个服务操作在一个工作单元内完成：写操作使用读写事务，
//! 查询使用只读事务。

use async_trait::async_trait;
use promo_errors::AppResult;
use promo_ports::{AccessMode, Transactional};

use crate::domain::promo_code::PromoCodeRepository;

/// Unit of Work trait
pub trait UnitOfWork: Transactional {
    /// 获取促销码 Repository
    fn promo_codes(&self) -> &dyn PromoCodeRepository;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self, mode: AccessMode) -> AppResult<Box<dyn UnitOfWork>>;
}
