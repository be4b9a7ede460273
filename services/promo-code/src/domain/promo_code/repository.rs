//! 促销码仓储接口

use async_trait::async_trait;
use promo_common::TenantId;
use promo_errors::AppResult;

use super::filter::{CodeMatch, PromoCodeFilter};
use super::promo_code::{NewPromoCode, PromoCode, PromoCodeId};

/// 促销码仓储接口
///
/// 所有按 ID 的读写都同时以 `(id, tenant_id)` 为条件，
/// 其他租户的记录与不存在的记录无法区分。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    /// 插入新促销码，返回带存储分配 ID 的实体
    async fn insert(&self, promo_code: &NewPromoCode) -> AppResult<PromoCode>;

    /// 按 `(id, tenant_id)` 覆盖保存，没有匹配行时返回 NotFound
    async fn update(&self, promo_code: &PromoCode) -> AppResult<PromoCode>;

    /// 按 `(id, tenant_id)` 物理删除，没有匹配行时返回 NotFound
    async fn delete(&self, id: PromoCodeId, tenant_id: &TenantId) -> AppResult<()>;

    /// 列出租户下的所有促销码
    async fn find_by_tenant_id(&self, tenant_id: &TenantId) -> AppResult<Vec<PromoCode>>;

    /// 根据 ID 查找促销码
    async fn find_by_id_and_tenant_id(
        &self,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> AppResult<Option<PromoCode>>;

    /// 根据代码精确查找；代码不唯一，取 ID 最小的一条
    async fn find_by_code_and_tenant_id(
        &self,
        code: &str,
        tenant_id: &TenantId,
    ) -> AppResult<Option<PromoCode>>;

    /// 按过滤条件查询，代码匹配方式由调用方指定
    async fn find_matching(
        &self,
        tenant_id: &TenantId,
        filter: &PromoCodeFilter,
        code_match: CodeMatch,
    ) -> AppResult<Vec<PromoCode>>;

    /// 按过滤条件查询（代码区分大小写）
    async fn find_by_filters(
        &self,
        tenant_id: &TenantId,
        filter: &PromoCodeFilter,
    ) -> AppResult<Vec<PromoCode>> {
        self.find_matching(tenant_id, filter, CodeMatch::CaseSensitive)
            .await
    }
}
