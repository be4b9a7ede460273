//! 促销码应用服务

use std::sync::Arc;

use metrics::counter;
use promo_common::TenantId;
use promo_errors::{AppError, AppResult};
use promo_ports::AccessMode;
use tracing::{debug, warn};

use super::dto::PromoCodeDto;
use crate::domain::promo_code::{
    CodeMatch, NewPromoCode, PromoCode, PromoCodeFilter, PromoCodeId, PromoCodeRepository,
};
use crate::domain::{UnitOfWork, UnitOfWorkFactory};

/// 促销码服务
///
/// 每个操作都以调用方租户为显式参数。写操作在读写事务内完成
/// “查找-修改”，查询在只读事务内完成。
pub struct PromoCodeService<F>
where
    F: UnitOfWorkFactory,
{
    uow_factory: Arc<F>,
}

impl<F> PromoCodeService<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(uow_factory: Arc<F>) -> Self {
        Self { uow_factory }
    }

    /// 创建促销码
    pub async fn create(&self, tenant_id: &TenantId, input: PromoCodeDto) -> AppResult<PromoCodeDto> {
        debug!(tenant_id = %tenant_id, "Creating promo code");

        let uow = self.uow_factory.begin(AccessMode::ReadWrite).await?;
        let new = NewPromoCode::new(tenant_id.clone(), input.into_terms());
        let result = uow.promo_codes().insert(&new).await;
        let saved = finish(uow, result).await?;

        counter!("promo_codes_created_total").increment(1);
        Ok(saved.into())
    }

    /// 更新促销码
    pub async fn update(
        &self,
        tenant_id: &TenantId,
        id: PromoCodeId,
        input: PromoCodeDto,
    ) -> AppResult<PromoCodeDto> {
        debug!(tenant_id = %tenant_id, id = %id, "Updating promo code");

        let uow = self.uow_factory.begin(AccessMode::ReadWrite).await?;
        let result = async {
            let repo = uow.promo_codes();
            let mut promo_code = find_scoped(repo, id, tenant_id).await?;
            promo_code.revise(input.into_terms());
            repo.update(&promo_code).await
        }
        .await;
        let updated = finish(uow, result).await?;

        counter!("promo_codes_updated_total").increment(1);
        Ok(updated.into())
    }

    /// 获取促销码详情
    pub async fn get_by_id(&self, tenant_id: &TenantId, id: PromoCodeId) -> AppResult<PromoCodeDto> {
        debug!(tenant_id = %tenant_id, id = %id, "Getting promo code");

        let uow = self.uow_factory.begin(AccessMode::ReadOnly).await?;
        let result = find_scoped(uow.promo_codes(), id, tenant_id).await;
        let promo_code = finish(uow, result).await?;

        Ok(promo_code.into())
    }

    /// 列出租户下的所有促销码
    pub async fn get_all(&self, tenant_id: &TenantId) -> AppResult<Vec<PromoCodeDto>> {
        debug!(tenant_id = %tenant_id, "Getting all promo codes");

        let uow = self.uow_factory.begin(AccessMode::ReadOnly).await?;
        let result = uow.promo_codes().find_by_tenant_id(tenant_id).await;
        let promo_codes = finish(uow, result).await?;

        Ok(promo_codes.into_iter().map(PromoCodeDto::from).collect())
    }

    /// 按条件过滤促销码（代码不区分大小写）
    pub async fn get_by_filter(
        &self,
        tenant_id: &TenantId,
        filter: &PromoCodeFilter,
    ) -> AppResult<Vec<PromoCodeDto>> {
        debug!(tenant_id = %tenant_id, ?filter, "Filtering promo codes");

        let uow = self.uow_factory.begin(AccessMode::ReadOnly).await?;
        let result = uow
            .promo_codes()
            .find_matching(tenant_id, filter, CodeMatch::CaseInsensitive)
            .await;
        let promo_codes = finish(uow, result).await?;

        Ok(promo_codes.into_iter().map(PromoCodeDto::from).collect())
    }

    /// 删除促销码
    pub async fn delete(&self, tenant_id: &TenantId, id: PromoCodeId) -> AppResult<()> {
        debug!(tenant_id = %tenant_id, id = %id, "Deleting promo code");

        let uow = self.uow_factory.begin(AccessMode::ReadWrite).await?;
        let result = async {
            let repo = uow.promo_codes();
            let promo_code = find_scoped(repo, id, tenant_id).await?;
            repo.delete(promo_code.id, tenant_id).await
        }
        .await;
        finish(uow, result).await?;

        counter!("promo_codes_deleted_total").increment(1);
        Ok(())
    }
}

fn not_found(id: PromoCodeId) -> AppError {
    AppError::not_found(format!("Promo code not found with id: {}", id))
}

async fn find_scoped(
    repo: &dyn PromoCodeRepository,
    id: PromoCodeId,
    tenant_id: &TenantId,
) -> AppResult<PromoCode> {
    repo.find_by_id_and_tenant_id(id, tenant_id)
        .await?
        .ok_or_else(|| {
            counter!("promo_code_lookups_not_found_total").increment(1);
            not_found(id)
        })
}

/// 成功则提交，失败则回滚并返回原始错误
async fn finish<T>(uow: Box<dyn UnitOfWork>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Failed to rollback promo code transaction");
            }
            Err(err)
        }
    }
}
