//! Promo Code Service - 多租户促销码服务
//!
//! 提供租户隔离的促销码增删改查与条件过滤

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;

pub use application::{PromoCodeDto, PromoCodeService};
pub use domain::promo_code::{
    CodeMatch, DiscountType, PromoCode, PromoCodeFilter, PromoCodeId, PromoCodeStatus,
    PromoCodeTerms,
};
pub use infrastructure::{InMemoryUnitOfWorkFactory, PostgresUnitOfWorkFactory};
