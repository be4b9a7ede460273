//! 促销码领域模块

#![allow(clippy::module_inception)]

pub mod filter;
pub mod promo_code;
pub mod repository;

pub use filter::{CodeMatch, FilterClause, PromoCodeFilter};
pub use promo_code::{
    DiscountType, NewPromoCode, PromoCode, PromoCodeId, PromoCodeStatus, PromoCodeTerms,
    UnknownLabel,
};
pub use repository::PromoCodeRepository;
