//! 应用层模块

pub mod promo_code;

pub use promo_code::{PromoCodeDto, PromoCodeService};
