//! 促销码应用层模块

pub mod dto;
pub mod service;

pub use dto::PromoCodeDto;
pub use service::PromoCodeService;
