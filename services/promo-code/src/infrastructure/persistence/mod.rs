//! 持久化层模块

pub mod error_mapper;
pub mod memory;
pub mod promo_code_unit_of_work;
pub mod tx_repositories;

pub use memory::{InMemoryUnitOfWork, InMemoryUnitOfWorkFactory};
pub use promo_code_unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
pub use tx_repositories::TxPromoCodeRepository;
