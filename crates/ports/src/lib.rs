//! ports - 抽象 trait 层
//!
//! 定义与具体基础设施无关的事务接口

mod unit_of_work;

pub use unit_of_work::*;
