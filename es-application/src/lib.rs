//! 示例应用（es-application）
//!
//! 以 `Example` 实体演示持久化核心的完整装配：
//! 整数序列、时间序列与快照三个存储，组合持久化策略，实体仓储与命令编排，
//! 以及显式的 `close()` 生命周期。
//!
pub mod application;
pub mod config;
pub mod error;
pub mod example;

pub use application::ExampleApplication;
pub use config::AppConfig;
pub use error::AppError;
pub use example::{Example, ExampleAttribute, ExampleCommand, ExampleEvent};
