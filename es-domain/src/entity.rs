//! 实体（Entity）基础抽象
//!
//! 为事件溯源实体提供统一的标识（Id）与版本能力。
//! 版本即已折叠事件的数量：新实体为 0，每应用一个事件加一，
//! 下一个事件的 `originator_version` 必须等于当前版本。
//!
use std::{fmt::Display, str::FromStr};

/// 具备唯一标识与版本的实体抽象
pub trait Entity: Send + Sync {
    /// 实体标识类型，要求可解析、可显示与可克隆；其 `Display` 形式即序列 ID
    type Id: FromStr + Clone + Display + Send + Sync + 'static;

    /// 使用给定标识与版本创建实体
    fn new(id: Self::Id, version: usize) -> Self;

    /// 获取实体标识
    fn id(&self) -> &Self::Id;

    /// 获取当前版本（用于乐观锁与并发控制）
    fn version(&self) -> usize;

    /// 设置当前版本，仅由事件折叠过程调用
    fn set_version(&mut self, version: usize);
}
