//! 聚合（Aggregate）抽象
//!
//! 约束一个聚合的核心行为：
//! - `execute` 将命令转换为事件（不改变状态）；
//! - `apply` 将事件投影到状态（改变状态）；
//! - `fold` 在投影前校验事件版本，并在投影后将实体版本加一。
//!
use crate::domain_event::DomainEvent;
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use serde::{Serialize, de::DeserializeOwned};
use std::error::Error;

/// 聚合根接口
pub trait Aggregate: Entity + Clone + Serialize + DeserializeOwned + 'static {
    /// 聚合类型名，同时作为快照主题
    const TYPE: &'static str;

    /// 该聚合支持的命令类型
    type Command: Send;
    /// 该聚合产生的领域事件类型
    type Event: DomainEvent + 'static;
    /// 命令执行或持久化环节的错误类型
    type Error: Error + From<DomainError> + Send + Sync + 'static;

    /// 执行命令，返回产生的事件列表
    fn execute(&self, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// 应用事件，更新聚合状态（版本由 `fold` 维护）
    fn apply(&mut self, event: &Self::Event);
}

/// 将一个按版本排序的事件折叠到实体上
///
/// 事件的 `originator_version` 必须等于实体当前版本；成功后实体版本加一。
pub fn fold<A: Aggregate>(entity: &mut A, event: &A::Event) -> DomainResult<()> {
    let expected = entity.version();
    if event.originator_version() != Some(expected) {
        return Err(DomainError::OriginatorVersionMismatch {
            originator_id: event.originator_id().to_string(),
            expected,
            actual: event.originator_version(),
        });
    }
    entity.apply(event);
    entity.set_version(expected + 1);
    Ok(())
}
