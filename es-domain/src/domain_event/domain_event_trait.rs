use super::sequencing::Sequencing;
use crate::persist::Sequenced;
use chrono::{DateTime, Utc};

/// 事件时间戳
pub type Timestamp = DateTime<Utc>;

/// 领域事件载荷需要满足的通用能力边界
///
/// 通常由 `#[domain_event]` 宏生成实现；序列 ID 即 `originator_id`。
pub trait DomainEvent: Sequenced + PartialEq {
    /// 事件所属实体标识
    fn originator_id(&self) -> &str {
        self.sequence_id()
    }

    /// 事件发出前的实体版本；按时间排序的事件没有版本
    fn originator_version(&self) -> Option<usize>;

    /// 事件创建时间
    fn timestamp(&self) -> Timestamp;

    /// 事件的排序方式，决定写入哪个事件存储
    fn sequencing(&self) -> Sequencing {
        match self.originator_version() {
            Some(_) => Sequencing::Version,
            None => Sequencing::Timestamp,
        }
    }
}
