//! 领域事件（Domain Event）
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`）与事件的排序方式（`Sequencing`）：
//! 按版本排序的事件以 `originator_version` 作为位置，按时间排序的事件以时间戳（微秒）作为位置。

mod domain_event_trait;
mod sequencing;

pub use domain_event_trait::{DomainEvent, Timestamp};
pub use sequencing::{Sequencing, timestamp_position};
