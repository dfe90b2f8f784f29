use super::Timestamp;
use std::fmt;

/// 事件在序列中的排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sequencing {
    /// 以 `originator_version` 为位置的整数序列
    Version,
    /// 以创建时间（微秒）为位置的时间序列
    Timestamp,
}

impl fmt::Display for Sequencing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sequencing::Version => write!(f, "version"),
            Sequencing::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// 将时间戳换算为时间序列中的位置（Unix 纪元以来的微秒数，纪元之前记为 0）
pub fn timestamp_position(timestamp: &Timestamp) -> u64 {
    u64::try_from(timestamp.timestamp_micros()).unwrap_or(0)
}
