//! 序列项（SequencedItem）
//!
//! 存储层的原子单元：`(sequence_id, position)` 唯一，`topic` 选择反序列化目标，
//! `state` 为序列化（可选加密）后的字节。
//!
use bon::Builder;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct SequencedItem {
    /// 序列标识（通常为实体 ID）
    #[builder(into)]
    sequence_id: String,
    /// 序列内位置，同一序列内严格递增，作为乐观并发的令牌
    position: u64,
    /// 主题，用于解析具体类型
    #[builder(into)]
    topic: String,
    /// 序列化（可能已加密）的载荷
    state: Vec<u8>,
}

impl SequencedItem {
    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn state(&self) -> &[u8] {
        &self.state
    }

    pub fn into_state(self) -> Vec<u8> {
        self.state
    }
}

/// 可写入序列存储的对象（领域事件、快照）
///
/// 对象自身携带序列标识、位置与主题；`known_topics` 声明可解析的主题表，
/// 返回 `None` 表示不做主题注册校验。
pub trait Sequenced: Clone + Debug + Serialize + DeserializeOwned + Send + Sync {
    fn sequence_id(&self) -> &str;

    fn position(&self) -> u64;

    fn topic(&self) -> &str;

    fn known_topics() -> Option<&'static [&'static str]>
    where
        Self: Sized,
    {
        None
    }
}
