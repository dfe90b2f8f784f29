//! 持久化核心统一错误定义
//!
//! 聚焦并发冲突、主题解析/反序列化、加解密、重放校验与后端故障等最小必要集合，
//! 便于在各实现层统一转换为 `DomainError`。
//!
use thiserror::Error;

/// 统一错误类型（持久化核心最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化/主题解析 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("unknown event type: topic={topic}")]
    UnknownEventType { topic: String },
    #[error("duplicate topic registered: topic={topic}")]
    DuplicateTopic { topic: String },
    #[error("topic mismatch: expected={expected}, found={found}")]
    TopicMismatch { expected: String, found: String },
    #[error("cipher error: {reason}")]
    Cipher { reason: String },

    // --- 存储/并发 ---
    #[error("concurrency conflict: sequence_id={sequence_id}, position={position}")]
    ConcurrencyConflict { sequence_id: String, position: u64 },
    #[error("invalid batch: {reason}")]
    InvalidBatch { reason: String },
    #[error("backend error: {reason}")]
    Backend { reason: String },

    // --- 重放/仓储 ---
    #[error(
        "originator version mismatch: originator_id={originator_id}, expected={expected}, actual={actual:?}"
    )]
    OriginatorVersionMismatch {
        originator_id: String,
        expected: usize,
        actual: Option<usize>,
    },
    #[error("entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    // --- 配置/命令 ---
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
}

impl DomainError {
    pub fn backend(reason: impl Into<String>) -> Self {
        DomainError::Backend {
            reason: reason.into(),
        }
    }

    pub fn invalid_batch(reason: impl Into<String>) -> Self {
        DomainError::InvalidBatch {
            reason: reason.into(),
        }
    }

    pub fn cipher(reason: impl Into<String>) -> Self {
        DomainError::Cipher {
            reason: reason.into(),
        }
    }

    /// 是否为乐观并发冲突（调用方据此决定是否重试）
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, DomainError::ConcurrencyConflict { .. })
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

// ---- Cross-crate conversions for infrastructure convenience ----
// 允许在基础设施层直接使用 `?` 将 sqlx 错误转换为 DomainError；
// 唯一约束冲突需要序列上下文，由记录策略在插入路径上单独映射。

#[cfg(feature = "infra-sqlx")]
impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Backend {
            reason: err.to_string(),
        }
    }
}
