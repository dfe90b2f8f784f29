//! 快照（Snapshot）与快照策略
//!
//! 快照以 `entity_id` 为序列、以 `entity_version`（已折叠事件数）为位置，
//! 存放在独立的 `SequencedItemStore<Snapshot>` 中；同一位置的重复写入返回已有快照。
//!
use crate::{
    aggregate::Aggregate,
    domain_event::Timestamp,
    error::{DomainError, DomainResult as Result},
    persist::{Sequenced, SequencedItemStore},
};
use bon::Builder;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Snapshot {
    #[builder(into)]
    entity_id: String,
    entity_version: usize,
    #[builder(into)]
    topic: String,
    state: Value,
    timestamp: Timestamp,
}

impl Snapshot {
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn entity_version(&self) -> usize {
        self.entity_version
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// 从实体创建快照，主题为实体类型名
    pub fn from_entity<A>(entity: &A) -> Result<Self>
    where
        A: Aggregate,
    {
        Ok(Self {
            entity_id: entity.id().to_string(),
            entity_version: entity.version(),
            topic: A::TYPE.to_string(),
            state: serde_json::to_value(entity)?,
            timestamp: Utc::now(),
        })
    }

    /// 将快照还原为实体实例
    pub fn to_entity<A>(&self) -> Result<A>
    where
        A: Aggregate,
    {
        if A::TYPE != self.topic {
            return Err(DomainError::TopicMismatch {
                expected: A::TYPE.to_string(),
                found: self.topic.clone(),
            });
        }

        let mut entity: A = serde_json::from_value(self.state.clone())?;
        entity.set_version(self.entity_version);
        Ok(entity)
    }
}

impl Sequenced for Snapshot {
    fn sequence_id(&self) -> &str {
        &self.entity_id
    }

    fn position(&self) -> u64 {
        self.entity_version as u64
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

/// 快照读写策略
#[derive(Clone)]
pub struct SnapshotStrategy {
    store: Arc<SequencedItemStore<Snapshot>>,
}

impl SnapshotStrategy {
    pub fn new(store: Arc<SequencedItemStore<Snapshot>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<SequencedItemStore<Snapshot>> {
        &self.store
    }

    /// `entity_version <= lte` 的最新快照（`lte` 为空时取最新）
    pub async fn get_snapshot(&self, entity_id: &str, lte: Option<usize>) -> Result<Option<Snapshot>> {
        self.store
            .get_most_recent(entity_id, lte.map(|v| v as u64))
            .await
    }

    /// 为实体当前状态写入快照；该版本已有快照时返回已有快照
    pub async fn take_snapshot<A>(&self, entity: &A) -> Result<Snapshot>
    where
        A: Aggregate,
    {
        let snapshot = Snapshot::from_entity(entity)?;
        let entity_version = snapshot.entity_version();

        match self.store.append(std::slice::from_ref(&snapshot)).await {
            Ok(()) => {
                tracing::debug!(
                    entity_id = snapshot.entity_id(),
                    entity_version,
                    topic = A::TYPE,
                    "Took snapshot"
                );
                Ok(snapshot)
            }
            Err(err) if err.is_concurrency_conflict() => {
                let existing = self
                    .get_snapshot(snapshot.entity_id(), Some(entity_version))
                    .await?;
                match existing {
                    Some(existing) if existing.entity_version() == entity_version => Ok(existing),
                    _ => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// 自动快照策略（按版本间隔）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotPolicy {
    #[default]
    Never,
    Every(usize),
}

impl SnapshotPolicy {
    /// 间隔必须至少为 1
    pub fn validate(&self) -> Result<()> {
        match self {
            SnapshotPolicy::Every(0) => Err(DomainError::InvalidConfig {
                reason: "snapshot interval must be at least 1".into(),
            }),
            _ => Ok(()),
        }
    }

    pub fn should_snapshot(&self, version: usize) -> bool {
        match self {
            SnapshotPolicy::Never | SnapshotPolicy::Every(0) => false,
            SnapshotPolicy::Every(interval) => version > 0 && version.is_multiple_of(*interval),
        }
    }
}
