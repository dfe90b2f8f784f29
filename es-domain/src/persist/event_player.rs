//! 事件重放（EventPlayer）
//!
//! 先取满足版本上限的最新快照，再读取快照之后的事件并按序折叠，
//! 得到实体在指定版本时的状态。
//!
use crate::{
    aggregate::{Aggregate, fold},
    entity::Entity,
    error::{DomainError, DomainResult as Result},
    persist::{SequencedItemStore, Snapshot, SnapshotStrategy},
};
use futures_util::TryStreamExt;
use std::sync::Arc;

pub struct EventPlayer<A: Aggregate> {
    event_store: Arc<SequencedItemStore<A::Event>>,
    snapshot_strategy: Option<SnapshotStrategy>,
}

impl<A: Aggregate> Clone for EventPlayer<A> {
    fn clone(&self) -> Self {
        Self {
            event_store: Arc::clone(&self.event_store),
            snapshot_strategy: self.snapshot_strategy.clone(),
        }
    }
}

impl<A: Aggregate> EventPlayer<A> {
    pub fn new(
        event_store: Arc<SequencedItemStore<A::Event>>,
        snapshot_strategy: Option<SnapshotStrategy>,
    ) -> Self {
        Self {
            event_store,
            snapshot_strategy,
        }
    }

    pub fn event_store(&self) -> &Arc<SequencedItemStore<A::Event>> {
        &self.event_store
    }

    pub fn snapshot_strategy(&self) -> Option<&SnapshotStrategy> {
        self.snapshot_strategy.as_ref()
    }

    /// 重放实体至 `lte`（含）为止的事件
    ///
    /// `lte` 为事件的 `originator_version` 上限，结果实体版本至多为 `lte + 1`；
    /// 既无快照也无事件时返回 `None`。
    pub async fn replay_events(&self, entity_id: &A::Id, lte: Option<usize>) -> Result<Option<A>> {
        let sequence_id = entity_id.to_string();

        // 快照版本是已折叠的事件数，故上限为 lte + 1
        let snapshot = match &self.snapshot_strategy {
            Some(strategy) => {
                strategy
                    .get_snapshot(&sequence_id, lte.map(|v| v.saturating_add(1)))
                    .await?
            }
            None => None,
        };

        let mut entity: Option<A> = snapshot
            .as_ref()
            .map(Snapshot::to_entity::<A>)
            .transpose()?;
        let start = entity.as_ref().map(Entity::version).unwrap_or(0) as u64;

        let mut events = self.event_store.get_items(
            &sequence_id,
            start.checked_sub(1),
            lte.map(|v| v as u64),
        );
        let mut folded = 0usize;
        while let Some(event) = events.try_next().await? {
            let working = entity.get_or_insert_with(|| A::new(entity_id.clone(), 0));
            fold(working, &event)?;
            folded += 1;
        }

        tracing::debug!(
            entity_id = %sequence_id,
            lte = ?lte,
            from_snapshot = snapshot.is_some(),
            folded,
            "Replayed events"
        );
        Ok(entity)
    }

    /// 重放至 `at_version`（为空时取最新）并写入快照；实体不存在时返回 `None`
    pub async fn take_snapshot(
        &self,
        entity_id: &A::Id,
        at_version: Option<usize>,
    ) -> Result<Option<Snapshot>> {
        let Some(strategy) = &self.snapshot_strategy else {
            return Err(DomainError::InvalidConfig {
                reason: "no snapshot strategy configured".into(),
            });
        };
        match self.replay_events(entity_id, at_version).await? {
            Some(entity) => strategy.take_snapshot(&entity).await.map(Some),
            None => Ok(None),
        }
    }
}
