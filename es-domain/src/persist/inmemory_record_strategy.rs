//! 内存记录策略
//!
//! 以 `BTreeMap<sequence_id, BTreeMap<position, item>>` 保存记录，
//! 写锁内完成整批冲突检测与写入，保证批量写入的原子性。
//!
use crate::{
    error::{DomainError, DomainResult as Result},
    persist::{ActiveRecordStrategy, ItemRange, SequencedItem},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryRecordStrategy {
    records: RwLock<BTreeMap<String, BTreeMap<u64, SequencedItem>>>,
}

impl InMemoryRecordStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ActiveRecordStrategy for InMemoryRecordStrategy {
    async fn insert(&self, items: &[SequencedItem]) -> Result<()> {
        let mut records = self.records.write().await;

        let mut batch = HashSet::with_capacity(items.len());
        for item in items {
            let key = (item.sequence_id(), item.position());
            let exists = records
                .get(item.sequence_id())
                .is_some_and(|seq| seq.contains_key(&item.position()));
            if exists || !batch.insert(key) {
                return Err(DomainError::ConcurrencyConflict {
                    sequence_id: item.sequence_id().to_string(),
                    position: item.position(),
                });
            }
        }

        for item in items {
            records
                .entry(item.sequence_id().to_string())
                .or_default()
                .insert(item.position(), item.clone());
        }

        Ok(())
    }

    async fn select_range(
        &self,
        sequence_id: &str,
        range: &ItemRange,
    ) -> Result<Vec<SequencedItem>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.records.read().await;
        let Some(seq) = records.get(sequence_id) else {
            return Ok(Vec::new());
        };

        let limit = range.limit.unwrap_or(usize::MAX);
        let matching = seq
            .values()
            .filter(|item| range.contains(item.position()));
        let items: Vec<SequencedItem> = if range.descending {
            matching.rev().take(limit).cloned().collect()
        } else {
            matching.take(limit).cloned().collect()
        };

        Ok(items)
    }

    async fn delete(&self, item: &SequencedItem) -> Result<()> {
        let mut records = self.records.write().await;
        if let Some(seq) = records.get_mut(item.sequence_id()) {
            seq.remove(&item.position());
            if seq.is_empty() {
                records.remove(item.sequence_id());
            }
        }
        Ok(())
    }

    async fn all_records(&self) -> Result<Vec<SequencedItem>> {
        let records = self.records.read().await;
        Ok(records.values().flat_map(|seq| seq.values().cloned()).collect())
    }
}
