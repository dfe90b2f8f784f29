//! 记录策略（ActiveRecordStrategy）
//!
//! 存储后端的最小接口：批量插入（唯一约束检测冲突）、按区间查询、删除与全量遍历。
//!
use crate::{error::DomainResult as Result, persist::SequencedItem};
use async_trait::async_trait;
use bon::Builder;
use std::sync::Arc;

/// 查询区间：`gt < position <= lte`，可选条数上限与降序
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
pub struct ItemRange {
    pub gt: Option<u64>,
    pub lte: Option<u64>,
    pub limit: Option<usize>,
    #[builder(default)]
    pub descending: bool,
}

impl ItemRange {
    pub fn all() -> Self {
        Self::default()
    }

    /// 位置是否落在区间内（不考虑 limit）
    pub fn contains(&self, position: u64) -> bool {
        self.gt.is_none_or(|gt| position > gt) && self.lte.is_none_or(|lte| position <= lte)
    }

    /// 区间是否必然为空
    pub fn is_empty(&self) -> bool {
        matches!(self.limit, Some(0))
            || matches!((self.gt, self.lte), (Some(gt), Some(lte)) if gt >= lte)
    }
}

#[async_trait]
pub trait ActiveRecordStrategy: Send + Sync {
    /// 原子写入一批记录；任一 `(sequence_id, position)` 已存在（含批内重复）
    /// 则整体失败并返回 `ConcurrencyConflict`
    async fn insert(&self, items: &[SequencedItem]) -> Result<()>;

    /// 按区间查询某序列的记录，默认按位置升序
    async fn select_range(&self, sequence_id: &str, range: &ItemRange)
    -> Result<Vec<SequencedItem>>;

    /// 删除一条记录（按 `sequence_id` + `position` 定位）
    async fn delete(&self, item: &SequencedItem) -> Result<()>;

    /// 全部记录
    async fn all_records(&self) -> Result<Vec<SequencedItem>>;
}

#[async_trait]
impl<T> ActiveRecordStrategy for Arc<T>
where
    T: ActiveRecordStrategy + ?Sized,
{
    async fn insert(&self, items: &[SequencedItem]) -> Result<()> {
        (**self).insert(items).await
    }

    async fn select_range(
        &self,
        sequence_id: &str,
        range: &ItemRange,
    ) -> Result<Vec<SequencedItem>> {
        (**self).select_range(sequence_id, range).await
    }

    async fn delete(&self, item: &SequencedItem) -> Result<()> {
        (**self).delete(item).await
    }

    async fn all_records(&self) -> Result<Vec<SequencedItem>> {
        (**self).all_records().await
    }
}

#[cfg(test)]
mod tests {
    use super::ItemRange;

    #[test]
    fn range_bounds_are_exclusive_inclusive() {
        let range = ItemRange::builder().gt(1).lte(3).build();
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(3));
        assert!(!range.contains(4));
        assert!(!range.is_empty());

        assert!(ItemRange::all().contains(0));
        assert!(ItemRange::builder().gt(3).lte(3).build().is_empty());
        assert!(ItemRange::builder().limit(0).build().is_empty());
    }
}
