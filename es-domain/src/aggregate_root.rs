//! 聚合根编排器（AggregateRoot）
//!
//! 封装“加载实体 → 执行命令 → 折叠事件 → 发布事件 → 按策略快照”的标准流程。
//! 事件由订阅了通道的持久化策略写入存储，并发冲突会从 `publish` 返回给调用方。
//! 一次命令产生的事件必须能作为单个批次写入同一存储，否则在发布前拒绝。
//!
use crate::{
    aggregate::{Aggregate, fold},
    domain_event::{DomainEvent, Sequencing},
    error::{DomainError, DomainResult},
    eventing::EventChannel,
    persist::{Repository, Sequenced, SnapshotPolicy, SnapshotStrategy},
};
use std::collections::HashSet;
use std::marker::PhantomData;

/// 面向应用层的聚合根编排器。
///
/// - `A`：聚合类型（实现 `Aggregate`）
/// - `R`：实体仓储（实现 `Repository<A>`）
pub struct AggregateRoot<A, R>
where
    A: Aggregate,
    R: Repository<A>,
{
    repo: R,
    channel: EventChannel<A::Event>,
    snapshot_strategy: Option<SnapshotStrategy>,
    snapshot_policy: SnapshotPolicy,
    _marker: PhantomData<A>,
}

impl<A, R> AggregateRoot<A, R>
where
    A: Aggregate,
    R: Repository<A>,
{
    /// 创建编排器实例
    pub fn new(repo: R, channel: EventChannel<A::Event>) -> Self {
        Self {
            repo,
            channel,
            snapshot_strategy: None,
            snapshot_policy: SnapshotPolicy::Never,
            _marker: PhantomData,
        }
    }

    /// 启用自动快照；`Every(0)` 返回 `InvalidConfig`
    pub fn with_snapshots(
        mut self,
        strategy: SnapshotStrategy,
        policy: SnapshotPolicy,
    ) -> DomainResult<Self> {
        policy.validate()?;
        self.snapshot_strategy = Some(strategy);
        self.snapshot_policy = policy;
        Ok(self)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn channel(&self) -> &EventChannel<A::Event> {
        &self.channel
    }

    /// 执行聚合命令：
    /// 1. 加载实体，不存在则以版本 0 新建；
    /// 2. 执行命令得到新事件，并校验其可作为单个批次写入；
    /// 3. 在工作副本上折叠按版本排序的事件（失败时丢弃副本）；
    /// 4. 发布事件，由持久化策略写入存储；没有处理器收到事件时失败；
    /// 5. 版本变化且满足快照策略时写入快照；
    /// 6. 返回新状态。
    pub async fn execute(&self, entity_id: &A::Id, command: A::Command) -> Result<A, A::Error> {
        let mut entity = match self.repo.get_entity(entity_id, None).await? {
            Some(entity) => entity,
            None => A::new(entity_id.clone(), 0),
        };

        let events = entity.execute(command)?;
        if events.is_empty() {
            return Ok(entity);
        }
        check_batch(&entity_id.to_string(), &events)?;

        let before = entity.version();
        for event in events
            .iter()
            .filter(|e| e.sequencing() == Sequencing::Version)
        {
            fold(&mut entity, event)?;
        }

        if self.channel.publish(&events).await? == 0 {
            return Err(DomainError::InvalidState {
                reason: format!("no handler persisted events of {entity_id}"),
            }
            .into());
        }

        let version = entity.version();
        if version != before && self.snapshot_policy.should_snapshot(version) {
            if let Some(strategy) = &self.snapshot_strategy {
                strategy.take_snapshot(&entity).await?;
            }
        }

        tracing::debug!(
            entity_id = %entity_id,
            aggregate = A::TYPE,
            events = events.len(),
            version,
            "Executed command"
        );
        Ok(entity)
    }
}

/// 同一命令的事件：同一来源、同一种排序方式、位置互不相同
fn check_batch<E: DomainEvent>(entity_id: &str, events: &[E]) -> DomainResult<()> {
    if let Some(stray) = events.iter().find(|e| e.originator_id() != entity_id) {
        return Err(DomainError::invalid_batch(format!(
            "event {} belongs to {}, not {entity_id}",
            stray.topic(),
            stray.originator_id()
        )));
    }

    let sequencing = events[0].sequencing();
    if events.iter().any(|e| e.sequencing() != sequencing) {
        return Err(DomainError::invalid_batch(
            "command mixes version and timestamp sequenced events",
        ));
    }

    let mut positions = HashSet::with_capacity(events.len());
    if let Some(dup) = events.iter().find(|e| !positions.insert(e.position())) {
        return Err(DomainError::invalid_batch(format!(
            "duplicate position {} in {sequencing} sequenced events",
            dup.position()
        )));
    }
    Ok(())
}
