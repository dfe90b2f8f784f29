//! 实体仓储
//!
//! 以实体 ID 为键的查询门面；每次查询都经由 `EventPlayer` 重放，不缓存实体。
//!
use crate::{
    aggregate::Aggregate,
    error::{DomainError, DomainResult as Result},
    persist::EventPlayer,
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Repository<A>: Send + Sync
where
    A: Aggregate,
{
    /// 实体在版本 `lte`（含）时的状态；没有符合条件的数据时返回 `None`
    async fn get_entity(&self, entity_id: &A::Id, lte: Option<usize>) -> Result<Option<A>>;

    /// 实体当前状态；从未写入时返回 `EntityNotFound`
    async fn get(&self, entity_id: &A::Id) -> Result<A> {
        self.get_entity(entity_id, None)
            .await?
            .ok_or_else(|| DomainError::EntityNotFound {
                entity_id: entity_id.to_string(),
            })
    }

    async fn contains(&self, entity_id: &A::Id) -> Result<bool> {
        Ok(self.get_entity(entity_id, None).await?.is_some())
    }
}

#[async_trait]
impl<A, T> Repository<A> for Arc<T>
where
    A: Aggregate,
    T: Repository<A> + ?Sized,
{
    async fn get_entity(&self, entity_id: &A::Id, lte: Option<usize>) -> Result<Option<A>> {
        (**self).get_entity(entity_id, lte).await
    }
}

/// 基于事件重放（及快照）的仓储实现
pub struct EventSourcedRepository<A: Aggregate> {
    event_player: EventPlayer<A>,
}

impl<A: Aggregate> EventSourcedRepository<A> {
    pub fn new(event_player: EventPlayer<A>) -> Self {
        Self { event_player }
    }

    pub fn event_player(&self) -> &EventPlayer<A> {
        &self.event_player
    }
}

#[async_trait]
impl<A> Repository<A> for EventSourcedRepository<A>
where
    A: Aggregate,
{
    async fn get_entity(&self, entity_id: &A::Id, lte: Option<usize>) -> Result<Option<A>> {
        self.event_player.replay_events(entity_id, lte).await
    }
}
