//! 持久化策略（PersistencePolicy）
//!
//! 订阅通道，把发布的事件按排序方式路由到对应的序列项存储：
//! 按版本排序的事件写入整数序列存储，按时间排序的事件写入时间序列存储。
//! 同一实体的事件按发出顺序作为一个批次追加；并发冲突直接返回，不重试。
//!
use crate::{
    domain_event::{DomainEvent, Sequencing},
    error::DomainResult as Result,
    eventing::{EventChannel, EventHandler, HandledEventType, Subscription},
    persist::SequencedItemStore,
};
use async_trait::async_trait;
use std::sync::Arc;

struct StoreAppender<E> {
    name: String,
    store: Arc<SequencedItemStore<E>>,
    sequencing: Sequencing,
}

#[async_trait]
impl<E> EventHandler<E> for StoreAppender<E>
where
    E: DomainEvent + 'static,
{
    fn handler_name(&self) -> &str {
        &self.name
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::All
    }

    async fn handle(&self, events: &[E]) -> Result<()> {
        let mut batches: Vec<Vec<E>> = Vec::new();
        for event in events.iter().filter(|e| e.sequencing() == self.sequencing) {
            let existing = batches
                .iter_mut()
                .find(|batch| batch[0].originator_id() == event.originator_id());
            match existing {
                Some(batch) => batch.push(event.clone()),
                None => batches.push(vec![event.clone()]),
            }
        }

        for batch in batches {
            self.store.append(&batch).await?;
        }
        Ok(())
    }
}

/// 单一存储的持久化策略；`close` 或 drop 时退订
pub struct PersistencePolicy<E: DomainEvent + 'static> {
    store: Arc<SequencedItemStore<E>>,
    sequencing: Sequencing,
    subscription: Option<Subscription<E>>,
}

impl<E: DomainEvent + 'static> PersistencePolicy<E> {
    pub fn new(
        channel: &EventChannel<E>,
        store: Arc<SequencedItemStore<E>>,
        sequencing: Sequencing,
    ) -> Self {
        let appender = StoreAppender {
            name: format!("persistence-policy:{sequencing}"),
            store: Arc::clone(&store),
            sequencing,
        };
        let subscription = channel.subscribe(Arc::new(appender));
        Self {
            store,
            sequencing,
            subscription: Some(subscription),
        }
    }

    pub fn store(&self) -> &Arc<SequencedItemStore<E>> {
        &self.store
    }

    pub fn sequencing(&self) -> Sequencing {
        self.sequencing
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

/// 组合策略：同时持有整数序列与时间序列两个订阅
pub struct CombinedPersistencePolicy<E: DomainEvent + 'static> {
    version_policy: PersistencePolicy<E>,
    timestamp_policy: PersistencePolicy<E>,
}

impl<E: DomainEvent + 'static> CombinedPersistencePolicy<E> {
    pub fn new(
        channel: &EventChannel<E>,
        version_store: Arc<SequencedItemStore<E>>,
        timestamp_store: Arc<SequencedItemStore<E>>,
    ) -> Self {
        Self {
            version_policy: PersistencePolicy::new(channel, version_store, Sequencing::Version),
            timestamp_policy: PersistencePolicy::new(
                channel,
                timestamp_store,
                Sequencing::Timestamp,
            ),
        }
    }

    pub fn version_policy(&self) -> &PersistencePolicy<E> {
        &self.version_policy
    }

    pub fn timestamp_policy(&self) -> &PersistencePolicy<E> {
        &self.timestamp_policy
    }

    pub fn is_active(&self) -> bool {
        self.version_policy.is_active() || self.timestamp_policy.is_active()
    }

    pub fn close(&mut self) {
        self.version_policy.close();
        self.timestamp_policy.close();
    }
}
