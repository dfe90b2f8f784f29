//! 发布/订阅通道（EventChannel）
//!
//! 每个应用显式持有的进程内通道：
//! - `subscribe` 返回 `Subscription`，显式 `unsubscribe` 或 drop 时退订；
//! - `publish` 按订阅顺序依次调用处理器，每个处理器只收到其关心主题的事件；
//!   任一处理器失败即中止，错误原样返回给发布方；
//! - 返回实际收到事件的处理器数量，0 表示事件无人处理。
//!
use crate::{
    domain_event::DomainEvent,
    error::DomainResult as Result,
    eventing::EventHandler,
};
use dashmap::DashMap;
use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

struct ChannelInner<E> {
    handlers: DashMap<u64, Arc<dyn EventHandler<E>>>,
    next_id: AtomicU64,
}

pub struct EventChannel<E> {
    inner: Arc<ChannelInner<E>>,
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: DomainEvent + 'static> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DomainEvent + 'static> EventChannel<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                handlers: DashMap::new(),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// 订阅事件；返回的 `Subscription` 被 drop 时自动退订
    pub fn subscribe(&self, handler: Arc<dyn EventHandler<E>>) -> Subscription<E> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(handler = handler.handler_name(), id, "Subscribed handler");
        self.inner.handlers.insert(id, handler);
        Subscription {
            channel: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.len()
    }

    /// 发布一批事件，返回收到事件的处理器数量
    pub async fn publish(&self, events: &[E]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        // 先取出处理器快照，避免在 await 期间持有 DashMap 的分片锁
        let mut handlers: Vec<(u64, Arc<dyn EventHandler<E>>)> = self
            .inner
            .handlers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        handlers.sort_by_key(|(id, _)| *id);

        let mut delivered = 0;
        for (_, handler) in handlers {
            let handled = handler.handled_event_type();
            let selected: Vec<E> = events
                .iter()
                .filter(|e| handled.handles(e.topic()))
                .cloned()
                .collect();
            if selected.is_empty() {
                continue;
            }

            handler.handle(&selected).await.inspect_err(|err| {
                tracing::warn!(
                    handler = handler.handler_name(),
                    error = %err,
                    "Event handler failed"
                );
            })?;
            delivered += 1;
        }

        if delivered == 0 {
            tracing::debug!(events = events.len(), "Published events had no handler");
        }
        Ok(delivered)
    }
}

/// 订阅凭证；drop 时退订
pub struct Subscription<E> {
    channel: Weak<ChannelInner<E>>,
    id: u64,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 显式退订（可重复调用）
    pub fn unsubscribe(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            if inner.handlers.remove(&self.id).is_some() {
                tracing::debug!(id = self.id, "Unsubscribed handler");
            }
        }
        self.channel = Weak::new();
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::eventing::HandledEventType;
    use crate::persist::Sequenced;
    use async_trait::async_trait;
    use chrono::Utc;
    use es_macros::domain_event;
    use std::sync::Mutex;

    #[domain_event]
    enum PingEvent {
        Pinged,
        Ponged,
    }

    fn ping(version: usize) -> PingEvent {
        PingEvent::Pinged {
            originator_id: "p-1".into(),
            originator_version: version,
            timestamp: Utc::now(),
        }
    }

    fn pong(version: usize) -> PingEvent {
        PingEvent::Ponged {
            originator_id: "p-1".into(),
            originator_version: version,
            timestamp: Utc::now(),
        }
    }

    struct Recorder {
        name: String,
        handled: HandledEventType,
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Recorder {
        fn new(name: &str, handled: HandledEventType) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                handled,
                seen: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventHandler<PingEvent> for Recorder {
        fn handler_name(&self) -> &str {
            &self.name
        }

        fn handled_event_type(&self) -> HandledEventType {
            self.handled.clone()
        }

        async fn handle(&self, events: &[PingEvent]) -> Result<()> {
            if self.fail {
                return Err(DomainError::InvalidState {
                    reason: "boom".into(),
                });
            }
            let mut seen = self.seen.lock().unwrap();
            seen.extend(events.iter().map(|e| format!("{}@{}", e.topic(), e.position())));
            Ok(())
        }
    }

    #[tokio::test]
    async fn publish_filters_by_topic_and_keeps_order() {
        let channel = EventChannel::<PingEvent>::new();
        let all = Recorder::new("all", HandledEventType::All);
        let pings = Recorder::new("pings", HandledEventType::One("PingEvent.Pinged".into()));
        let _s1 = channel.subscribe(all.clone());
        let _s2 = channel.subscribe(pings.clone());

        let delivered = channel.publish(&[ping(0), pong(1), ping(2)]).await.unwrap();
        assert_eq!(delivered, 2);

        assert_eq!(
            all.seen(),
            vec!["PingEvent.Pinged@0", "PingEvent.Ponged@1", "PingEvent.Pinged@2"]
        );
        assert_eq!(pings.seen(), vec!["PingEvent.Pinged@0", "PingEvent.Pinged@2"]);

        // 只有 "all" 关心 Ponged
        assert_eq!(channel.publish(&[pong(3)]).await.unwrap(), 1);
        assert_eq!(channel.publish(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let channel = EventChannel::<PingEvent>::new();
        let recorder = Recorder::new("r", HandledEventType::All);

        let mut sub = channel.subscribe(recorder.clone());
        assert_eq!(channel.subscriber_count(), 1);
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(channel.subscriber_count(), 0);

        {
            let _sub = channel.subscribe(recorder.clone());
            assert_eq!(channel.subscriber_count(), 1);
        }
        assert_eq!(channel.subscriber_count(), 0);

        assert_eq!(channel.publish(&[ping(0)]).await.unwrap(), 0);
        assert!(recorder.seen().is_empty());
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        let channel = EventChannel::<PingEvent>::new();
        let failing = Arc::new(Recorder {
            name: "failing".into(),
            handled: HandledEventType::All,
            seen: Mutex::new(Vec::new()),
            fail: true,
        });
        let _sub = channel.subscribe(failing);

        match channel.publish(&[ping(0)]).await.unwrap_err() {
            DomainError::InvalidState { reason } => assert_eq!(reason, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
