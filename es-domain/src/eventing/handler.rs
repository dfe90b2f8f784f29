//! 事件处理器（EventHandler）
//!
//! 定义消费某类/多类/全部事件的处理逻辑与元信息（名称、订阅主题）。
//!
use crate::domain_event::DomainEvent;
use crate::error::DomainResult as Result;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandledEventType {
    One(String),
    Many(Vec<String>),
    All,
}

impl HandledEventType {
    /// 是否处理该主题的事件
    pub fn handles(&self, topic: &str) -> bool {
        match self {
            HandledEventType::One(t) => t == topic,
            HandledEventType::Many(ts) => ts.iter().any(|t| t == topic),
            HandledEventType::All => true,
        }
    }
}

/// 事件处理器：同步接收一次发布中其关心的全部事件（保持发出顺序）
#[async_trait]
pub trait EventHandler<E>: Send + Sync
where
    E: DomainEvent,
{
    /// 处理器名称（用于日志与错误定位）
    fn handler_name(&self) -> &str;
    /// 返回该处理器关心的事件主题
    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::All
    }
    /// 处理事件
    async fn handle(&self, events: &[E]) -> Result<()>;
}

#[async_trait]
impl<E, T> EventHandler<E> for Arc<T>
where
    E: DomainEvent,
    T: EventHandler<E> + ?Sized,
{
    fn handler_name(&self) -> &str {
        (**self).handler_name()
    }

    fn handled_event_type(&self) -> HandledEventType {
        (**self).handled_event_type()
    }

    async fn handle(&self, events: &[E]) -> Result<()> {
        (**self).handle(events).await
    }
}
