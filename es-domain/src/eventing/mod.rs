//! 事件子系统（eventing）
//!
//! - `EventChannel`：应用内显式注入的发布/订阅通道，订阅凭证 `Subscription` 在 drop 时退订；
//! - `EventHandler`：按主题过滤后接收一次发布中的事件；
//! - `PersistencePolicy`/`CombinedPersistencePolicy`：把发布的事件写入对应的序列项存储。
//!
pub mod channel;
pub mod handler;
pub mod persistence_policy;

pub use channel::{EventChannel, Subscription};
pub use handler::{EventHandler, HandledEventType};
pub use persistence_policy::{CombinedPersistencePolicy, PersistencePolicy};
