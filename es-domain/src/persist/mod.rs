//! 持久化与事件溯源（persist）
//!
//! 自底向上：
//! - 记录策略（`ActiveRecordStrategy`）：内存实现与 Postgres 实现（feature = "infra-sqlx"）；
//! - 序列项存储（`SequencedItemStore`）：编解码、可选加密（`Cipher`）、主题注册表、分页惰性读取；
//! - 快照（`Snapshot`/`SnapshotStrategy`/`SnapshotPolicy`）；
//! - 事件重放（`EventPlayer`）与实体仓储（`Repository`/`EventSourcedRepository`）。
//!
mod cipher;
mod event_player;
mod inmemory_record_strategy;
mod item_store;
#[cfg(feature = "infra-sqlx")]
mod postgres_record_strategy;
mod record_strategy;
mod repository;
mod sequenced_item;
mod snapshot;
mod topic_registry;

pub use cipher::{Cipher, XChaChaCipher};
pub use event_player::EventPlayer;
pub use inmemory_record_strategy::InMemoryRecordStrategy;
pub use item_store::{DEFAULT_PAGE_SIZE, SequencedItemStore, StoreConfig};
#[cfg(feature = "infra-sqlx")]
pub use postgres_record_strategy::PostgresRecordStrategy;
pub use record_strategy::{ActiveRecordStrategy, ItemRange};
pub use repository::{EventSourcedRepository, Repository};
pub use sequenced_item::{Sequenced, SequencedItem};
pub use snapshot::{Snapshot, SnapshotPolicy, SnapshotStrategy};
pub use topic_registry::TopicRegistry;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::entity::Entity;
    use crate::error::DomainError;
    use chrono::Utc;
    use es_macros::{domain_event, entity};
    use std::sync::Arc;

    #[entity]
    struct User {
        name: String,
    }

    #[domain_event]
    enum UserEvent {
        Registered { name: String },
        Renamed { name: String },
    }

    impl Aggregate for User {
        const TYPE: &'static str = "user";
        type Command = ();
        type Event = UserEvent;
        type Error = DomainError;
        fn execute(&self, _command: Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
            Ok(vec![])
        }
        fn apply(&mut self, event: &Self::Event) {
            match event {
                UserEvent::Registered { name, .. } | UserEvent::Renamed { name, .. } => {
                    self.name = name.clone();
                }
            }
        }
    }

    fn renamed(id: &str, version: usize, name: &str) -> UserEvent {
        if version == 0 {
            UserEvent::Registered {
                originator_id: id.to_string(),
                originator_version: 0,
                timestamp: Utc::now(),
                name: name.to_string(),
            }
        } else {
            UserEvent::Renamed {
                originator_id: id.to_string(),
                originator_version: version,
                timestamp: Utc::now(),
                name: name.to_string(),
            }
        }
    }

    struct Fixture {
        events: Arc<InMemoryRecordStrategy>,
        player: EventPlayer<User>,
    }

    fn fixture() -> Fixture {
        let events = Arc::new(InMemoryRecordStrategy::new());
        let event_store = SequencedItemStore::new(events.clone(), None, StoreConfig::default()).unwrap();
        let snapshot_store = SequencedItemStore::new(
            Arc::new(InMemoryRecordStrategy::new()),
            None,
            StoreConfig::default(),
        )
        .unwrap();
        let player = EventPlayer::new(
            Arc::new(event_store),
            Some(SnapshotStrategy::new(Arc::new(snapshot_store))),
        );
        Fixture { events, player }
    }

    #[tokio::test]
    async fn replay_is_bounded_by_version() {
        let fx = fixture();
        let id = "u-1".to_string();
        let history = [
            renamed(&id, 0, "alice"),
            renamed(&id, 1, "bob"),
            renamed(&id, 2, "carol"),
        ];
        fx.player.event_store().append(&history).await.unwrap();

        let latest = fx.player.replay_events(&id, None).await.unwrap().unwrap();
        assert_eq!(latest.version(), 3);
        assert_eq!(latest.name, "carol");

        for (lte, expected) in [(0, "alice"), (1, "bob"), (2, "carol")] {
            let at = fx.player.replay_events(&id, Some(lte)).await.unwrap().unwrap();
            assert_eq!(at.version(), lte + 1);
            assert_eq!(at.name, expected);
        }

        assert!(fx.player.replay_events(&"u-x".to_string(), None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshots_are_transparent_and_idempotent() {
        let fx = fixture();
        let id = "u-2".to_string();
        fx.player
            .event_store()
            .append(&[renamed(&id, 0, "alice"), renamed(&id, 1, "bob")])
            .await
            .unwrap();

        let first = fx.player.take_snapshot(&id, None).await.unwrap().unwrap();
        assert_eq!(first.entity_id(), "u-2");
        assert_eq!(first.entity_version(), 2);

        // 同一版本再次快照返回已有快照
        let second = fx.player.take_snapshot(&id, None).await.unwrap().unwrap();
        assert_eq!(first, second);

        let strategy = fx.player.snapshot_strategy().unwrap();
        assert_eq!(strategy.get_snapshot("u-2", None).await.unwrap(), Some(first.clone()));
        assert_eq!(strategy.get_snapshot("u-2", Some(1)).await.unwrap(), None);

        fx.player
            .event_store()
            .append(&[renamed(&id, 2, "carol")])
            .await
            .unwrap();

        let latest = fx.player.replay_events(&id, None).await.unwrap().unwrap();
        assert_eq!(latest.version(), 3);
        assert_eq!(latest.name, "carol");
        let at_one = fx.player.replay_events(&id, Some(1)).await.unwrap().unwrap();
        assert_eq!(at_one.name, "bob");
        let at_zero = fx.player.replay_events(&id, Some(0)).await.unwrap().unwrap();
        assert_eq!(at_zero.name, "alice");

        // 指定历史版本快照
        let historical = fx.player.take_snapshot(&id, Some(0)).await.unwrap().unwrap();
        assert_eq!(historical.entity_version(), 1);
        assert_eq!(fx.events.len().await, 3);
    }

    #[tokio::test]
    async fn snapshot_survives_event_deletion() {
        let fx = fixture();
        let id = "u-3".to_string();
        fx.player
            .event_store()
            .append(&[renamed(&id, 0, "alice"), renamed(&id, 1, "bob")])
            .await
            .unwrap();
        fx.player.take_snapshot(&id, None).await.unwrap();

        for record in fx.events.all_records().await.unwrap() {
            fx.events.delete(&record).await.unwrap();
        }

        let latest = fx.player.replay_events(&id, None).await.unwrap().unwrap();
        assert_eq!(latest.name, "bob");
        assert_eq!(latest.version(), 2);
        assert!(fx.player.replay_events(&id, Some(0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repository_get_and_contains() {
        let fx = fixture();
        let repo = EventSourcedRepository::new(fx.player.clone());
        let id = "u-4".to_string();

        assert!(!repo.contains(&id).await.unwrap());
        match repo.get(&id).await.unwrap_err() {
            DomainError::EntityNotFound { entity_id } => assert_eq!(entity_id, "u-4"),
            other => panic!("unexpected {other:?}"),
        }

        fx.player
            .event_store()
            .append(&[renamed(&id, 0, "alice")])
            .await
            .unwrap();
        assert!(repo.contains(&id).await.unwrap());
        assert_eq!(repo.get(&id).await.unwrap().name, "alice");
        assert!(repo.get_entity(&id, Some(0)).await.unwrap().is_some());
    }

    #[test]
    fn snapshot_type_check() {
        let u = User::new("u-1".to_string(), 4);
        let snap = Snapshot::from_entity(&u).unwrap();
        assert_eq!(snap.entity_id(), "u-1");
        assert_eq!(snap.topic(), User::TYPE);
        assert_eq!(snap.entity_version(), 4);
        // 版本只记录在快照上，不重复写入实体状态
        assert!(snap.state().get("version").is_none());

        let restored: User = snap.to_entity().unwrap();
        assert_eq!(restored.id(), u.id());
        assert_eq!(restored.version(), 4);

        #[entity]
        struct Order {}
        impl Aggregate for Order {
            const TYPE: &'static str = "order";
            type Command = ();
            type Event = UserEvent;
            type Error = DomainError;
            fn execute(&self, _c: Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
                Ok(vec![])
            }
            fn apply(&mut self, _e: &Self::Event) {}
        }

        match snap.to_entity::<Order>().unwrap_err() {
            DomainError::TopicMismatch { .. } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn snapshot_policy_should_snapshot() {
        assert!(!SnapshotPolicy::Never.should_snapshot(1));
        for v in 1..=9 {
            let should = SnapshotPolicy::Every(3).should_snapshot(v);
            assert_eq!(should, v % 3 == 0);
        }

        assert!(SnapshotPolicy::Every(1).validate().is_ok());
        assert!(SnapshotPolicy::Never.validate().is_ok());
        assert!(matches!(
            SnapshotPolicy::Every(0).validate(),
            Err(DomainError::InvalidConfig { .. })
        ));
        assert!(!SnapshotPolicy::Every(0).should_snapshot(1));
    }
}
