//! 示例应用装配（ExampleApplication）
//!
//! - 整数序列存储：`Example` 的创建与属性修改事件；
//! - 时间序列存储：备注事件；
//! - 快照存储：`Example` 快照；
//! - 组合持久化策略订阅通道，`close()`（或 drop）时退订。
//!
use crate::{
    config::AppConfig,
    error::AppError,
    example::{Example, ExampleAttribute, ExampleCommand, ExampleEvent},
};
use es_domain::{
    aggregate_root::AggregateRoot,
    eventing::{CombinedPersistencePolicy, EventChannel},
    persist::{
        ActiveRecordStrategy, Cipher, EventPlayer, EventSourcedRepository, InMemoryRecordStrategy,
        Repository, SequencedItemStore, Snapshot, SnapshotStrategy, XChaChaCipher,
    },
};
use std::sync::Arc;
use uuid::Uuid;

type ExampleRepository = EventSourcedRepository<Example>;

pub struct ExampleApplication {
    config: AppConfig,
    integer_sequenced_records: Arc<dyn ActiveRecordStrategy>,
    timestamp_sequenced_records: Arc<dyn ActiveRecordStrategy>,
    snapshot_records: Arc<dyn ActiveRecordStrategy>,
    integer_sequenced_store: Arc<SequencedItemStore<ExampleEvent>>,
    timestamp_sequenced_store: Arc<SequencedItemStore<ExampleEvent>>,
    repository: Arc<ExampleRepository>,
    root: AggregateRoot<Example, Arc<ExampleRepository>>,
    persistence_policy: CombinedPersistencePolicy<ExampleEvent>,
}

impl ExampleApplication {
    /// 使用内存记录策略构建应用
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        Self::with_record_strategies(
            config,
            Arc::new(InMemoryRecordStrategy::new()),
            Arc::new(InMemoryRecordStrategy::new()),
            Arc::new(InMemoryRecordStrategy::new()),
        )
    }

    /// 使用给定的三个记录策略构建应用
    pub fn with_record_strategies(
        config: AppConfig,
        integer_sequenced_records: Arc<dyn ActiveRecordStrategy>,
        timestamp_sequenced_records: Arc<dyn ActiveRecordStrategy>,
        snapshot_records: Arc<dyn ActiveRecordStrategy>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let cipher: Option<Arc<dyn Cipher>> = config
            .cipher_key()
            .map(|key| Arc::new(XChaChaCipher::new(key)) as Arc<dyn Cipher>);
        let store_config = config.store_config();

        let integer_sequenced_store = Arc::new(SequencedItemStore::new(
            Arc::clone(&integer_sequenced_records),
            cipher.clone(),
            store_config,
        )?);
        let timestamp_sequenced_store = Arc::new(SequencedItemStore::new(
            Arc::clone(&timestamp_sequenced_records),
            cipher.clone(),
            store_config,
        )?);
        let snapshot_strategy = SnapshotStrategy::new(Arc::new(SequencedItemStore::<Snapshot>::new(
            Arc::clone(&snapshot_records),
            cipher,
            store_config,
        )?));

        let channel = EventChannel::new();
        let persistence_policy = CombinedPersistencePolicy::new(
            &channel,
            Arc::clone(&integer_sequenced_store),
            Arc::clone(&timestamp_sequenced_store),
        );

        let repository = Arc::new(EventSourcedRepository::new(EventPlayer::new(
            Arc::clone(&integer_sequenced_store),
            Some(snapshot_strategy.clone()),
        )));
        let root = AggregateRoot::new(Arc::clone(&repository), channel)
            .with_snapshots(snapshot_strategy, config.snapshot_policy())?;

        tracing::debug!(?config, "Constructed example application");
        Ok(Self {
            config,
            integer_sequenced_records,
            timestamp_sequenced_records,
            snapshot_records,
            integer_sequenced_store,
            timestamp_sequenced_store,
            repository,
            root,
            persistence_policy,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn integer_sequenced_records(&self) -> &Arc<dyn ActiveRecordStrategy> {
        &self.integer_sequenced_records
    }

    pub fn timestamp_sequenced_records(&self) -> &Arc<dyn ActiveRecordStrategy> {
        &self.timestamp_sequenced_records
    }

    pub fn snapshot_records(&self) -> &Arc<dyn ActiveRecordStrategy> {
        &self.snapshot_records
    }

    pub fn integer_sequenced_store(&self) -> &Arc<SequencedItemStore<ExampleEvent>> {
        &self.integer_sequenced_store
    }

    pub fn timestamp_sequenced_store(&self) -> &Arc<SequencedItemStore<ExampleEvent>> {
        &self.timestamp_sequenced_store
    }

    pub fn persistence_policy(&self) -> &CombinedPersistencePolicy<ExampleEvent> {
        &self.persistence_policy
    }

    pub fn example_repository(&self) -> &ExampleRepository {
        &self.repository
    }

    pub fn is_closed(&self) -> bool {
        !self.persistence_policy.is_active()
    }

    /// 退订持久化策略；之后的命令返回 `AppError::Closed`
    pub fn close(&mut self) {
        if !self.is_closed() {
            self.persistence_policy.close();
            tracing::debug!("Closed example application");
        }
    }

    async fn execute(&self, id: &Uuid, command: ExampleCommand) -> Result<Example, AppError> {
        if self.is_closed() {
            return Err(AppError::Closed);
        }
        self.root.execute(id, command).await
    }

    pub async fn create_new_example(&self, a: i64, b: i64) -> Result<Example, AppError> {
        self.execute(&Uuid::new_v4(), ExampleCommand::Create { a, b })
            .await
    }

    pub async fn set_a(&self, id: &Uuid, value: i64) -> Result<Example, AppError> {
        self.execute(
            id,
            ExampleCommand::Set {
                attribute: ExampleAttribute::A,
                value,
            },
        )
        .await
    }

    pub async fn set_b(&self, id: &Uuid, value: i64) -> Result<Example, AppError> {
        self.execute(
            id,
            ExampleCommand::Set {
                attribute: ExampleAttribute::B,
                value,
            },
        )
        .await
    }

    pub async fn add_note(&self, id: &Uuid, text: impl Into<String>) -> Result<(), AppError> {
        self.execute(id, ExampleCommand::AddNote { text: text.into() })
            .await?;
        Ok(())
    }

    /// 按时间顺序读取实体的备注
    pub async fn notes(&self, id: &Uuid) -> Result<Vec<String>, AppError> {
        let events = self
            .timestamp_sequenced_store
            .list_items(&id.to_string(), None, None)
            .await?;
        Ok(events
            .into_iter()
            .filter_map(|event| match event {
                ExampleEvent::Noted { text, .. } => Some(text),
                _ => None,
            })
            .collect())
    }

    pub async fn get_example(&self, id: &Uuid) -> Result<Example, AppError> {
        match self.repository.get_entity(id, None).await? {
            Some(example) => Ok(example),
            None => Err(AppError::NotFound(id.to_string())),
        }
    }

    /// 为实体最新状态写入快照
    pub async fn take_snapshot(&self, id: &Uuid) -> Result<Option<Snapshot>, AppError> {
        Ok(self
            .repository
            .event_player()
            .take_snapshot(id, None)
            .await?)
    }
}
