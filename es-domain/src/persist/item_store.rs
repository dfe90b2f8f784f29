//! 序列项存储（SequencedItemStore）
//!
//! 负责对象与 `SequencedItem` 之间的编解码（JSON + 可选加密），并在记录策略之上提供：
//! - `append`：同一序列的一批对象原子写入，冲突由后端唯一约束检测；
//! - `get_items`：按 `gt < position <= lte` 升序分页读取的惰性流，每次调用重新查询；
//! - `get_most_recent`：区间内位置最大的对象。
//!
use crate::{
    error::{DomainError, DomainResult as Result},
    persist::{ActiveRecordStrategy, Cipher, ItemRange, Sequenced, SequencedItem, TopicRegistry},
};
use bon::Builder;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::{marker::PhantomData, sync::Arc};

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct StoreConfig {
    /// 写入前加密载荷、读取后解密（需要提供 cipher）
    #[builder(default)]
    pub always_encrypt: bool,
    /// `get_items` 单次查询的记录数上限
    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            always_encrypt: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StoreConfig {
    fn validate(&self, has_cipher: bool) -> Result<()> {
        if self.page_size == 0 {
            return Err(DomainError::InvalidConfig {
                reason: "page_size must be >= 1".into(),
            });
        }
        if self.always_encrypt && !has_cipher {
            return Err(DomainError::InvalidConfig {
                reason: "always_encrypt requires a cipher".into(),
            });
        }
        Ok(())
    }
}

struct ItemCodec<T> {
    cipher: Option<Arc<dyn Cipher>>,
    topics: TopicRegistry,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Sequenced> ItemCodec<T> {
    fn encode(&self, obj: &T) -> Result<SequencedItem> {
        let plaintext = serde_json::to_vec(obj)?;
        let state = match &self.cipher {
            Some(cipher) => cipher.encrypt(&plaintext)?,
            None => plaintext,
        };
        Ok(SequencedItem::builder()
            .sequence_id(obj.sequence_id())
            .position(obj.position())
            .topic(obj.topic())
            .state(state)
            .build())
    }

    fn decode(&self, item: &SequencedItem) -> Result<T> {
        self.topics.resolve(item.topic())?;
        let obj: T = match &self.cipher {
            Some(cipher) => serde_json::from_slice(&cipher.decrypt(item.state())?)?,
            None => serde_json::from_slice(item.state())?,
        };
        if obj.topic() != item.topic() {
            return Err(DomainError::TopicMismatch {
                expected: item.topic().to_string(),
                found: obj.topic().to_string(),
            });
        }
        if obj.sequence_id() != item.sequence_id() || obj.position() != item.position() {
            return Err(DomainError::InvalidState {
                reason: format!(
                    "record {}@{} holds {}@{}",
                    item.sequence_id(),
                    item.position(),
                    obj.sequence_id(),
                    obj.position()
                ),
            });
        }
        Ok(obj)
    }

    fn decode_page(&self, items: &[SequencedItem]) -> Result<Vec<T>> {
        items
            .iter()
            .map(|item| {
                self.decode(item).inspect_err(|err| {
                    tracing::warn!(
                        sequence_id = item.sequence_id(),
                        position = item.position(),
                        topic = item.topic(),
                        error = %err,
                        "Failed to decode sequenced item"
                    );
                })
            })
            .collect()
    }
}

pub struct SequencedItemStore<T> {
    record_strategy: Arc<dyn ActiveRecordStrategy>,
    codec: Arc<ItemCodec<T>>,
    config: StoreConfig,
}

impl<T> Clone for SequencedItemStore<T> {
    fn clone(&self) -> Self {
        Self {
            record_strategy: Arc::clone(&self.record_strategy),
            codec: Arc::clone(&self.codec),
            config: self.config,
        }
    }
}

struct PageCursor<T> {
    record_strategy: Arc<dyn ActiveRecordStrategy>,
    codec: Arc<ItemCodec<T>>,
    sequence_id: String,
    gt: Option<u64>,
    lte: Option<u64>,
    page_size: usize,
    exhausted: bool,
}

impl<T: Sequenced> PageCursor<T> {
    async fn next_page(mut self) -> Result<Option<(Vec<T>, Self)>> {
        if self.exhausted {
            return Ok(None);
        }
        let range = ItemRange::builder()
            .maybe_gt(self.gt)
            .maybe_lte(self.lte)
            .limit(self.page_size)
            .build();
        let items = self
            .record_strategy
            .select_range(&self.sequence_id, &range)
            .await?;
        let Some(last) = items.last() else {
            return Ok(None);
        };

        self.gt = Some(last.position());
        self.exhausted = items.len() < self.page_size;
        let page = self.codec.decode_page(&items)?;
        Ok(Some((page, self)))
    }
}

impl<T> SequencedItemStore<T>
where
    T: Sequenced + 'static,
{
    /// 构建存储：校验配置并由 `T::known_topics()` 构建主题注册表
    pub fn new(
        record_strategy: Arc<dyn ActiveRecordStrategy>,
        cipher: Option<Arc<dyn Cipher>>,
        config: StoreConfig,
    ) -> Result<Self> {
        config.validate(cipher.is_some())?;
        let topics = TopicRegistry::from_known(T::known_topics())?;
        let cipher = if config.always_encrypt { cipher } else { None };

        Ok(Self {
            record_strategy,
            codec: Arc::new(ItemCodec {
                cipher,
                topics,
                _marker: PhantomData,
            }),
            config,
        })
    }

    pub fn record_strategy(&self) -> &Arc<dyn ActiveRecordStrategy> {
        &self.record_strategy
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// 将同一序列的一批对象原子写入；任一位置已存在则整批失败（`ConcurrencyConflict`）
    pub async fn append(&self, objs: &[T]) -> Result<()> {
        let Some(first) = objs.first() else {
            return Ok(());
        };
        let sequence_id = first.sequence_id();
        if let Some(other) = objs.iter().find(|o| o.sequence_id() != sequence_id) {
            return Err(DomainError::InvalidBatch {
                reason: format!(
                    "mixed sequence ids in one batch: {sequence_id} and {}",
                    other.sequence_id()
                ),
            });
        }

        // 编码与加密在写入前全部完成
        let items = objs
            .iter()
            .map(|obj| self.codec.encode(obj))
            .collect::<Result<Vec<_>>>()?;

        match self.record_strategy.insert(&items).await {
            Ok(()) => {
                tracing::debug!(
                    sequence_id,
                    count = items.len(),
                    first_position = first.position(),
                    "Appended sequenced items"
                );
                Ok(())
            }
            Err(err) => {
                if err.is_concurrency_conflict() {
                    tracing::warn!(sequence_id, error = %err, "Append rejected by concurrency check");
                }
                Err(err)
            }
        }
    }

    /// 惰性读取 `gt < position <= lte` 的对象（升序），按 `page_size` 分页查询后端
    pub fn get_items(
        &self,
        sequence_id: &str,
        gt: Option<u64>,
        lte: Option<u64>,
    ) -> BoxStream<'static, Result<T>> {
        let cursor = PageCursor {
            record_strategy: Arc::clone(&self.record_strategy),
            codec: Arc::clone(&self.codec),
            sequence_id: sequence_id.to_string(),
            gt,
            lte,
            page_size: self.config.page_size,
            exhausted: false,
        };

        stream::try_unfold(cursor, PageCursor::next_page)
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<T, DomainError>)))
            .try_flatten()
            .boxed()
    }

    /// 收集 `get_items` 的全部结果
    pub async fn list_items(
        &self,
        sequence_id: &str,
        gt: Option<u64>,
        lte: Option<u64>,
    ) -> Result<Vec<T>> {
        self.get_items(sequence_id, gt, lte).try_collect().await
    }

    /// 位置 `<= lte` 的最新对象
    pub async fn get_most_recent(&self, sequence_id: &str, lte: Option<u64>) -> Result<Option<T>> {
        let range = ItemRange::builder()
            .maybe_lte(lte)
            .limit(1)
            .descending(true)
            .build();
        let items = self
            .record_strategy
            .select_range(sequence_id, &range)
            .await?;
        match items.first() {
            Some(item) => self.codec.decode(item).map(Some),
            None => Ok(None),
        }
    }
}
