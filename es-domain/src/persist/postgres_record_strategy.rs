//! Postgres 记录策略（feature = "infra-sqlx"）
//!
//! 每个记录表以 `(sequence_id, position)` 为主键，整批记录在一个事务内通过 UNNEST 写入；
//! 主键冲突映射为 `ConcurrencyConflict`。
//!
use crate::{
    error::{DomainError, DomainResult as Result},
    persist::{ActiveRecordStrategy, ItemRange, SequencedItem},
};
use async_trait::async_trait;
use sqlx::PgPool;

type RecordRow = (String, i64, String, Vec<u8>);

pub struct PostgresRecordStrategy {
    pool: PgPool,
    table: String,
}

impl PostgresRecordStrategy {
    /// 绑定连接池与表名；表名仅允许字母、数字与下划线
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// 建表（幂等）
    pub async fn create_table(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                sequence_id TEXT NOT NULL,
                position BIGINT NOT NULL,
                topic TEXT NOT NULL,
                state BYTEA NOT NULL,
                PRIMARY KEY (sequence_id, position)
            )",
            self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        tracing::debug!(table = %self.table, "Ensured record table");
        Ok(())
    }

    fn to_db_position(position: u64) -> Result<i64> {
        i64::try_from(position).map_err(|_| DomainError::InvalidBatch {
            reason: format!("position {position} exceeds BIGINT range"),
        })
    }

    fn from_row(row: RecordRow) -> Result<SequencedItem> {
        let (sequence_id, position, topic, state) = row;
        let position = u64::try_from(position)
            .map_err(|_| DomainError::backend(format!("negative position {position}")))?;
        Ok(SequencedItem::builder()
            .sequence_id(sequence_id)
            .position(position)
            .topic(topic)
            .state(state)
            .build())
    }
}

fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(DomainError::InvalidConfig {
            reason: format!("invalid table name: {table}"),
        });
    }
    Ok(())
}

#[async_trait]
impl ActiveRecordStrategy for PostgresRecordStrategy {
    async fn insert(&self, items: &[SequencedItem]) -> Result<()> {
        let Some(first) = items.first() else {
            return Ok(());
        };

        let len = items.len();
        let mut sequence_ids = Vec::with_capacity(len);
        let mut positions = Vec::with_capacity(len);
        let mut topics = Vec::with_capacity(len);
        let mut states = Vec::with_capacity(len);
        for item in items {
            sequence_ids.push(item.sequence_id().to_string());
            positions.push(Self::to_db_position(item.position())?);
            topics.push(item.topic().to_string());
            states.push(item.state().to_vec());
        }

        let sql = format!(
            "INSERT INTO {} (sequence_id, position, topic, state)
             SELECT * FROM UNNEST($1::TEXT[], $2::BIGINT[], $3::TEXT[], $4::BYTEA[])",
            self.table
        );

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(&sql)
            .bind(&sequence_ids)
            .bind(&positions)
            .bind(&topics)
            .bind(&states)
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(DomainError::ConcurrencyConflict {
                    sequence_id: first.sequence_id().to_string(),
                    position: first.position(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;
        Ok(())
    }

    async fn select_range(
        &self,
        sequence_id: &str,
        range: &ItemRange,
    ) -> Result<Vec<SequencedItem>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let order = if range.descending { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT sequence_id, position, topic, state FROM {}
             WHERE sequence_id = $1
               AND ($2::BIGINT IS NULL OR position > $2)
               AND ($3::BIGINT IS NULL OR position <= $3)
             ORDER BY position {order}
             LIMIT $4",
            self.table
        );

        let gt = range.gt.map(Self::to_db_position).transpose()?;
        let lte = range.lte.map(Self::to_db_position).transpose()?;
        let limit = range.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(sequence_id)
            .bind(gt)
            .bind(lte)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::from_row).collect()
    }

    async fn delete(&self, item: &SequencedItem) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE sequence_id = $1 AND position = $2",
            self.table
        );
        sqlx::query(&sql)
            .bind(item.sequence_id())
            .bind(Self::to_db_position(item.position())?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn all_records(&self) -> Result<Vec<SequencedItem>> {
        let sql = format!(
            "SELECT sequence_id, position, topic, state FROM {} ORDER BY sequence_id, position",
            self.table
        );
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::from_row).collect()
    }
}
