use anyhow::Result as AnyResult;
use chrono::Utc;
use es_domain::error::DomainError;
use es_domain::persist::{InMemoryRecordStrategy, SequencedItemStore, StoreConfig};
use es_macros::domain_event;
use std::sync::Arc;

#[domain_event]
enum TaskEvent {
    Claimed { worker: String },
}

fn claimed(id: &str, version: usize, worker: &str) -> TaskEvent {
    TaskEvent::Claimed {
        originator_id: id.to_string(),
        originator_version: version,
        timestamp: Utc::now(),
        worker: worker.to_string(),
    }
}

fn task_store() -> AnyResult<Arc<SequencedItemStore<TaskEvent>>> {
    let backend = Arc::new(InMemoryRecordStrategy::new());
    Ok(Arc::new(SequencedItemStore::new(
        backend,
        None,
        StoreConfig::default(),
    )?))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_racing_append_wins() -> AnyResult<()> {
    for _ in 0..20 {
        let store = task_store()?;
        let id = ulid::Ulid::new().to_string();

        let mut handles = Vec::new();
        for worker in 0..8 {
            let store = Arc::clone(&store);
            let event = claimed(&id, 0, &format!("w-{worker}"));
            handles.push(tokio::spawn(async move { store.append(&[event]).await }));
        }

        let mut won = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await? {
                Ok(()) => won += 1,
                Err(DomainError::ConcurrencyConflict { position, .. }) => {
                    assert_eq!(position, 0);
                    conflicts += 1;
                }
                Err(other) => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(store.list_items(&id, None, None).await?.len(), 1);
    }
    Ok(())
}

#[tokio::test]
async fn conflicting_batch_leaves_no_partial_write() -> AnyResult<()> {
    let store = task_store()?;
    store.append(&[claimed("t-1", 0, "a"), claimed("t-1", 1, "a")]).await?;

    // 批次中 2 为新位置、1 冲突：整批拒绝
    let err = store
        .append(&[claimed("t-1", 2, "b"), claimed("t-1", 1, "b")])
        .await
        .unwrap_err();
    assert!(err.is_concurrency_conflict());

    let items = store.list_items("t-1", None, None).await?;
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|e| matches!(e, TaskEvent::Claimed { worker, .. } if worker == "a")));
    Ok(())
}

#[tokio::test]
async fn sequences_are_independent() -> AnyResult<()> {
    let store = task_store()?;
    store.append(&[claimed("t-1", 0, "a")]).await?;
    store.append(&[claimed("t-2", 0, "b")]).await?;
    assert_eq!(store.list_items("t-1", None, None).await?.len(), 1);
    assert_eq!(store.list_items("t-2", None, None).await?.len(), 1);
    Ok(())
}
