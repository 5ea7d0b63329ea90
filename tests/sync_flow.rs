mod common;

use common::InMemoryRemote;
use delivery_sync::{
    DeliveryRecord, DeliverySyncService, MemoryCache, RecordId, RetryQueue,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const OWNER: &str = "dispatcher@mci.ph";
const BACKUP_KEY: &str = "mci-active-deliveries";

fn booking(dr: &str) -> DeliveryRecord {
    DeliveryRecord::from_local_value(json!({
        "drNumber": dr,
        "customerName": "Acme Hardware",
        "origin": "Manila",
        "destination": "Cebu",
        "truckType": "6-wheeler",
    }))
    .unwrap()
}

fn build_service(
    remote: Arc<InMemoryRemote>,
    cache: Arc<MemoryCache>,
) -> DeliverySyncService {
    DeliverySyncService::new(
        remote,
        cache,
        Arc::new(RetryQueue::new(3)),
        OWNER,
        BACKUP_KEY,
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn booking_to_completion_lifecycle() -> anyhow::Result<()> {
    let remote = Arc::new(InMemoryRemote::new());
    let cache = Arc::new(MemoryCache::new());
    let service = build_service(remote.clone(), cache);

    // Book two deliveries and load the view.
    let first = service.add(booking("DR001")).await?;
    service.add(booking("DR002")).await?;
    let buckets = service.load().await;
    assert_eq!(buckets.active.len(), 2);
    assert!(buckets.history.is_empty());

    // Complete one; it moves to history locally and remotely.
    let id = first.id.clone().expect("persisted id");
    let completed = service.update_status(&id, "Completed").await?;
    assert!(completed.completed_at.is_some());

    let buckets = service.buckets().await;
    assert_eq!(buckets.active.len(), 1);
    assert_eq!(buckets.history.len(), 1);

    // A fresh load from the remote derives the same split.
    let reloaded = service.load().await;
    assert_eq!(reloaded.active.len(), 1);
    assert_eq!(reloaded.history.len(), 1);
    Ok(())
}

#[tokio::test]
async fn offline_writes_replay_after_reconnect() -> anyhow::Result<()> {
    let remote = Arc::new(InMemoryRemote::new());
    let cache = Arc::new(MemoryCache::new());
    let service = build_service(remote.clone(), cache);

    // Seed one delivery while online, then lose connectivity.
    service.add(booking("DR001")).await?;
    remote.set_offline(true);

    // The booking made offline fails loudly but stays visible and queued.
    let err = service.add(booking("DR002")).await.unwrap_err();
    assert!(err.is_connectivity());
    assert_eq!(service.buckets().await.active.len(), 2);
    assert_eq!(service.pending_writes().await, 1);
    assert_eq!(remote.delivery_count(), 1);

    // Reconnect and drain: the queued insert lands remotely.
    remote.set_offline(false);
    let outcome = service.drain_pending().await;
    assert_eq!(outcome.replayed, 1);
    assert_eq!(outcome.remaining, 0);
    assert_eq!(remote.delivery_count(), 2);

    // A reload now shows both rows with server-assigned ids.
    let buckets = service.load().await;
    assert_eq!(buckets.active.len(), 2);
    Ok(())
}

#[tokio::test]
async fn outage_after_a_successful_load_serves_the_backup() -> anyhow::Result<()> {
    let remote = Arc::new(InMemoryRemote::new());
    let cache = Arc::new(MemoryCache::new());

    // First service session loads and backs up the active set.
    let service = build_service(remote.clone(), cache.clone());
    service.add(booking("DR001")).await?;
    service.add(booking("DR002")).await?;
    service.load().await;

    // A new session during an outage restores the active set from backup.
    remote.set_offline(true);
    let next_session = build_service(remote, cache);
    let buckets = next_session.load().await;
    assert_eq!(buckets.active.len(), 2);
    assert!(buckets.history.is_empty());

    let drs: Vec<&str> = buckets
        .active
        .iter()
        .map(|record| record.dr_number.as_str())
        .collect();
    assert!(drs.contains(&"DR001"));
    assert!(drs.contains(&"DR002"));
    Ok(())
}

#[tokio::test]
async fn batch_upload_with_a_bad_row_reports_and_continues() -> anyhow::Result<()> {
    let remote = Arc::new(InMemoryRemote::new());
    let service = build_service(remote.clone(), Arc::new(MemoryCache::new()));

    let rows = vec![
        booking("DR001").to_local_map(),
        // Missing destination: rejected per-row, not fatal to the batch.
        DeliveryRecord::from_local_value(json!({
            "drNumber": "DR002",
            "customerName": "Acme Hardware",
            "origin": "Manila",
        }))?
        .to_local_map(),
        booking("DR003").to_local_map(),
    ];

    let report = service.import_many(rows).await;
    assert_eq!(report.success, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].record, "DR002");
    assert_eq!(remote.delivery_count(), 2);

    // The failed row never reached the view either.
    let loaded = service.load().await;
    assert_eq!(loaded.active.len(), 2);
    Ok(())
}

#[tokio::test]
async fn uploaded_duplicate_dr_is_disambiguated_not_overwritten() -> anyhow::Result<()> {
    let remote = Arc::new(InMemoryRemote::new());
    let service = build_service(remote, Arc::new(MemoryCache::new()));

    let original = service.add(booking("DR001")).await?;
    let duplicate = service.add(booking("DR001")).await?;

    assert_eq!(original.dr_number, "DR001");
    assert_ne!(duplicate.dr_number, "DR001");
    assert!(duplicate.dr_number.starts_with("DR001-"));

    // Both records are loadable and distinct.
    let buckets = service.load().await;
    assert_eq!(buckets.active.len(), 2);

    let original_id = original.id.expect("persisted id");
    let duplicate_id = duplicate.id.expect("persisted id");
    assert_ne!(
        RecordId::to_value(&original_id),
        RecordId::to_value(&duplicate_id)
    );
    Ok(())
}
