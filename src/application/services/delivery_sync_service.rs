use crate::application::ports::{LocalCache, RemoteRow, RemoteStore};
use crate::application::services::retry_queue::{DrainOutcome, RetryQueue};
use crate::application::shared::mappers::delivery_mapper;
use crate::domain::entities::{
    DeliveryRecord, ImportReport, OperationKind, PendingOperation, TargetTable,
};
use crate::domain::partition::{partition, DeliveryBuckets};
use crate::domain::value_objects::{Bucket, DrNumber, RecordId};
use crate::shared::error::{AppError, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A change event pushed from the remote store (realtime channel). The row
/// arrives in remote shape and runs through the same normalize and
/// partition path as a full load.
#[derive(Debug, Clone)]
pub struct RemoteChange {
    pub kind: OperationKind,
    pub row: RemoteRow,
}

/// The synchronization orchestrator: the one entry point between the UI and
/// the two data sources.
///
/// Owns the active/history view (no ambient globals), loads remote-first
/// with a cache fallback, mirrors every write into memory, and queues writes
/// for replay when the remote is unreachable.
pub struct DeliverySyncService {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    queue: Arc<RetryQueue>,
    state: Arc<RwLock<DeliveryBuckets>>,
    load_in_progress: Arc<RwLock<bool>>,
    import_in_progress: Arc<RwLock<bool>>,
    owner: String,
    backup_key: String,
    request_timeout: Duration,
}

impl DeliverySyncService {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn LocalCache>,
        queue: Arc<RetryQueue>,
        owner: impl Into<String>,
        backup_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            cache,
            queue,
            state: Arc::new(RwLock::new(DeliveryBuckets::default())),
            load_in_progress: Arc::new(RwLock::new(false)),
            import_in_progress: Arc::new(RwLock::new(false)),
            owner: owner.into(),
            backup_key: backup_key.into(),
            request_timeout,
        }
    }

    /// Current in-memory view, cloned for rendering.
    pub async fn buckets(&self) -> DeliveryBuckets {
        self.state.read().await.clone()
    }

    pub async fn pending_writes(&self) -> usize {
        self.queue.len().await
    }

    /// Loads the delivery view: remote first, local backup on failure.
    ///
    /// Never returns an error: a remote outage degrades to the cached
    /// active set (history reconstructs as empty in that path), and an empty
    /// cache degrades to an empty view. Only one load runs at a time; a
    /// re-entrant call returns the current view untouched.
    pub async fn load(&self) -> DeliveryBuckets {
        {
            let mut in_progress = self.load_in_progress.write().await;
            if *in_progress {
                debug!("Load already in flight; returning current view");
                return self.state.read().await.clone();
            }
            *in_progress = true;
        }

        let buckets = self.load_inner().await;
        *self.state.write().await = buckets.clone();
        *self.load_in_progress.write().await = false;
        buckets
    }

    async fn load_inner(&self) -> DeliveryBuckets {
        match self
            .remote_call(self.remote.fetch_deliveries(&self.owner))
            .await
        {
            Ok(rows) => {
                let records = rows
                    .iter()
                    .filter_map(|row| {
                        let local = delivery_mapper::to_local_shape(row);
                        match DeliveryRecord::from_local_value(Value::Object(local)) {
                            Ok(record) => Some(record),
                            Err(err) => {
                                warn!("Skipping unreadable delivery row: {err}");
                                None
                            }
                        }
                    })
                    .collect::<Vec<_>>();

                let buckets = partition(records);
                info!(
                    "Loaded {} active and {} completed deliveries",
                    buckets.active.len(),
                    buckets.history.len()
                );
                self.backup_active(&buckets.active).await;
                buckets
            }
            Err(err) => {
                warn!("Remote load failed, falling back to local backup: {err}");
                self.load_from_backup().await
            }
        }
    }

    async fn load_from_backup(&self) -> DeliveryBuckets {
        match self.cache.get(&self.backup_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<DeliveryRecord>>(&raw) {
                Ok(records) if !records.is_empty() => {
                    info!("Restored {} deliveries from local backup", records.len());
                    DeliveryBuckets {
                        active: records,
                        history: Vec::new(),
                    }
                }
                Ok(_) => DeliveryBuckets::default(),
                Err(err) => {
                    warn!("Local backup is unreadable: {err}");
                    DeliveryBuckets::default()
                }
            },
            Ok(None) => DeliveryBuckets::default(),
            Err(err) => {
                warn!("Local backup read failed: {err}");
                DeliveryBuckets::default()
            }
        }
    }

    /// Persists a delivery. The DR number is disambiguated rather than ever
    /// overwriting an existing record with the same business key: a known
    /// collision gets a time suffix before insert, and a race that slips
    /// past the pre-check is retried exactly once with a fresh suffix.
    ///
    /// On a connectivity failure the write is queued for replay, an
    /// optimistic copy stays in the active set, and the error is re-raised
    /// so the caller can notify the user.
    pub async fn add(&self, record: DeliveryRecord) -> Result<DeliveryRecord> {
        let now = Utc::now();
        let mut record = record;
        if record.dr_number.trim().is_empty() {
            record.dr_number = DrNumber::generate(now).to_string();
        }
        if record.created_at.is_none() {
            record.created_at = Some(now);
        }
        record.validate_for_insert()?;

        let original_dr = DrNumber::new(record.dr_number.clone())
            .map_err(AppError::MalformedInput)?;

        match self
            .remote_call(self.remote.dr_number_exists(&self.owner, original_dr.as_str()))
            .await
        {
            Ok(true) => {
                record.dr_number = original_dr.with_unique_suffix(now).to_string();
                warn!("DR conflict detected, using unique DR: {}", record.dr_number);
            }
            Ok(false) => {}
            // The insert below will hit the same failure and take the
            // offline path, so the pre-check result is moot here.
            Err(err) => debug!("DR pre-check unavailable: {err}"),
        }

        let mut row = delivery_mapper::to_remote_shape(&record.to_local_map());
        row.insert("user_id".to_string(), Value::from(self.owner.clone()));

        match self
            .remote_call(self.remote.insert(TargetTable::Deliveries, row.clone()))
            .await
        {
            Ok(stored) => self.install_stored(stored).await,
            Err(AppError::UniquenessConflict(_)) => {
                let retried = original_dr.with_unique_suffix(Utc::now());
                warn!("Retrying insert with unique DR: {retried}");
                row.insert("dr_number".to_string(), Value::from(retried.as_str()));
                match self
                    .remote_call(self.remote.insert(TargetTable::Deliveries, row))
                    .await
                {
                    Ok(stored) => self.install_stored(stored).await,
                    Err(err) => Err(err),
                }
            }
            Err(err) if err.is_connectivity() => {
                self.queue
                    .enqueue(PendingOperation::insert(TargetTable::Deliveries, row))
                    .await;
                let optimistic = record.with_local_id();
                self.install_record(optimistic).await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Applies a partial update (local-shape fields) to the record with the
    /// given id. `NotFound` when the id resolves to nothing.
    pub async fn update(
        &self,
        id: &RecordId,
        fields: Map<String, Value>,
    ) -> Result<DeliveryRecord> {
        let current = self
            .find_record(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("delivery {id}")))?;

        let mut remote_fields = delivery_mapper::to_remote_shape(&fields);
        remote_fields
            .entry("updated_at".to_string())
            .or_insert_with(|| Value::from(Utc::now().to_rfc3339()));

        match self
            .remote_call(
                self.remote
                    .update(TargetTable::Deliveries, id, remote_fields.clone()),
            )
            .await
        {
            Ok(stored) => self.install_stored(stored).await,
            Err(err) if err.is_connectivity() => {
                self.queue
                    .enqueue(PendingOperation::update(
                        TargetTable::Deliveries,
                        id.clone(),
                        remote_fields,
                    ))
                    .await;
                let merged = merge_local(&current, &fields);
                self.install_record(merged).await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// The single authoritative status-change path: validates the target
    /// vocabulary, derives the completion timestamps, persists, and lets the
    /// re-partitioned state move the record between buckets.
    pub async fn update_status(&self, id: &RecordId, new_status: &str) -> Result<DeliveryRecord> {
        let current = self
            .find_record(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("delivery {id}")))?;
        let updated = current.apply_status(new_status, Utc::now())?;

        let mut fields = Map::new();
        fields.insert("status".to_string(), Value::from(updated.status.as_str()));
        if let Some(completed_at) = updated.completed_at {
            fields.insert(
                "completedAt".to_string(),
                Value::from(completed_at.to_rfc3339()),
            );
        }
        if let Some(completed_date) = &updated.completed_date {
            fields.insert(
                "completedDate".to_string(),
                Value::from(completed_date.clone()),
            );
        }
        if let Some(completed_date_time) = &updated.completed_date_time {
            fields.insert(
                "completedDateTime".to_string(),
                Value::from(completed_date_time.clone()),
            );
        }
        if let Some(updated_at) = updated.updated_at {
            fields.insert(
                "updatedAt".to_string(),
                Value::from(updated_at.to_rfc3339()),
            );
            fields.insert(
                "lastModified".to_string(),
                Value::from(updated_at.to_rfc3339()),
            );
        }

        self.update(id, fields).await
    }

    /// Deletes a delivery everywhere. Deletion is an explicit operator
    /// action, never part of the normal lifecycle.
    pub async fn remove(&self, id: &RecordId) -> Result<()> {
        if self.find_record(id).await.is_none() {
            return Err(AppError::NotFound(format!("delivery {id}")));
        }

        match self
            .remote_call(self.remote.delete(TargetTable::Deliveries, id))
            .await
        {
            Ok(()) => {
                self.forget_record(id).await;
                self.refresh_backup().await;
                Ok(())
            }
            Err(err) if err.is_connectivity() => {
                self.queue
                    .enqueue(PendingOperation::delete(TargetTable::Deliveries, id.clone()))
                    .await;
                self.forget_record(id).await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Imports a batch of already-shaped candidate records sequentially, so
    /// each row's DR disambiguation sees the rows imported before it. A
    /// failing row is recorded in the report and never aborts the batch.
    pub async fn import_many(&self, rows: Vec<Map<String, Value>>) -> ImportReport {
        {
            let mut in_progress = self.import_in_progress.write().await;
            if *in_progress {
                warn!("Import already in flight; ignoring re-entrant call");
                return ImportReport::default();
            }
            *in_progress = true;
        }

        let mut report = ImportReport::default();
        let mut batch_serials: HashSet<String> = HashSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let label = row_label(&row, index);

            let record = match DeliveryRecord::from_local_value(Value::Object(row)) {
                Ok(record) => record,
                Err(err) => {
                    report.record_failure(label.as_str(), err.to_string());
                    continue;
                }
            };

            if let Some(serial) = record
                .serial_number
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                if !batch_serials.insert(serial.to_string()) {
                    report.record_failure(
                        label.as_str(),
                        format!("duplicate serial number {serial} in upload"),
                    );
                    continue;
                }
            }

            match self.add(record).await {
                Ok(_) => report.record_success(),
                Err(err) => report.record_failure(label.as_str(), err.to_string()),
            }
        }

        info!(
            "Import finished: {} succeeded, {} failed",
            report.success, report.failed
        );
        *self.import_in_progress.write().await = false;
        report
    }

    /// Applies a pushed remote change through the same normalize and
    /// partition path as a full load, then refreshes the backup.
    pub async fn apply_remote_change(&self, change: RemoteChange) {
        match change.kind {
            OperationKind::Insert | OperationKind::Update => {
                let local = delivery_mapper::to_local_shape(&change.row);
                match DeliveryRecord::from_local_value(Value::Object(local)) {
                    Ok(record) => self.install_record(record).await,
                    Err(err) => {
                        warn!("Ignoring unreadable change event: {err}");
                        return;
                    }
                }
            }
            OperationKind::Delete => {
                let Some(id) = change.row.get("id").and_then(RecordId::from_value) else {
                    warn!("Ignoring delete event without an id");
                    return;
                };
                self.forget_record(&id).await;
            }
        }
        self.refresh_backup().await;
    }

    /// Replays queued writes; call when connectivity is restored.
    pub async fn drain_pending(&self) -> DrainOutcome {
        let outcome = self.queue.drain(self.remote.as_ref()).await;
        if outcome.replayed > 0 {
            info!(
                "Replayed {} queued writes ({} still pending)",
                outcome.replayed, outcome.remaining
            );
        }
        outcome
    }

    async fn find_record(&self, id: &RecordId) -> Option<DeliveryRecord> {
        let state = self.state.read().await;
        crate::domain::entities::delivery::find_by_id(&state.active, id)
            .or_else(|| crate::domain::entities::delivery::find_by_id(&state.history, id))
            .cloned()
    }

    async fn install_stored(&self, stored: RemoteRow) -> Result<DeliveryRecord> {
        let local = delivery_mapper::to_local_shape(&stored);
        let persisted = DeliveryRecord::from_local_value(Value::Object(local))?;
        self.install_record(persisted.clone()).await;
        self.refresh_backup().await;
        Ok(persisted)
    }

    /// Replaces any copy of the record in either bucket, then files it by
    /// its current status. This is the only in-memory mutation path, shared
    /// by writes, loads, and pushed change events.
    async fn install_record(&self, record: DeliveryRecord) {
        let mut state = self.state.write().await;
        if let Some(id) = record.id.clone() {
            state.active.retain(|existing| !existing.matches_id(&id));
            state.history.retain(|existing| !existing.matches_id(&id));
        }
        match record.bucket() {
            Bucket::Active => state.active.insert(0, record),
            Bucket::History => state.history.insert(0, record),
        }
    }

    async fn forget_record(&self, id: &RecordId) {
        let mut state = self.state.write().await;
        state.active.retain(|existing| !existing.matches_id(id));
        state.history.retain(|existing| !existing.matches_id(id));
    }

    async fn refresh_backup(&self) {
        let active = self.state.read().await.active.clone();
        self.backup_active(&active).await;
    }

    async fn backup_active(&self, active: &[DeliveryRecord]) {
        match serde_json::to_string(active) {
            Ok(serialized) => {
                if let Err(err) = self.cache.set(&self.backup_key, serialized).await {
                    warn!("Failed to write local backup: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize local backup: {err}"),
        }
    }

    async fn remote_call<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::RemoteUnavailable(format!(
                "remote call timed out after {}s",
                self.request_timeout.as_secs()
            ))),
        }
    }
}

fn merge_local(current: &DeliveryRecord, fields: &Map<String, Value>) -> DeliveryRecord {
    let mut map = current.to_local_map();
    for (key, value) in fields {
        map.insert(key.clone(), value.clone());
    }
    DeliveryRecord::from_local_value(Value::Object(map)).unwrap_or_else(|_| current.clone())
}

fn row_label(row: &Map<String, Value>, index: usize) -> String {
    row.get("drNumber")
        .or_else(|| row.get("dr_number"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Row {}", index + 1))
}
