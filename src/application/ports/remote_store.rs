use crate::domain::entities::TargetTable;
use crate::domain::value_objects::RecordId;
use crate::shared::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A remote row in its native (snake_case) shape.
pub type RemoteRow = Map<String, Value>;

/// The hosted row store behind the dashboard. All reads and writes are
/// scoped to the owning user; errors use the crate taxonomy so callers can
/// tell a connectivity failure (`RemoteUnavailable`) from a business-key
/// collision (`UniquenessConflict`).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All delivery rows owned by `owner`, newest first.
    async fn fetch_deliveries(&self, owner: &str) -> Result<Vec<RemoteRow>>;

    /// All customer rows owned by `owner`, ordered by name.
    async fn fetch_customers(&self, owner: &str) -> Result<Vec<RemoteRow>>;

    /// Whether the owner already has a delivery with this business key.
    async fn dr_number_exists(&self, owner: &str, dr_number: &str) -> Result<bool>;

    /// Inserts a row and returns it as persisted (with the assigned id).
    async fn insert(&self, table: TargetTable, row: RemoteRow) -> Result<RemoteRow>;

    /// Applies a partial update and returns the updated row.
    async fn update(&self, table: TargetTable, id: &RecordId, fields: RemoteRow)
        -> Result<RemoteRow>;

    async fn delete(&self, table: TargetTable, id: &RecordId) -> Result<()>;
}
