use crate::domain::value_objects::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

/// Remote collection a queued write is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTable {
    Deliveries,
    Customers,
}

impl TargetTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTable::Deliveries => "deliveries",
            TargetTable::Customers => "customers",
        }
    }
}

impl fmt::Display for TargetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A remote write that failed on connectivity and waits for replay.
///
/// Payloads are stored in remote shape so replay needs no further
/// normalization. `attempts` counts failed drain attempts; the queue drops
/// the operation once the configured ceiling is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub table: TargetTable,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    #[serde(default)]
    pub attempts: u32,
}

impl PendingOperation {
    pub fn insert(table: TargetTable, payload: Map<String, Value>) -> Self {
        Self {
            kind: OperationKind::Insert,
            table,
            payload,
            record_id: None,
            attempts: 0,
        }
    }

    pub fn update(table: TargetTable, record_id: RecordId, payload: Map<String, Value>) -> Self {
        Self {
            kind: OperationKind::Update,
            table,
            payload,
            record_id: Some(record_id),
            attempts: 0,
        }
    }

    pub fn delete(table: TargetTable, record_id: RecordId) -> Self {
        Self {
            kind: OperationKind::Delete,
            table,
            payload: Map::new(),
            record_id: Some(record_id),
            attempts: 0,
        }
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        match (&self.kind, &self.record_id) {
            (OperationKind::Insert, _) => format!("insert into {}", self.table),
            (kind, Some(id)) => format!("{:?} {} in {}", kind, id, self.table).to_lowercase(),
            (kind, None) => format!("{:?} in {}", kind, self.table).to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constructors_set_kind_and_target() {
        let mut payload = Map::new();
        payload.insert("dr_number".to_string(), json!("DR001"));

        let insert = PendingOperation::insert(TargetTable::Deliveries, payload.clone());
        assert_eq!(insert.kind, OperationKind::Insert);
        assert!(insert.record_id.is_none());
        assert_eq!(insert.attempts, 0);

        let update = PendingOperation::update(
            TargetTable::Deliveries,
            RecordId::from(3),
            payload.clone(),
        );
        assert_eq!(update.kind, OperationKind::Update);
        assert!(update.record_id.is_some());

        let delete = PendingOperation::delete(TargetTable::Customers, RecordId::from("c1"));
        assert_eq!(delete.kind, OperationKind::Delete);
        assert!(delete.payload.is_empty());
    }

    #[test]
    fn describe_names_the_table() {
        let op = PendingOperation::delete(TargetTable::Deliveries, RecordId::from(9));
        assert!(op.describe().contains("deliveries"));
    }
}
