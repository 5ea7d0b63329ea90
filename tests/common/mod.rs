use async_trait::async_trait;
use delivery_sync::{AppError, RecordId, RemoteRow, RemoteStore, Result, TargetTable};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// In-memory stand-in for the hosted store: owner scoping, sequential ids,
/// the (dr_number, user_id) uniqueness constraint, and a switchable offline
/// mode.
pub struct InMemoryRemote {
    rows: Mutex<Vec<RemoteRow>>,
    customers: Mutex<Vec<RemoteRow>>,
    next_id: AtomicI64,
    offline: Mutex<bool>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            customers: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            offline: Mutex::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn delivery_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check_online(&self) -> Result<()> {
        if *self.offline.lock().unwrap() {
            Err(AppError::RemoteUnavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn owner_of(row: &RemoteRow) -> Option<&str> {
        row.get("user_id").and_then(Value::as_str)
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn fetch_deliveries(&self, owner: &str) -> Result<Vec<RemoteRow>> {
        self.check_online()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| Self::owner_of(row) == Some(owner))
            .rev()
            .cloned()
            .collect())
    }

    async fn fetch_customers(&self, owner: &str) -> Result<Vec<RemoteRow>> {
        self.check_online()?;
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .filter(|row| Self::owner_of(row) == Some(owner))
            .cloned()
            .collect())
    }

    async fn dr_number_exists(&self, owner: &str, dr_number: &str) -> Result<bool> {
        self.check_online()?;
        Ok(self.rows.lock().unwrap().iter().any(|row| {
            Self::owner_of(row) == Some(owner)
                && row.get("dr_number").and_then(Value::as_str) == Some(dr_number)
        }))
    }

    async fn insert(&self, table: TargetTable, mut row: RemoteRow) -> Result<RemoteRow> {
        self.check_online()?;

        if table == TargetTable::Deliveries {
            let dr = row.get("dr_number").and_then(Value::as_str).unwrap_or("");
            let owner = Self::owner_of(&row).unwrap_or("").to_string();
            let collides = self.rows.lock().unwrap().iter().any(|existing| {
                existing.get("dr_number").and_then(Value::as_str) == Some(dr)
                    && Self::owner_of(existing) == Some(owner.as_str())
            });
            if collides {
                return Err(AppError::UniquenessConflict(format!(
                    "dr_number {dr} already exists"
                )));
            }
        }

        row.insert(
            "id".to_string(),
            Value::from(self.next_id.fetch_add(1, Ordering::SeqCst)),
        );
        match table {
            TargetTable::Deliveries => self.rows.lock().unwrap().push(row.clone()),
            TargetTable::Customers => self.customers.lock().unwrap().push(row.clone()),
        }
        Ok(row)
    }

    async fn update(
        &self,
        table: TargetTable,
        id: &RecordId,
        fields: RemoteRow,
    ) -> Result<RemoteRow> {
        self.check_online()?;
        let store = match table {
            TargetTable::Deliveries => &self.rows,
            TargetTable::Customers => &self.customers,
        };
        let mut rows = store.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| {
                row.get("id")
                    .map(|value| id.loose_eq_value(value))
                    .unwrap_or(false)
            })
            .ok_or_else(|| AppError::NotFound(format!("row {id}")))?;
        for (key, value) in fields {
            row.insert(key, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: TargetTable, id: &RecordId) -> Result<()> {
        self.check_online()?;
        let store = match table {
            TargetTable::Deliveries => &self.rows,
            TargetTable::Customers => &self.customers,
        };
        store.lock().unwrap().retain(|row| {
            !row.get("id")
                .map(|value| id.loose_eq_value(value))
                .unwrap_or(false)
        });
        Ok(())
    }
}
