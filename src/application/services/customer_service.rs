use crate::application::ports::{LocalCache, RemoteRow, RemoteStore};
use crate::application::services::retry_queue::RetryQueue;
use crate::application::shared::mappers::customer_mapper;
use crate::domain::entities::{CustomerRecord, PendingOperation, TargetTable};
use crate::domain::value_objects::RecordId;
use crate::shared::error::{AppError, Result};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// The customer directory counterpart of the delivery orchestrator: remote
/// first with a cache backup, optimistic in-memory mirror, and the shared
/// retry queue for writes that fail on connectivity.
pub struct CustomerService {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    queue: Arc<RetryQueue>,
    customers: Arc<RwLock<Vec<CustomerRecord>>>,
    owner: String,
    backup_key: String,
    request_timeout: Duration,
}

impl CustomerService {
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
            customers: Arc::new(RwLock::new(Vec::new())),
            owner: owner.into(),
            backup_key: backup_key.into(),
            request_timeout,
        }
    }

    pub async fn customers(&self) -> Vec<CustomerRecord> {
        self.customers.read().await.clone()
    }

    /// Loads the customer directory; never returns an error. Falls back to
    /// the cached copy when the remote is unreachable, and to an empty
    /// directory when there is no cached copy either.
    pub async fn load(&self) -> Vec<CustomerRecord> {
        let customers = match self
            .remote_call(self.remote.fetch_customers(&self.owner))
            .await
        {
            Ok(rows) => {
                let customers = rows
                    .iter()
                    .filter_map(|row| {
                        let local = customer_mapper::to_local_shape(row);
                        match CustomerRecord::from_local_value(Value::Object(local)) {
                            Ok(customer) => Some(customer),
                            Err(err) => {
                                warn!("Skipping unreadable customer row: {err}");
                                None
                            }
                        }
                    })
                    .collect::<Vec<_>>();
                info!("Loaded {} customers", customers.len());
                self.backup(&customers).await;
                customers
            }
            Err(err) => {
                warn!("Remote customer load failed, falling back to backup: {err}");
                self.load_from_backup().await
            }
        };

        *self.customers.write().await = customers.clone();
        customers
    }

    pub async fn add(&self, customer: CustomerRecord) -> Result<CustomerRecord> {
        customer.validate_for_insert()?;

        let mut row = customer_mapper::to_remote_shape(&customer.to_local_map());
        row.insert("user_id".to_string(), Value::from(self.owner.clone()));

        match self
            .remote_call(self.remote.insert(TargetTable::Customers, row.clone()))
            .await
        {
            Ok(stored) => self.install_stored(stored).await,
            Err(err) if err.is_connectivity() => {
                self.queue
                    .enqueue(PendingOperation::insert(TargetTable::Customers, row))
                    .await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn update(
        &self,
        id: &RecordId,
        fields: Map<String, Value>,
    ) -> Result<CustomerRecord> {
        {
            let customers = self.customers.read().await;
            if crate::domain::entities::customer::find_by_id(&customers, id).is_none() {
                return Err(AppError::NotFound(format!("customer {id}")));
            }
        }

        let remote_fields = customer_mapper::to_remote_shape(&fields);
        match self
            .remote_call(
                self.remote
                    .update(TargetTable::Customers, id, remote_fields.clone()),
            )
            .await
        {
            Ok(stored) => self.install_stored(stored).await,
            Err(err) if err.is_connectivity() => {
                self.queue
                    .enqueue(PendingOperation::update(
                        TargetTable::Customers,
                        id.clone(),
                        remote_fields,
                    ))
                    .await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn install_stored(&self, stored: RemoteRow) -> Result<CustomerRecord> {
        let local = customer_mapper::to_local_shape(&stored);
        let customer = CustomerRecord::from_local_value(Value::Object(local))?;

        {
            let mut customers = self.customers.write().await;
            if let Some(id) = customer.id.clone() {
                customers.retain(|existing| !existing.matches_id(&id));
            }
            customers.push(customer.clone());
            customers.sort_by(|a, b| {
                a.display_name()
                    .unwrap_or("")
                    .to_lowercase()
                    .cmp(&b.display_name().unwrap_or("").to_lowercase())
            });
        }
        self.refresh_backup().await;
        Ok(customer)
    }

    async fn load_from_backup(&self) -> Vec<CustomerRecord> {
        match self.cache.get(&self.backup_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CustomerRecord>>(&raw) {
                Ok(customers) => {
                    info!("Restored {} customers from local backup", customers.len());
                    customers
                }
                Err(err) => {
                    warn!("Customer backup is unreadable: {err}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Customer backup read failed: {err}");
                Vec::new()
            }
        }
    }

    async fn refresh_backup(&self) {
        let customers = self.customers.read().await.clone();
        self.backup(&customers).await;
    }

    async fn backup(&self, customers: &[CustomerRecord]) {
        match serde_json::to_string(customers) {
            Ok(serialized) => {
                if let Err(err) = self.cache.set(&self.backup_key, serialized).await {
                    warn!("Failed to write customer backup: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize customer backup: {err}"),
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
