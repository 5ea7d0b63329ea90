pub mod customer_service;
pub mod delivery_sync_service;
pub mod retry_queue;

pub use customer_service::CustomerService;
pub use delivery_sync_service::{DeliverySyncService, RemoteChange};
pub use retry_queue::{DrainOutcome, RetryQueue};
