pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{LocalCache, RemoteRow, RemoteStore};
pub use application::services::{
    CustomerService, DeliverySyncService, DrainOutcome, RemoteChange, RetryQueue,
};
pub use domain::entities::{
    CustomerRecord, DeliveryRecord, ImportFailure, ImportReport, OperationKind, PendingOperation,
    TargetTable,
};
pub use domain::partition::{partition, DeliveryBuckets};
pub use domain::value_objects::{Bucket, DeliveryStatus, DrNumber, RecordId};
pub use infrastructure::cache::{FileCache, MemoryCache};
pub use infrastructure::remote::PostgresStore;
pub use shared::{AppConfig, AppError, Result};

/// Wires up `tracing` output for embedders that do not bring their own
/// subscriber. Call once at startup.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "delivery_sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
