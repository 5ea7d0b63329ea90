pub mod customer;
pub mod delivery;
pub mod import_report;
pub mod pending_operation;

pub use customer::CustomerRecord;
pub use delivery::DeliveryRecord;
pub use import_report::{ImportFailure, ImportReport};
pub use pending_operation::{OperationKind, PendingOperation, TargetTable};
