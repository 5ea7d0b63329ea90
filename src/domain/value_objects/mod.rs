pub mod delivery_status;
pub mod dr_number;
pub mod record_id;

pub use delivery_status::{Bucket, DeliveryStatus};
pub use dr_number::DrNumber;
pub use record_id::RecordId;
