pub mod local_cache;
pub mod remote_store;

pub use local_cache::LocalCache;
pub use remote_store::{RemoteRow, RemoteStore};
