pub mod file_cache;
pub mod memory_cache;

pub use file_cache::FileCache;
pub use memory_cache::MemoryCache;
