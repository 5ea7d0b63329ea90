use crate::shared::error::Result;
use async_trait::async_trait;

/// Key-value string storage used as the offline backup. Values are JSON
/// strings; the cache itself never interprets them.
#[async_trait]
pub trait LocalCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
