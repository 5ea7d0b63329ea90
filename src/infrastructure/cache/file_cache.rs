use crate::application::ports::LocalCache;
use crate::shared::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-per-key cache under a data directory: the durable stand-in for the
/// browser's local storage. Values land as individual JSON files so a
/// half-written entry can never corrupt the others.
pub struct FileCache {
    data_dir: PathBuf,
}

impl FileCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Cache rooted at the platform's local data directory.
    pub fn default_location() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("./data"))
            .join("delivery-sync");
        Self::new(base)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys like "mci-active-deliveries" are already filesystem-safe, but
        // anything else gets sanitized rather than escaping the data dir.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.data_dir.join(format!("{safe}.json"))
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalCache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.path_for(key);
        write_atomically(&path, &value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

async fn write_atomically(path: &Path, value: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, value).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        assert_eq!(cache.get("mci-active-deliveries").await.unwrap(), None);

        cache
            .set("mci-active-deliveries", r#"[{"drNumber":"DR001"}]"#.to_string())
            .await
            .unwrap();
        assert_eq!(
            cache.get("mci-active-deliveries").await.unwrap().as_deref(),
            Some(r#"[{"drNumber":"DR001"}]"#)
        );

        cache.remove("mci-active-deliveries").await.unwrap();
        assert_eq!(cache.get("mci-active-deliveries").await.unwrap(), None);
    }

    #[tokio::test]
    async fn removing_a_missing_key_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        assert!(cache.remove("never-set").await.is_ok());
    }

    #[tokio::test]
    async fn keys_are_sanitized_into_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        cache
            .set("../escape/attempt", "{}".to_string())
            .await
            .unwrap();
        assert_eq!(
            cache.get("../escape/attempt").await.unwrap().as_deref(),
            Some("{}")
        );
        // The file landed inside the data dir, not outside it.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
