use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Upper bound on a single remote call, in seconds. A timed-out call is
    /// treated exactly like a connectivity failure.
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub active_deliveries_key: String,
    pub customers_key: String,
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Attempts per queued operation before it is dropped from the queue.
    pub max_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                database_url: "postgres://localhost/deliveries".to_string(),
                max_connections: 5,
                request_timeout: 30,
            },
            cache: CacheConfig {
                active_deliveries_key: "mci-active-deliveries".to_string(),
                customers_key: "mci-customers".to_string(),
                data_dir: default_data_dir(),
            },
            sync: SyncConfig { max_retries: 3 },
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("delivery-sync").to_string_lossy().into_owned())
        .unwrap_or_else(|| "./data".to_string())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("DELIVERY_SYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.remote.database_url = v;
            }
        }
        if let Ok(v) = std::env::var("DELIVERY_SYNC_MAX_CONNECTIONS") {
            if let Some(value) = parse_u32(&v) {
                cfg.remote.max_connections = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("DELIVERY_SYNC_REQUEST_TIMEOUT") {
            if let Some(value) = parse_u64(&v) {
                cfg.remote.request_timeout = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("DELIVERY_SYNC_DATA_DIR") {
            if !v.trim().is_empty() {
                cfg.cache.data_dir = v;
            }
        }
        if let Ok(v) = std::env::var("DELIVERY_SYNC_MAX_RETRIES") {
            if let Some(value) = parse_u32(&v) {
                cfg.sync.max_retries = value;
            }
        }
        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.remote.database_url.trim().is_empty() {
            return Err("Remote database_url must not be empty".to_string());
        }
        if self.remote.max_connections == 0 {
            return Err("Remote max_connections must be greater than 0".to_string());
        }
        if self.remote.request_timeout == 0 {
            return Err("Remote request_timeout must be greater than 0".to_string());
        }
        if self.cache.active_deliveries_key.trim().is_empty()
            || self.cache.customers_key.trim().is_empty()
        {
            return Err("Cache backup keys must not be empty".to_string());
        }
        Ok(())
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = AppConfig::default();
        cfg.remote.request_timeout = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_cache_key() {
        let mut cfg = AppConfig::default();
        cfg.cache.active_deliveries_key = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn max_retries_zero_is_allowed() {
        // Zero means "drop on first failure" rather than an invalid config.
        let mut cfg = AppConfig::default();
        cfg.sync.max_retries = 0;
        assert!(cfg.validate().is_ok());
    }
}
