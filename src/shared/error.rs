use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Backing store unreachable or not initialized.
    RemoteUnavailable(String),
    /// Business-key collision on insert (`dr_number` per owner).
    UniquenessConflict(String),
    /// Target status outside the recognized vocabulary.
    InvalidTransition(String),
    NotFound(String),
    /// Required field missing or unparsable on ingest.
    MalformedInput(String),
    Cache(String),
    SerializationError(String),
    DeserializationError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::RemoteUnavailable(msg) => write!(f, "Remote store unavailable: {}", msg),
            AppError::UniquenessConflict(msg) => write!(f, "Uniqueness conflict: {}", msg),
            AppError::InvalidTransition(msg) => write!(f, "Invalid transition: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            AppError::Cache(msg) => write!(f, "Cache error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Connectivity-class failures queue a pending write; everything else
    /// surfaces to the caller directly.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, AppError::RemoteUnavailable(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                // Postgres unique_violation
                if db.code().as_deref() == Some("23505") {
                    return AppError::UniquenessConflict(db.message().to_string());
                }
                AppError::Internal(err.to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AppError::RemoteUnavailable(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::DeserializationError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_classification() {
        assert!(AppError::RemoteUnavailable("down".into()).is_connectivity());
        assert!(!AppError::UniquenessConflict("dup".into()).is_connectivity());
        assert!(!AppError::NotFound("x".into()).is_connectivity());
    }

    #[test]
    fn display_includes_message() {
        let err = AppError::InvalidTransition("Unknown Status".into());
        assert_eq!(err.to_string(), "Invalid transition: Unknown Status");
    }
}
