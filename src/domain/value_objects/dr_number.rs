use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The human-assigned document reference, unique per owning user. Distinct
/// from the opaque storage id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrNumber(String);

impl DrNumber {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("DR number cannot be empty".to_string());
        }
        Ok(())
    }

    /// Builds a fresh reference for records that arrive without one:
    /// `DR{yy}{mm}{dd}-{tail of unix millis}`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let year = now.year() % 100;
        let tail = now.timestamp_millis() % 1_000_000;
        Self(format!(
            "DR{:02}{:02}{:02}-{:06}",
            year,
            now.month(),
            now.day(),
            tail
        ))
    }

    /// Disambiguates a colliding reference by appending a time-derived
    /// suffix. The original value is never overwritten remotely.
    pub fn with_unique_suffix(&self, now: DateTime<Utc>) -> Self {
        Self(format!("{}-{}", self.0, now.timestamp_millis()))
    }
}

impl fmt::Display for DrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DrNumber> for String {
    fn from(dr: DrNumber) -> Self {
        dr.0
    }
}
