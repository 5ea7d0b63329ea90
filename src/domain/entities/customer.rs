use crate::domain::value_objects::RecordId;
use crate::shared::error::{AppError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A customer directory entry. No status lifecycle: customers are only
/// created, edited, and referenced by deliveries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_record_id"
    )]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomerRecord {
    pub fn from_local_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| AppError::DeserializationError(err.to_string()))
    }

    pub fn to_local_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Display name regardless of which spelling the record arrived with.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.customer_name.as_deref())
    }

    pub fn matches_id(&self, target: &RecordId) -> bool {
        if let Some(id) = &self.id {
            if id.loose_eq(target) {
                return true;
            }
        }
        ["customer_id", "customerId"].iter().any(|key| {
            self.extra
                .get(*key)
                .map(|value| target.loose_eq_value(value))
                .unwrap_or(false)
        })
    }

    pub fn validate_for_insert(&self) -> Result<()> {
        if self.display_name().map(str::trim).unwrap_or("").is_empty() {
            return Err(AppError::MalformedInput(
                "missing required fields: name".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn find_by_id<'a>(records: &'a [CustomerRecord], id: &RecordId) -> Option<&'a CustomerRecord> {
    records.iter().find(|record| record.matches_id(id))
}

pub fn index_of_id(records: &[CustomerRecord], id: &RecordId) -> Option<usize> {
    records.iter().position(|record| record.matches_id(id))
}

fn de_record_id<'de, D>(deserializer: D) -> std::result::Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(RecordId::from_value))
}
