use crate::domain::value_objects::{Bucket, DeliveryStatus, RecordId};
use crate::shared::datetime;
use crate::shared::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One shipment, in the local (camelCase) shape the dashboard works with.
///
/// Recognized fields are typed; everything else survives in `extra` so that
/// records round-trip through the store without losing columns this crate
/// does not know about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_record_id"
    )]
    pub id: Option<RecordId>,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "de_string_or_empty"
    )]
    pub dr_number: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub customer_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub vendor_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub origin: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub destination: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub truck_type: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub truck_plate_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub distance: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub item_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub item_description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub serial_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub mobile_number: Option<String>,
    #[serde(default, deserialize_with = "de_status")]
    pub status: DeliveryStatus,
    #[serde(default, deserialize_with = "de_costs")]
    pub additional_costs: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_datetime"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_datetime"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_datetime"
    )]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_datetime"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub completed_date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_string"
    )]
    pub completed_date_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeliveryRecord {
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

    pub fn bucket(&self) -> Bucket {
        self.status.bucket()
    }

    /// Assigns a temporary client-side id when the record has none yet, so
    /// an optimistic copy stays addressable until the store confirms it.
    pub fn with_local_id(mut self) -> Self {
        if self.id.is_none() {
            self.id = Some(RecordId::from(uuid::Uuid::new_v4().to_string()));
        }
        self
    }

    /// Identity match tolerating both id types and the legacy id spellings
    /// older records still carry in their spillover fields.
    pub fn matches_id(&self, target: &RecordId) -> bool {
        if let Some(id) = &self.id {
            if id.loose_eq(target) {
                return true;
            }
        }
        ["delivery_id", "deliveryId"].iter().any(|key| {
            self.extra
                .get(*key)
                .map(|value| target.loose_eq_value(value))
                .unwrap_or(false)
        })
    }

    /// Validates the fields the remote store requires on insert.
    pub fn validate_for_insert(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.dr_number.trim().is_empty() {
            missing.push("drNumber");
        }
        if is_blank(&self.customer_name) {
            missing.push("customerName");
        }
        if is_blank(&self.origin) {
            missing.push("origin");
        }
        if is_blank(&self.destination) {
            missing.push("destination");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::MalformedInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Applies a status change, returning the updated record.
    ///
    /// Any recognized target status is permitted; only the vocabulary is
    /// checked. Completion statuses populate all three completion
    /// representations at once. The caller is responsible for moving the
    /// record between buckets afterwards; this never touches collections.
    pub fn apply_status(&self, new_status: &str, now: DateTime<Utc>) -> Result<DeliveryRecord> {
        let status = DeliveryStatus::parse(new_status)
            .ok_or_else(|| AppError::InvalidTransition(new_status.to_string()))?;

        let mut updated = self.clone();
        updated.status = status;
        if status.is_completion() {
            updated.completed_at = Some(now);
            updated.completed_date = Some(datetime::locale_date(now));
            updated.completed_date_time = Some(datetime::locale_date_time(now));
        }
        updated.updated_at = Some(now);
        updated.last_modified = Some(now);
        Ok(updated)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
}

/// Finds a record whose identity matches `id` under loose equality.
pub fn find_by_id<'a>(records: &'a [DeliveryRecord], id: &RecordId) -> Option<&'a DeliveryRecord> {
    records.iter().find(|record| record.matches_id(id))
}

/// Index form of [`find_by_id`].
pub fn index_of_id(records: &[DeliveryRecord], id: &RecordId) -> Option<usize> {
    records.iter().position(|record| record.matches_id(id))
}

fn de_record_id<'de, D>(deserializer: D) -> std::result::Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(RecordId::from_value))
}

fn de_status<'de, D>(deserializer: D) -> std::result::Result<DeliveryStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(DeliveryStatus::from_field(
        value.as_ref().and_then(Value::as_str),
    ))
}

fn de_costs<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0).max(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0).max(0.0),
        _ => 0.0,
    })
}

fn de_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(datetime::parse_flexible))
}

fn de_loose_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(loose_string))
}

fn de_string_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(loose_string).unwrap_or_default())
}

// Spreadsheet rows hand over numbers where the dashboard expects strings.
fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> DeliveryRecord {
        DeliveryRecord::from_local_value(json!({
            "id": 7,
            "drNumber": "DR001",
            "customerName": "Acme Hardware",
            "origin": "Manila",
            "destination": "Cebu",
            "status": "In Transit",
            "additionalCosts": "150.5",
            "podSignature": "base64...",
        }))
        .unwrap()
    }

    #[test]
    fn parses_local_shape_with_coercions() {
        let record = sample();
        assert_eq!(record.dr_number, "DR001");
        assert_eq!(record.status, DeliveryStatus::InTransit);
        assert_eq!(record.additional_costs, 150.5);
        // unrecognized field survives in the spillover map
        assert_eq!(record.extra.get("podSignature"), Some(&json!("base64...")));
    }

    #[test]
    fn junk_costs_default_to_zero() {
        let record = DeliveryRecord::from_local_value(json!({
            "drNumber": "DR002",
            "additionalCosts": "n/a",
        }))
        .unwrap();
        assert_eq!(record.additional_costs, 0.0);

        let negative = DeliveryRecord::from_local_value(json!({
            "drNumber": "DR003",
            "additionalCosts": -20,
        }))
        .unwrap();
        assert_eq!(negative.additional_costs, 0.0);
    }

    #[test]
    fn unknown_status_defaults_to_on_schedule() {
        let record = DeliveryRecord::from_local_value(json!({
            "drNumber": "DR004",
            "status": "SUD-Solve Undelivered",
        }))
        .unwrap();
        assert_eq!(record.status, DeliveryStatus::OnSchedule);
        assert_eq!(record.bucket(), Bucket::Active);
    }

    #[test]
    fn matches_id_across_types_and_legacy_spellings() {
        let record = sample();
        assert!(record.matches_id(&RecordId::from("7")));
        assert!(record.matches_id(&RecordId::from(7)));

        let legacy = DeliveryRecord::from_local_value(json!({
            "drNumber": "DR005",
            "delivery_id": "abc-123",
        }))
        .unwrap();
        assert!(legacy.matches_id(&RecordId::from("abc-123")));
        assert!(!legacy.matches_id(&RecordId::from("abc-999")));
    }

    #[test]
    fn find_by_id_scans_loosely() {
        let records = vec![sample()];
        assert!(find_by_id(&records, &RecordId::from("7")).is_some());
        assert_eq!(index_of_id(&records, &RecordId::from(7)), Some(0));
        assert_eq!(index_of_id(&records, &RecordId::from(8)), None);
    }

    #[test]
    fn apply_status_completion_sets_all_three_representations() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 30, 0).unwrap();
        let updated = sample().apply_status("Completed", now).unwrap();

        assert_eq!(updated.status, DeliveryStatus::Completed);
        assert_eq!(updated.completed_at, Some(now));
        assert_eq!(updated.completed_date.as_deref(), Some("03/09/2025"));
        assert_eq!(
            updated.completed_date_time.as_deref(),
            Some("03/09/2025, 14:30:00")
        );
        assert_eq!(updated.updated_at, Some(now));
        assert_eq!(updated.last_modified, Some(now));
        assert_eq!(updated.bucket(), Bucket::History);
    }

    #[test]
    fn apply_status_non_completion_leaves_completion_unset() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 30, 0).unwrap();
        let updated = sample().apply_status("Out for Delivery", now).unwrap();

        assert!(updated.completed_at.is_none());
        assert!(updated.completed_date.is_none());
        assert_eq!(updated.updated_at, Some(now));
        assert_eq!(updated.bucket(), Bucket::Active);
    }

    #[test]
    fn apply_status_rejects_unrecognized_vocabulary() {
        let now = Utc::now();
        let err = sample().apply_status("Archived", now).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn validate_for_insert_reports_missing_fields() {
        let record = DeliveryRecord::from_local_value(json!({
            "drNumber": "DR006",
            "customerName": "Acme Hardware",
        }))
        .unwrap();
        let err = record.validate_for_insert().unwrap_err();
        match err {
            AppError::MalformedInput(msg) => {
                assert!(msg.contains("origin"));
                assert!(msg.contains("destination"));
                assert!(!msg.contains("drNumber"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn with_local_id_is_stable_for_persisted_records() {
        let record = sample().with_local_id();
        assert!(record.matches_id(&RecordId::from(7)));

        let fresh = DeliveryRecord::default().with_local_id();
        assert!(fresh.id.is_some());
    }
}
