use crate::shared::datetime;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

/// Every recognized local spelling and the remote column it folds into.
/// This table is the only place in the crate that knows about alternate
/// field spellings; no other module may branch on them.
const LOCAL_TO_REMOTE: &[(&str, &str)] = &[
    ("id", "id"),
    ("delivery_id", "id"),
    ("deliveryId", "id"),
    ("drNumber", "dr_number"),
    ("dr_number", "dr_number"),
    ("DR", "dr_number"),
    ("customerName", "customer_name"),
    ("customer_name", "customer_name"),
    ("Customer", "customer_name"),
    ("vendorNumber", "vendor_number"),
    ("vendor_number", "vendor_number"),
    ("Vendor", "vendor_number"),
    ("origin", "origin"),
    ("destination", "destination"),
    ("truckType", "truck_type"),
    ("truck_type", "truck_type"),
    ("truckPlateNumber", "truck_plate_number"),
    ("truck_plate_number", "truck_plate_number"),
    ("truckPlate", "truck_plate_number"),
    ("distance", "distance"),
    ("status", "status"),
    ("deliveryDate", "delivery_date"),
    ("delivery_date", "delivery_date"),
    ("createdDate", "created_date"),
    ("created_date", "created_date"),
    ("createdAt", "created_at"),
    ("created_at", "created_at"),
    ("timestamp", "created_at"),
    ("updatedAt", "updated_at"),
    ("updated_at", "updated_at"),
    ("lastModified", "last_modified"),
    ("last_modified", "last_modified"),
    ("completedAt", "completed_at"),
    ("completed_at", "completed_at"),
    ("completedTimestamp", "completed_at"),
    ("completedDate", "completed_date"),
    ("completedDateTime", "completed_date_time"),
    ("additionalCosts", "additional_costs"),
    ("additional_costs", "additional_costs"),
    ("additionalCostItems", "additional_data"),
    ("additional_data", "additional_data"),
    ("itemNumber", "item_number"),
    ("item_number", "item_number"),
    ("itemDescription", "item_description"),
    ("item_description", "item_description"),
    ("serialNumber", "serial_number"),
    ("serial_number", "serial_number"),
    ("mobileNumber", "mobile_number"),
    ("mobile_number", "mobile_number"),
    ("createdBy", "created_by"),
    ("created_by", "created_by"),
    ("userId", "user_id"),
    ("user_id", "user_id"),
];

/// Canonical local spelling for each remote column.
const REMOTE_TO_LOCAL: &[(&str, &str)] = &[
    ("id", "id"),
    ("dr_number", "drNumber"),
    ("customer_name", "customerName"),
    ("vendor_number", "vendorNumber"),
    ("origin", "origin"),
    ("destination", "destination"),
    ("truck_type", "truckType"),
    ("truck_plate_number", "truckPlateNumber"),
    ("distance", "distance"),
    ("status", "status"),
    ("delivery_date", "deliveryDate"),
    ("created_date", "createdDate"),
    ("created_at", "createdAt"),
    ("updated_at", "updatedAt"),
    ("last_modified", "lastModified"),
    ("completed_at", "completedAt"),
    ("completed_date", "completedDate"),
    ("completed_date_time", "completedDateTime"),
    ("additional_costs", "additionalCosts"),
    ("item_number", "itemNumber"),
    ("item_description", "itemDescription"),
    ("serial_number", "serialNumber"),
    ("mobile_number", "mobileNumber"),
    ("created_by", "createdBy"),
    ("user_id", "userId"),
];

/// Remote columns holding an instant; their values are normalized to
/// RFC 3339 in both directions. `completed_date`/`completed_date_time` are
/// display strings, not instants, and stay as they are.
const INSTANT_COLUMNS: &[&str] = &[
    "created_at",
    "updated_at",
    "last_modified",
    "completed_at",
    "delivery_date",
    "created_date",
];

fn remote_key_for(local: &str) -> Option<&'static str> {
    LOCAL_TO_REMOTE
        .iter()
        .find(|(alias, _)| *alias == local)
        .map(|(_, remote)| *remote)
}

fn local_key_for(remote: &str) -> Option<&'static str> {
    REMOTE_TO_LOCAL
        .iter()
        .find(|(column, _)| *column == remote)
        .map(|(_, local)| *local)
}

/// Converts a record from local (camelCase) shape to the remote row shape.
///
/// Total and pure: recognized spellings fold into their remote column (the
/// canonical spelling wins when a record carries several spellings of the
/// same field), unrecognized fields pass through unchanged, costs coerce to
/// numbers, and instants normalize to RFC 3339; unparsable ones pass
/// through as they came.
pub fn to_remote_shape(record: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let mut canonical_written: BTreeSet<&'static str> = BTreeSet::new();

    for (key, value) in record {
        match remote_key_for(key) {
            Some(remote_key) => {
                let canonical = local_key_for(remote_key) == Some(key.as_str());
                if out.contains_key(remote_key) && !canonical {
                    continue;
                }
                if out.contains_key(remote_key) && canonical_written.contains(remote_key) {
                    continue;
                }
                out.insert(
                    remote_key.to_string(),
                    coerce_remote_value(remote_key, value),
                );
                if canonical {
                    canonical_written.insert(remote_key);
                }
            }
            None => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    out
}

/// Converts a remote row back to the local (camelCase) shape. Inverse of
/// [`to_remote_shape`] on the field-name dimension: round-tripping preserves
/// every recognized field's value.
pub fn to_local_shape(row: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let mut exact_written: BTreeSet<&'static str> = BTreeSet::new();

    for (key, value) in row {
        if key == "additional_data" {
            unpack_additional_data(value, &mut out);
            continue;
        }

        match remote_key_for(key) {
            Some(remote_key) => {
                let local_key = local_key_for(remote_key).unwrap_or(remote_key);
                // The exact column name is authoritative when a row somehow
                // carries several spellings of the same field.
                let exact = key == remote_key;
                if out.contains_key(local_key) && !exact {
                    continue;
                }
                if out.contains_key(local_key) && exact_written.contains(remote_key) {
                    continue;
                }
                out.insert(
                    local_key.to_string(),
                    coerce_remote_value(remote_key, value),
                );
                if exact {
                    exact_written.insert(remote_key);
                }
            }
            None => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    out
}

fn coerce_remote_value(remote_key: &str, value: &Value) -> Value {
    if remote_key == "additional_costs" {
        return Value::from(coerce_cost(value));
    }
    if remote_key == "additional_data" {
        return pack_additional_data(value);
    }
    if INSTANT_COLUMNS.contains(&remote_key) {
        if let Value::String(raw) = value {
            if let Some(instant) = datetime::parse_flexible(raw) {
                return Value::from(instant.to_rfc3339());
            }
        }
    }
    value.clone()
}

fn coerce_cost(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0).max(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0).max(0.0),
        _ => 0.0,
    }
}

/// Structured extras are stored as one JSON-encoded string column.
fn pack_additional_data(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let wrapped = serde_json::json!({ "additionalCostItems": items });
            Value::from(wrapped.to_string())
        }
        Value::Object(_) => Value::from(value.to_string()),
        other => other.clone(),
    }
}

fn unpack_additional_data(value: &Value, out: &mut Map<String, Value>) {
    let parsed = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Failed to parse additional_data: {raw}");
                out.insert("additional_data".to_string(), value.clone());
                return;
            }
        },
        other => other.clone(),
    };

    match parsed {
        Value::Object(fields) => {
            for (key, field_value) in fields {
                out.insert(key, field_value);
            }
        }
        other => {
            out.insert("additional_data".to_string(), other);
        }
    }
}
