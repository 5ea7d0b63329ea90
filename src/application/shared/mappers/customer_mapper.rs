use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Recognized customer spellings and their remote columns. Both
/// `customerName` variants fold into the remote `name` column.
const LOCAL_TO_REMOTE: &[(&str, &str)] = &[
    ("id", "id"),
    ("customer_id", "id"),
    ("customerId", "id"),
    ("name", "name"),
    ("customerName", "name"),
    ("customer_name", "name"),
    ("email", "email"),
    ("phone", "phone"),
    ("mobile", "mobile_number"),
    ("mobileNumber", "mobile_number"),
    ("mobile_number", "mobile_number"),
    ("address", "address"),
    ("vendorNumber", "vendor_number"),
    ("vendor_number", "vendor_number"),
    ("contactPerson", "contact_person"),
    ("contact_person", "contact_person"),
    ("userId", "user_id"),
    ("user_id", "user_id"),
];

const REMOTE_TO_LOCAL: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("email", "email"),
    ("phone", "phone"),
    ("mobile_number", "mobileNumber"),
    ("address", "address"),
    ("vendor_number", "vendorNumber"),
    ("contact_person", "contactPerson"),
    ("user_id", "userId"),
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

/// Local (camelCase) customer shape to remote row shape. Unrecognized
/// fields pass through unchanged.
pub fn to_remote_shape(record: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let mut canonical_written: BTreeSet<&'static str> = BTreeSet::new();

    for (key, value) in record {
        match remote_key_for(key) {
            Some(remote_key) => {
                let canonical = local_key_for(remote_key) == Some(key.as_str());
                if out.contains_key(remote_key)
                    && (!canonical || canonical_written.contains(remote_key))
                {
                    continue;
                }
                out.insert(remote_key.to_string(), value.clone());
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

/// Remote row to local shape. `customerName` is re-exposed alongside `name`
/// because both spellings are still read downstream.
pub fn to_local_shape(row: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let mut exact_written: BTreeSet<&'static str> = BTreeSet::new();

    for (key, value) in row {
        match remote_key_for(key) {
            Some(remote_key) => {
                let local_key = local_key_for(remote_key).unwrap_or(remote_key);
                let exact = key == remote_key;
                if out.contains_key(local_key)
                    && (!exact || exact_written.contains(remote_key))
                {
                    continue;
                }
                out.insert(local_key.to_string(), value.clone());
                if exact {
                    exact_written.insert(remote_key);
                }
            }
            None => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    if let Some(name) = out.get("name").cloned() {
        out.entry("customerName".to_string()).or_insert(name);
    }

    out
}
