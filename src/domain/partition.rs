use crate::domain::entities::DeliveryRecord;
use crate::domain::value_objects::Bucket;
use serde::{Deserialize, Serialize};

/// The in-memory view the dashboard renders from: active deliveries and
/// delivery history, each record in exactly one of the two.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryBuckets {
    pub active: Vec<DeliveryRecord>,
    pub history: Vec<DeliveryRecord>,
}

impl DeliveryBuckets {
    pub fn len(&self) -> usize {
        self.active.len() + self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.history.is_empty()
    }
}

/// Splits records into active/history purely from each record's current
/// status. Any bucket flag a record may carry from an earlier run is
/// ignored; membership is re-derived on every call.
pub fn partition(records: Vec<DeliveryRecord>) -> DeliveryBuckets {
    let mut buckets = DeliveryBuckets::default();
    for record in records {
        match record.bucket() {
            Bucket::Active => buckets.active.push(record),
            Bucket::History => buckets.history.push(record),
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(dr: &str, status: &str) -> DeliveryRecord {
        DeliveryRecord::from_local_value(json!({"drNumber": dr, "status": status})).unwrap()
    }

    #[test]
    fn every_record_lands_in_exactly_one_bucket() {
        let records = vec![
            record("DR001", "On Schedule"),
            record("DR002", "In Transit"),
            record("DR003", "Completed"),
            record("DR004", "Signed"),
            record("DR005", "Delivered"),
            record("DR006", "Cancelled"),
            record("DR007", "Pending"),
        ];
        let total = records.len();

        let buckets = partition(records);
        assert_eq!(buckets.active.len() + buckets.history.len(), total);
        assert_eq!(buckets.active.len(), 4);
        assert_eq!(buckets.history.len(), 3);

        let history_drs: Vec<&str> = buckets
            .history
            .iter()
            .map(|r| r.dr_number.as_str())
            .collect();
        assert_eq!(history_drs, vec!["DR003", "DR004", "DR005"]);
    }

    #[test]
    fn missing_status_defaults_to_active() {
        let records =
            vec![DeliveryRecord::from_local_value(json!({"drNumber": "DR001"})).unwrap()];
        let buckets = partition(records);
        assert_eq!(buckets.active.len(), 1);
        assert!(buckets.history.is_empty());
    }

    #[test]
    fn partition_is_idempotent() {
        let records = vec![
            record("DR001", "In Transit"),
            record("DR002", "Completed"),
            record("DR003", "Cancelled"),
        ];

        let first = partition(records.clone());
        let second = partition(records);

        let drs = |bucket: &[DeliveryRecord]| -> Vec<String> {
            bucket.iter().map(|r| r.dr_number.clone()).collect()
        };
        assert_eq!(drs(&first.active), drs(&second.active));
        assert_eq!(drs(&first.history), drs(&second.history));
    }

    #[test]
    fn stale_bucket_flags_on_records_are_ignored() {
        // A record claiming to be archived still partitions by status alone.
        let mut stale = record("DR001", "In Transit");
        stale
            .extra
            .insert("bucket".to_string(), json!("history"));

        let buckets = partition(vec![stale]);
        assert_eq!(buckets.active.len(), 1);
        assert!(buckets.history.is_empty());
    }
}
