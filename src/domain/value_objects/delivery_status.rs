use serde::{Deserialize, Serialize};
use std::fmt;

/// The bucket a delivery belongs to, derived from its status alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bucket {
    Active,
    History,
}

/// Recognized delivery status vocabulary.
///
/// Cancelled deliveries stay in the Active bucket: a cancelled shipment still
/// needs operator attention before it can be archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeliveryStatus {
    OnSchedule,
    Active,
    InTransit,
    OutForDelivery,
    Pending,
    Cancelled,
    Completed,
    Signed,
    Delivered,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 9] = [
        DeliveryStatus::OnSchedule,
        DeliveryStatus::Active,
        DeliveryStatus::InTransit,
        DeliveryStatus::OutForDelivery,
        DeliveryStatus::Pending,
        DeliveryStatus::Cancelled,
        DeliveryStatus::Completed,
        DeliveryStatus::Signed,
        DeliveryStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::OnSchedule => "On Schedule",
            DeliveryStatus::Active => "Active",
            DeliveryStatus::InTransit => "In Transit",
            DeliveryStatus::OutForDelivery => "Out for Delivery",
            DeliveryStatus::Pending => "Pending",
            DeliveryStatus::Cancelled => "Cancelled",
            DeliveryStatus::Completed => "Completed",
            DeliveryStatus::Signed => "Signed",
            DeliveryStatus::Delivered => "Delivered",
        }
    }

    /// Strict parse: `None` for anything outside the vocabulary. Used by the
    /// transition applier to signal `InvalidTransition`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Ingest parse: unknown or missing statuses default to `OnSchedule`,
    /// matching how records without a usable status are displayed.
    pub fn from_field(value: Option<&str>) -> Self {
        value
            .and_then(Self::parse)
            .unwrap_or(DeliveryStatus::OnSchedule)
    }

    pub fn bucket(&self) -> Bucket {
        match self {
            DeliveryStatus::Completed | DeliveryStatus::Signed | DeliveryStatus::Delivered => {
                Bucket::History
            }
            _ => Bucket::Active,
        }
    }

    pub fn is_completion(&self) -> bool {
        self.bucket() == Bucket::History
    }
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        DeliveryStatus::OnSchedule
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for DeliveryStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("Unrecognized delivery status: {value}"))
    }
}

impl From<DeliveryStatus> for String {
    fn from(status: DeliveryStatus) -> Self {
        status.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_exactly_one_bucket() {
        for status in DeliveryStatus::ALL {
            match status.bucket() {
                Bucket::Active => assert!(!status.is_completion()),
                Bucket::History => assert!(status.is_completion()),
            }
        }
    }

    #[test]
    fn completion_statuses_are_history() {
        assert_eq!(DeliveryStatus::Completed.bucket(), Bucket::History);
        assert_eq!(DeliveryStatus::Signed.bucket(), Bucket::History);
        assert_eq!(DeliveryStatus::Delivered.bucket(), Bucket::History);
    }

    #[test]
    fn cancelled_stays_active() {
        assert_eq!(DeliveryStatus::Cancelled.bucket(), Bucket::Active);
    }

    #[test]
    fn parse_round_trips_display() {
        for status in DeliveryStatus::ALL {
            assert_eq!(DeliveryStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            DeliveryStatus::parse("in transit"),
            Some(DeliveryStatus::InTransit)
        );
        assert_eq!(
            DeliveryStatus::parse("  Out for Delivery  "),
            Some(DeliveryStatus::OutForDelivery)
        );
    }

    #[test]
    fn unknown_status_defaults_on_ingest() {
        assert_eq!(
            DeliveryStatus::from_field(Some("SUD-Solve Undelivered")),
            DeliveryStatus::OnSchedule
        );
        assert_eq!(DeliveryStatus::from_field(None), DeliveryStatus::OnSchedule);
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert_eq!(DeliveryStatus::parse("Archived"), None);
    }
}
