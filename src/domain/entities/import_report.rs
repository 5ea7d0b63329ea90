use serde::{Deserialize, Serialize};

/// Per-row failure inside a batch import. `record` carries the row's DR
/// number when one was present, otherwise a positional label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFailure {
    pub record: String,
    pub message: String,
}

/// Outcome of a batch import. The batch never aborts on a single row; every
/// failure is accumulated here instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(&mut self, record: impl Into<String>, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(ImportFailure {
            record: record.into(),
            message: message.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.success + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_rows() {
        let mut report = ImportReport::default();
        report.record_success();
        report.record_success();
        report.record_failure("DR002", "duplicate serial number");

        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total(), 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].record, "DR002");
    }
}
