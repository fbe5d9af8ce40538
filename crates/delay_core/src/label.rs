//! Binary delay label

use crate::temporal::EngineeredRecord;

/// A flight counts as delayed strictly above this many minutes
pub const DELAY_THRESHOLD_MINUTES: f64 = 15.0;

/// 1 if `min_diff` exceeds the delay threshold
pub fn delay_from_min_diff(min_diff: f64) -> u8 {
    u8::from(min_diff > DELAY_THRESHOLD_MINUTES)
}

/// Supplied label if the record carries one, otherwise derived from `min_diff`
pub fn derive_label(record: &EngineeredRecord) -> u8 {
    record
        .record
        .delay
        .unwrap_or_else(|| delay_from_min_diff(record.min_diff))
}

/// Labels for a batch, in order
pub fn derive_labels(records: &[EngineeredRecord]) -> Vec<u8> {
    records.iter().map(derive_label).collect()
}
