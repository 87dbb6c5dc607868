//! `status --json` decoding
//!
//! The top level must be a JSON array. Optional keys may be missing or
//! `null`; a record missing `name`, `host`, `port` or `up` fails the whole
//! decode so that consumers never see a partial fleet. Unknown keys are
//! ignored.

use crate::error::DecodeError;
use crate::model::{FleetSnapshot, StatusRecord};
use std::collections::HashSet;

/// Decode captured manager output into a snapshot.
///
/// Empty (or whitespace-only) output means "no managed processes" and
/// yields an empty snapshot.
pub fn decode(raw: &str) -> Result<FleetSnapshot, DecodeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(FleetSnapshot::empty());
    }

    let records: Vec<StatusRecord> = serde_json::from_str(raw)?;

    let mut seen = HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.name.as_str()) {
            return Err(DecodeError::DuplicateName(record.name.clone()));
        }
    }

    Ok(FleetSnapshot::new(records))
}
