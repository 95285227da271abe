//! Versioned on-disk formats for the rate snapshot and the conversion history.
//!
//! Every record is written as `{"version": N, "data": ...}`. Values written
//! before versioning existed (a bare `{rates, timestamp}` object for rates and
//! a bare array for history) are migrated on read.

use crate::core::error::SchemaError;
use crate::core::history::ConversionRecord;
use crate::core::rates::{RateSnapshot, RateTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const SNAPSHOT_VERSION: u32 = 1;
pub const HISTORY_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

#[derive(Serialize, Deserialize)]
struct SnapshotV1 {
    base: String,
    rates: HashMap<String, f64>,
    captured_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct LegacySnapshot {
    rates: HashMap<String, f64>,
    timestamp: DateTime<Utc>,
}

pub fn encode_snapshot(snapshot: &RateSnapshot) -> Result<Vec<u8>, serde_json::Error> {
    let data = SnapshotV1 {
        base: snapshot.table.base().to_string(),
        rates: snapshot
            .table
            .rates()
            .iter()
            .map(|(code, rate)| (code.clone(), *rate))
            .collect(),
        captured_at: snapshot.captured_at,
    };
    serde_json::to_vec(&Envelope {
        version: SNAPSHOT_VERSION,
        data,
    })
}

/// Decodes a persisted snapshot. Legacy values are assumed to be quoted in `legacy_base`.
pub fn decode_snapshot(bytes: &[u8], legacy_base: &str) -> Result<RateSnapshot, SchemaError> {
    let value: Value = serde_json::from_slice(bytes)?;
    match check_version(&value, SNAPSHOT_VERSION)? {
        Some(data) => {
            let v1: SnapshotV1 = serde_json::from_value(data)?;
            Ok(RateSnapshot::new(
                RateTable::new(&v1.base, v1.rates),
                v1.captured_at,
            ))
        }
        None => {
            let legacy: LegacySnapshot = serde_json::from_value(value)?;
            Ok(RateSnapshot::new(
                RateTable::new(legacy_base, legacy.rates),
                legacy.timestamp,
            ))
        }
    }
}

pub fn encode_history(records: &[ConversionRecord]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&Envelope {
        version: HISTORY_VERSION,
        data: records,
    })
}

/// Decodes a persisted history. Legacy bare arrays share the v1 record shape.
pub fn decode_history(bytes: &[u8]) -> Result<Vec<ConversionRecord>, SchemaError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let data = match check_version(&value, HISTORY_VERSION)? {
        Some(data) => data,
        None if value.is_array() => value,
        None => return Err(SchemaError::Malformed("expected a history list".to_string())),
    };
    Ok(serde_json::from_value(data)?)
}

/// Returns the payload of a versioned envelope, or `None` for an unversioned value.
fn check_version(value: &Value, supported: u32) -> Result<Option<Value>, SchemaError> {
    let Some(object) = value.as_object() else {
        return Ok(None);
    };
    let Some(version) = object.get("version") else {
        return Ok(None);
    };
    let found = version
        .as_u64()
        .ok_or_else(|| SchemaError::Malformed(format!("invalid version field: {version}")))?;
    if found != u64::from(supported) {
        return Err(SchemaError::UnsupportedVersion { found, supported });
    }
    object
        .get("data")
        .cloned()
        .map(Some)
        .ok_or_else(|| SchemaError::Malformed("missing data field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_snapshot() -> RateSnapshot {
        let rates = [("USD".to_string(), 0.0011), ("EUR".to_string(), 0.00095)]
            .into_iter()
            .collect();
        RateSnapshot::new(
            RateTable::new("ARS", rates),
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_snapshot_is_written_with_version() {
        let bytes = encode_snapshot(&sample_snapshot()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["data"]["base"], "ARS");
        assert_eq!(decode_snapshot(&bytes, "ARS").unwrap(), sample_snapshot());
    }

    #[test]
    fn test_legacy_snapshot_is_migrated() {
        let legacy = br#"{"rates": {"USD": 0.0011, "EUR": 0.00095}, "timestamp": "2025-03-01T12:00:00.000Z"}"#;
        let snapshot = decode_snapshot(legacy, "ARS").unwrap();
        assert_eq!(snapshot, sample_snapshot());
    }

    #[test]
    fn test_future_snapshot_version_is_rejected() {
        let bytes = br#"{"version": 7, "data": {}}"#;
        let err = decode_snapshot(bytes, "ARS").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedVersion {
                found: 7,
                supported: 1
            }
        ));
    }

    #[test]
    fn test_garbage_snapshot_is_malformed() {
        assert!(matches!(
            decode_snapshot(b"not json", "ARS"),
            Err(SchemaError::Malformed(_))
        ));
        assert!(matches!(
            decode_snapshot(br#"{"version": 1}"#, "ARS"),
            Err(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn test_legacy_history_array_is_migrated() {
        let legacy = br#"[
            {"id": 1740830400000, "from": "ARS", "to": "USD", "amount": 1000, "result": 1.1, "timestamp": "2025-03-01T12:00:00.000Z"}
        ]"#;
        let records = decode_history(legacy).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1740830400000);
        assert_eq!(records[0].from, "ARS");
        assert_eq!(records[0].amount, 1000.0);

        let reencoded = encode_history(&records).unwrap();
        assert_eq!(decode_history(&reencoded).unwrap(), records);
    }

    #[test]
    fn test_history_object_without_version_is_malformed() {
        assert!(matches!(
            decode_history(br#"{"entries": []}"#),
            Err(SchemaError::Malformed(_))
        ));
    }
}
