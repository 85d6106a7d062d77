//! Form encoding of entity records

use lubesync_domain::{SyncError, CACHE_METADATA_FIELD};
use serde::Serialize;
use serde_json::Value;

/// Scalar fields of `entity` as form pairs.
///
/// Cache metadata, nulls and nested values are skipped, and `id` is dropped
/// unless `include_id` is set.
pub fn form_fields<T: Serialize>(entity: &T, include_id: bool) -> Result<Vec<(String, String)>, SyncError> {
    let Value::Object(fields) = serde_json::to_value(entity)? else {
        return Err(SyncError::Client("record did not serialize to an object".into()));
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        if key == CACHE_METADATA_FIELD || (key == "id" && !include_id) {
            continue;
        }
        let encoded = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => continue,
        };
        pairs.push((key, encoded));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use lubesync_domain::{CacheMetadata, GasRecord, Reminder};

    use super::*;

    fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    #[test]
    fn create_form_omits_id_and_cache() {
        let record = GasRecord {
            id: -3,
            vehicle_id: 12,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            mileage: 48_200,
            gallons: 11.5,
            cost: 42.25,
            is_fill_to_full: true,
            notes: None,
            cache: CacheMetadata::pending_upload(),
        };

        let pairs = form_fields(&record, false).unwrap();

        assert_eq!(lookup(&pairs, "id"), None);
        assert_eq!(lookup(&pairs, "cache"), None);
        assert_eq!(lookup(&pairs, "notes"), None);
        assert_eq!(lookup(&pairs, "vehicleId"), Some("12"));
        assert_eq!(lookup(&pairs, "date"), Some("2024-05-01"));
        assert_eq!(lookup(&pairs, "gallons"), Some("11.5"));
        assert_eq!(lookup(&pairs, "isFillToFull"), Some("true"));
    }

    #[test]
    fn update_form_keeps_id() {
        let reminder = Reminder {
            id: 9,
            description: "Rotate tires".into(),
            urgency: "urgent".into(),
            due_mileage: Some(50_000),
            ..Reminder::default()
        };

        let pairs = form_fields(&reminder, true).unwrap();

        assert_eq!(lookup(&pairs, "id"), Some("9"));
        assert_eq!(lookup(&pairs, "dueMileage"), Some("50000"));
        assert_eq!(lookup(&pairs, "dueDate"), None);
    }
}
