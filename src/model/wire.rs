//! Lenient field decoders for server payloads.
//!
//! The server is Python and its decisions are model-generated: keys go
//! missing, values arrive as `null`, and timestamps come without an offset.
//! One odd field must not cost the whole snapshot.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

/// `null` decodes as the field's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A list whose malformed elements are dropped instead of failing the
/// enclosing document. `null` decodes as empty.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    let total = raw.len();
    let items: Vec<T> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                log::debug!(
                    "WIRE_ITEM_SKIPPED type={} error={}",
                    std::any::type_name::<T>(),
                    e
                );
                None
            }
        })
        .collect();
    if items.len() < total {
        log::warn!(
            "WIRE_ITEMS_DROPPED type={} dropped={} kept={}",
            std::any::type_name::<T>(),
            total - items.len(),
            items.len()
        );
    }
    Ok(items)
}

/// RFC 3339 timestamps, or offset-less ISO 8601 taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub(crate) fn timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| D::Error::custom(format!("unrecognized timestamp {:?}", raw)))
}
