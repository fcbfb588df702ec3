//! Storage form of an availability map.
//!
//! Maps are stored as a JSON object keyed by entry ID, each value being a `[selector, stockConfig]` pair:
//!
//! ```json
//! {
//!   "1": [[["__datetime__", "2024-12-24T09:00:00+10:00"], ["__datetime__", "2024-12-24T17:00:00+10:00"]], {"available": true, "infinite": true}],
//!   "2": [[["__date__", 739244], ["__date__", 739250]], {"available": false}],
//!   "3": [[5, 6], {"available": true, "reference": 1}],
//!   "4": ["__default__", {"available": true, "useModelStock": true}]
//! }
//! ```
//!
//! Date-times keep their UTC offset. Dates are stored as day numbers counted from 0001-01-01 (day 1). Weekday pairs
//! are plain integers. Keys come back as integers and entries are sorted by ascending ID, whatever order they were
//! stored in.
use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};

use crate::availability::{AvailabilityEntry, AvailabilityError, AvailabilityMap, StockConfig, TimeSelector};

const DATETIME_TAG: &str = "__datetime__";
const DATE_TAG: &str = "__date__";
const DEFAULT_MARKER: &str = "__default__";
const LEGACY_DEFAULT_MARKER: &str = "default";

enum TaggedTime {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

pub fn encode_availability(map: &AvailabilityMap) -> Result<String, AvailabilityError> {
    let value = availability_to_json(map)?;
    Ok(value.to_string())
}

pub fn decode_availability(text: &str) -> Result<AvailabilityMap, AvailabilityError> {
    let value: Value = serde_json::from_str(text).map_err(|e| AvailabilityError::Codec(e.to_string()))?;
    availability_from_json(&value)
}

pub fn availability_to_json(map: &AvailabilityMap) -> Result<Value, AvailabilityError> {
    let mut result = serde_json::Map::with_capacity(map.len());
    for entry in map.entries() {
        let config = serde_json::to_value(&entry.config).map_err(|e| AvailabilityError::Codec(e.to_string()))?;
        result.insert(entry.id.to_string(), json!([encode_selector(&entry.selector), config]));
    }
    Ok(Value::Object(result))
}

pub fn availability_from_json(value: &Value) -> Result<AvailabilityMap, AvailabilityError> {
    let object = value
        .as_object()
        .ok_or_else(|| AvailabilityError::Codec(format!("expected a JSON object, but got {value}")))?;
    let mut entries = object.iter().map(|(key, value)| decode_entry(key, value)).collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.id);
    AvailabilityMap::new(entries)
}

fn encode_selector(selector: &TimeSelector) -> Value {
    match selector {
        TimeSelector::DateTimeRange(start, end) => {
            json!([[DATETIME_TAG, start.to_rfc3339()], [DATETIME_TAG, end.to_rfc3339()]])
        },
        TimeSelector::DateRange(start, end) => {
            json!([[DATE_TAG, start.num_days_from_ce()], [DATE_TAG, end.num_days_from_ce()]])
        },
        TimeSelector::WeekdayRange(start, end) => json!([start, end]),
        TimeSelector::Default => json!(DEFAULT_MARKER),
    }
}

fn decode_entry(key: &str, value: &Value) -> Result<AvailabilityEntry, AvailabilityError> {
    let id = key
        .trim()
        .parse::<i64>()
        .map_err(|_| AvailabilityError::Codec(format!("entry key '{key}' is not an integer")))?;
    let pair = value
        .as_array()
        .filter(|a| a.len() == 2)
        .ok_or_else(|| AvailabilityError::Codec(format!("entry #{id} is not a [selector, config] pair")))?;
    let selector = decode_selector(&pair[0])?;
    let config = StockConfig::deserialize(&pair[1])
        .map_err(|e| AvailabilityError::Codec(format!("entry #{id} has an invalid stock configuration. {e}")))?;
    Ok(AvailabilityEntry::new(id, selector, config))
}

fn decode_selector(value: &Value) -> Result<TimeSelector, AvailabilityError> {
    let invalid = || AvailabilityError::InvalidSelectorKind(value.to_string());
    match value {
        Value::String(s) if s == DEFAULT_MARKER || s == LEGACY_DEFAULT_MARKER => Ok(TimeSelector::Default),
        Value::Array(bounds) if bounds.len() == 2 => match (&bounds[0], &bounds[1]) {
            (Value::Number(start), Value::Number(end)) => {
                let start = start.as_u64().and_then(|v| u8::try_from(v).ok()).ok_or_else(invalid)?;
                let end = end.as_u64().and_then(|v| u8::try_from(v).ok()).ok_or_else(invalid)?;
                TimeSelector::weekdays(start, end)
            },
            (start, end) => match (decode_tagged(start)?, decode_tagged(end)?) {
                (TaggedTime::DateTime(start), TaggedTime::DateTime(end)) => Ok(TimeSelector::DateTimeRange(start, end)),
                (TaggedTime::Date(start), TaggedTime::Date(end)) => Ok(TimeSelector::DateRange(start, end)),
                _ => Err(AvailabilityError::InvalidSelectorKind(format!("mixed date and date-time bounds in {value}"))),
            },
        },
        _ => Err(invalid()),
    }
}

fn decode_tagged(value: &Value) -> Result<TaggedTime, AvailabilityError> {
    let invalid = || AvailabilityError::InvalidSelectorKind(value.to_string());
    let pair = value.as_array().filter(|a| a.len() == 2).ok_or_else(invalid)?;
    match pair[0].as_str() {
        Some(DATETIME_TAG) => {
            let text = pair[1].as_str().ok_or_else(invalid)?;
            DateTime::parse_from_rfc3339(text).map(TaggedTime::DateTime).map_err(|e| {
                AvailabilityError::InvalidSelectorKind(format!("'{text}' is not a date-time with an offset. {e}"))
            })
        },
        Some(DATE_TAG) => pair[1]
            .as_i64()
            .and_then(|days| i32::try_from(days).ok())
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(TaggedTime::Date)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

impl Serialize for AvailabilityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        availability_to_json(self).map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AvailabilityMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        availability_from_json(&value).map_err(D::Error::custom)
    }
}
