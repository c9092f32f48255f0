//! Decoding of CloudBUS JSON payloads into the in-memory model.
//!
//! Every decoder takes the whole response body and fails with
//! [`Error::MalformedResponse`] when an expected field is missing or has
//! the wrong shape. Nothing is silently dropped.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{Error, Result};
use crate::model::{DeviceRoster, Snapshot, SnapshotEntry, TimeSeries};

const TIME_SUFFIX: &str = "_time";

/// Decodes `{"data": {"<ms>": <value>, ...}}` into a series sorted by
/// numeric timestamp.
pub fn decode_series(resp: &Value) -> Result<TimeSeries> {
    let data = resp
        .get("data")
        .ok_or_else(|| Error::malformed("'data' not in response"))?
        .as_object()
        .ok_or_else(|| Error::malformed("'data' is not an object"))?;

    let mut points = Vec::with_capacity(data.len());
    for (key, value) in data {
        let millis = parse_millis(key)
            .ok_or_else(|| Error::malformed(format!("Invalid timestamp key {:?}", key)))?;
        let value = parse_number(value)
            .ok_or_else(|| Error::malformed(format!("Non-numeric value {} at {}", value, key)))?;
        points.push((millis, value));
    }

    // Map keys arrive in string order; "10000" < "9000" lexicographically.
    points.sort_by_key(|(millis, _)| *millis);

    let points = points
        .into_iter()
        .map(|(millis, value)| Ok((millis_to_datetime(millis)?, value)))
        .collect::<Result<Vec<_>>>()?;

    debug!("Decoded {} series points", points.len());
    Ok(TimeSeries::from_points(points))
}

/// Decodes a device `currentdata` response: a list of endpoint objects
pub fn decode_device_snapshot(resp: &Value) -> Result<Snapshot> {
    let endpoints = resp
        .get("endpoints")
        .ok_or_else(|| Error::malformed("'endpoints' not in response"))?
        .as_array()
        .ok_or_else(|| Error::malformed("'endpoints' is not a list"))?;

    let mut snapshot = Snapshot::new();
    for endpoint in endpoints {
        let endpoint = endpoint
            .as_object()
            .ok_or_else(|| Error::malformed("Endpoint entry is not an object"))?;
        // Later endpoints overwrite attributes of the same name.
        collect_entries(endpoint, "endpointId", &mut snapshot)?;
    }

    Ok(snapshot)
}

/// Decodes a gateway `currentdata` response: one flat `currentData` object
pub fn decode_gateway_snapshot(resp: &Value) -> Result<Snapshot> {
    let current = resp
        .get("currentData")
        .ok_or_else(|| Error::malformed("'currentData' not in response"))?
        .as_object()
        .ok_or_else(|| Error::malformed("'currentData' is not an object"))?;

    let mut snapshot = Snapshot::new();
    collect_entries(current, "device_id", &mut snapshot)?;
    Ok(snapshot)
}

/// Decodes a gateway roster. A response without `devices` means nothing
/// is provisioned and yields an empty roster.
pub fn decode_roster(resp: &Value) -> Result<DeviceRoster> {
    let Some(devices) = resp.get("devices") else {
        debug!("Gateway response has no 'devices', treating as empty roster");
        return Ok(DeviceRoster::new());
    };

    let devices = devices
        .as_array()
        .ok_or_else(|| Error::malformed("'devices' is not a list"))?;

    let mut roster = DeviceRoster::new();
    for device in devices {
        let id = string_field(device, "deviceId")?;
        let kind = string_field(device, "deviceType")?;
        roster.insert(id, kind);
    }

    Ok(roster)
}

/// Shared attribute walk for both snapshot shapes. Every key other than
/// `id_key` and the `*_time` companions needs a matching `<key>_time`.
fn collect_entries(
    object: &Map<String, Value>,
    id_key: &str,
    snapshot: &mut Snapshot,
) -> Result<()> {
    for (key, value) in object {
        if key == id_key || key.ends_with(TIME_SUFFIX) {
            continue;
        }

        let time_key = format!("{}{}", key, TIME_SUFFIX);
        let millis = object
            .get(&time_key)
            .and_then(json_millis)
            .ok_or_else(|| Error::malformed(format!("Missing or invalid {:?}", time_key)))?;

        snapshot.insert(
            key.clone(),
            SnapshotEntry {
                timestamp: millis_to_datetime(millis)?,
                raw: raw_text(value),
            },
        );
    }

    Ok(())
}

fn string_field(entry: &Value, field: &str) -> Result<String> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::malformed(format!("Device entry missing {:?}", field)))
}

/// Strings are kept verbatim; anything else keeps its JSON text.
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Epoch milliseconds from text such as `"1490000000000"` or `"1490000000000.0"`
fn parse_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|ms| ms.is_finite())
            .map(|ms| ms.trunc() as i64)
    })
}

fn json_millis(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_millis(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|ms| ms.is_finite()).map(|ms| ms.trunc() as i64)),
        _ => None,
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| Error::malformed(format!("Timestamp {} out of range", millis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_series_sorts_numerically() {
        let resp = json!({"data": {"3000": "1.5", "1000": "2.0", "2000": "3"}});
        let series = decode_series(&resp).unwrap();

        assert_eq!(series.timestamps_secs(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.values(), &[2.0, 3.0, 1.5]);
    }

    #[test]
    fn test_series_mixed_digit_counts() {
        let resp = json!({"data": {"10000": 2, "9000": 1, "100000": 3}});
        let series = decode_series(&resp).unwrap();

        assert_eq!(series.timestamps_secs(), vec![9.0, 10.0, 100.0]);
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_series_keeps_milliseconds() {
        let resp = json!({"data": {"1490000000123": 21.5}});
        let series = decode_series(&resp).unwrap();

        assert_eq!(series.timestamps()[0].timestamp_millis(), 1_490_000_000_123);
    }

    #[test]
    fn test_series_missing_data() {
        let resp = json!({"status": "ok"});
        assert!(matches!(
            decode_series(&resp),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_series_data_not_object() {
        assert!(matches!(
            decode_series(&json!({"data": []})),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_series_empty_data() {
        let series = decode_series(&json!({"data": {}})).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_series_non_numeric_value() {
        let resp = json!({"data": {"1000": "on"}});
        assert!(matches!(
            decode_series(&resp),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_series_bad_timestamp_key() {
        let resp = json!({"data": {"yesterday": "1.0"}});
        assert!(decode_series(&resp).is_err());
    }

    #[test]
    fn test_device_snapshot() {
        let resp = json!({"endpoints": [{
            "endpointId": "e1",
            "temp": "72",
            "temp_time": "1000",
            "rssi": "-40",
            "rssi_time": "2000"
        }]});
        let snapshot = decode_device_snapshot(&resp).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["temp"].timestamp.timestamp(), 1);
        assert_eq!(snapshot["temp"].raw, "72");
        assert_eq!(snapshot["rssi"].timestamp.timestamp(), 2);
        assert_eq!(snapshot["rssi"].raw, "-40");
        assert!(!snapshot.contains_key("endpointId"));
        assert!(!snapshot.contains_key("temp_time"));
    }

    #[test]
    fn test_device_snapshot_later_endpoint_wins() {
        let resp = json!({"endpoints": [
            {"endpointId": "e1", "temp": "70", "temp_time": 1000},
            {"endpointId": "e2", "temp": "75", "temp_time": 5000}
        ]});
        let snapshot = decode_device_snapshot(&resp).unwrap();

        assert_eq!(snapshot["temp"].raw, "75");
        assert_eq!(snapshot["temp"].timestamp.timestamp(), 5);
    }

    #[test]
    fn test_device_snapshot_missing_endpoints() {
        assert!(matches!(
            decode_device_snapshot(&json!({"currentData": {}})),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_snapshot_missing_time_companion() {
        let resp = json!({"endpoints": [{"endpointId": "e1", "temp": "72"}]});
        assert!(matches!(
            decode_device_snapshot(&resp),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_gateway_snapshot() {
        let resp = json!({"currentData": {
            "device_id": "gw1",
            "uptime": 3600,
            "uptime_time": 4000,
            "firmware": "1.2.0",
            "firmware_time": "2000"
        }});
        let snapshot = decode_gateway_snapshot(&resp).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["uptime"].raw, "3600");
        assert_eq!(snapshot["firmware"].raw, "1.2.0");
        assert_eq!(snapshot["firmware"].timestamp.timestamp(), 2);
        assert!(!snapshot.contains_key("device_id"));
    }

    #[test]
    fn test_gateway_snapshot_missing_current_data() {
        assert!(decode_gateway_snapshot(&json!({"endpoints": []})).is_err());
    }

    #[test]
    fn test_roster() {
        let resp = json!({"devices": [{"deviceId": "d1", "deviceType": "sensor"}]});
        let roster = decode_roster(&resp).unwrap();

        assert_eq!(roster.len(), 1);
        assert_eq!(roster["d1"], "sensor");
    }

    #[test]
    fn test_roster_missing_devices_is_empty() {
        let roster = decode_roster(&json!({"gatewayId": "gw1"})).unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn test_roster_devices_not_list() {
        assert!(matches!(
            decode_roster(&json!({"devices": {}})),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_roster_entry_missing_type() {
        let resp = json!({"devices": [{"deviceId": "d1"}]});
        assert!(matches!(
            decode_roster(&resp),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("1000"), Some(1000));
        assert_eq!(parse_millis("1000.9"), Some(1000));
        assert_eq!(parse_millis("abc"), None);
    }
}
