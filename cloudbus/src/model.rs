use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::validate::validate_device_id;

/// Identifier of a CloudBUS device or gateway
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_device_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Historical values of one attribute, ordered by timestamp.
///
/// `timestamps` and `values` are always the same length and co-indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Builds a series from unordered points. Points with equal timestamps
    /// keep their relative order.
    pub fn from_points(mut points: Vec<(DateTime<Utc>, f64)>) -> Self {
        points.sort_by_key(|(ts, _)| *ts);
        let (timestamps, values) = points.into_iter().unzip();
        Self { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamps as fractional seconds since the Unix epoch
    pub fn timestamps_secs(&self) -> Vec<f64> {
        self.timestamps
            .iter()
            .map(|ts| ts.timestamp_millis() as f64 / 1000.0)
            .collect()
    }

    pub fn points(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn last(&self) -> Option<(DateTime<Utc>, f64)> {
        Some((*self.timestamps.last()?, *self.values.last()?))
    }

    /// Returns a series with the same timestamps and transformed values
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            timestamps: self.timestamps.clone(),
            values: self.values.iter().copied().map(f).collect(),
        }
    }

    pub fn into_parts(self) -> (Vec<DateTime<Utc>>, Vec<f64>) {
        (self.timestamps, self.values)
    }
}

/// Most recent report of a single attribute.
///
/// The value stays raw: the wire format does not say whether an attribute
/// is numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    pub timestamp: DateTime<Utc>,
    pub raw: String,
}

/// Latest value of every attribute a device or gateway reported
pub type Snapshot = BTreeMap<String, SnapshotEntry>;

/// Devices provisioned to a gateway, keyed by device id, valued by device type
pub type DeviceRoster = BTreeMap<String, String>;

/// Bounds of a series query. Unset bounds fall back to the Unix epoch for
/// `start` and to one day past now for `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Window covering `span` up to now. Fails when `span` reaches past
    /// the representable date range.
    pub fn trailing(span: Duration) -> Result<Self> {
        let end = Utc::now();
        let start = end.checked_sub_signed(span).ok_or_else(|| {
            Error::InvalidArgument(format!("Window span {} is out of range", span))
        })?;
        Ok(Self::new(start, end))
    }

    /// Concrete `(start, end)` for a query issued at `now`
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start.unwrap_or_default();
        let end = match self.end {
            Some(end) => end,
            None => now.checked_add_signed(Duration::days(1)).ok_or_else(|| {
                Error::InvalidArgument(format!("Default window end after {} is out of range", now))
            })?,
        };

        if start > end {
            return Err(Error::InvalidArgument(format!(
                "Window start {} is after end {}",
                start, end
            )));
        }

        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_device_id_parse() {
        let id = DeviceId::parse("gw-01").unwrap();
        assert_eq!(id.as_str(), "gw-01");
        assert_eq!(id.to_string(), "gw-01");
        assert!(DeviceId::parse("").is_err());
    }

    #[test]
    fn test_device_id_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<DeviceId>("\"\"").is_err());
        let id: DeviceId = serde_json::from_str("\"d1\"").unwrap();
        assert_eq!(id.as_str(), "d1");
    }

    #[test]
    fn test_from_points_sorts() {
        let series = TimeSeries::from_points(vec![(ts(3), 1.5), (ts(1), 2.0), (ts(2), 3.0)]);

        assert_eq!(series.len(), 3);
        assert_eq!(series.timestamps_secs(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.values(), &[2.0, 3.0, 1.5]);
        assert_eq!(series.last(), Some((ts(3), 1.5)));
    }

    #[test]
    fn test_empty_series() {
        let series = TimeSeries::default();
        assert!(series.is_empty());
        assert_eq!(series.last(), None);
    }

    #[test]
    fn test_map_values_keeps_timestamps() {
        let series = TimeSeries::from_points(vec![(ts(1), 2048.0), (ts(2), 4096.0)]);
        let halved = series.map_values(|v| v / 2.0);

        assert_eq!(halved.timestamps(), series.timestamps());
        assert_eq!(halved.values(), &[1024.0, 2048.0]);
    }

    #[test]
    fn test_window_defaults() {
        let now = ts(1_700_000_000);
        let (start, end) = TimeWindow::default().resolve(now).unwrap();

        assert_eq!(start, ts(0));
        assert_eq!(end, now + Duration::days(1));
    }

    #[test]
    fn test_window_inverted() {
        let window = TimeWindow::new(ts(10), ts(5));
        assert!(matches!(
            window.resolve(ts(0)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_trailing_window() {
        let window = TimeWindow::trailing(Duration::days(7)).unwrap();
        let (start, end) = window.resolve(Utc::now()).unwrap();
        assert_eq!(end - start, Duration::days(7));
    }

    #[test]
    fn test_trailing_window_out_of_range() {
        // A valid span, but it reaches past chrono's earliest date
        let span = Duration::try_days(100_000_000).unwrap();
        assert!(matches!(
            TimeWindow::trailing(span),
            Err(Error::InvalidArgument(_))
        ));
    }
}
