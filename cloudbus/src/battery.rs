//! Battery life estimates from a `battery_remaining` series.
//!
//! Values are fractions of a full charge (`1.0` is full). The estimate
//! assumes a linear discharge since the most recent full reading.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::CloudBusClient;
use crate::errors::Result;
use crate::model::{TimeSeries, TimeWindow};
use crate::transport::Transport;

/// Attribute carrying the remaining charge fraction
pub const BATTERY_ATTRIBUTE: &str = "battery_remaining";

/// Readings above this count as a full charge
pub const FULL_THRESHOLD: f64 = 0.999;
/// At or above this level there is too little discharge to extrapolate
pub const MIN_DISCHARGE_LEVEL: f64 = 0.98;
/// Below this level a battery is flagged as low
pub const LOW_THRESHOLD: f64 = 0.05;

const SECONDS_PER_MONTH: f64 = 365.0 * 24.0 * 3600.0 / 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EstimatedLife {
    Unknown,
    NeedMoreData,
    Months(f64),
}

impl fmt::Display for EstimatedLife {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatedLife::Unknown => f.write_str("Unknown"),
            EstimatedLife::NeedMoreData => f.write_str("Need more data"),
            EstimatedLife::Months(m) => write!(f, "{:.2} months", m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatterySummary {
    pub last_full: Option<DateTime<Utc>>,
    pub current: Option<f64>,
    pub estimated_life: EstimatedLife,
    pub low: bool,
}

/// Summarizes the whole `battery_remaining` history of `device_id`.
///
/// The last full charge can be far older than any polling window, so the
/// query is unbounded.
pub fn fetch_summary<T: Transport>(
    client: &CloudBusClient<T>,
    device_id: &str,
) -> Result<BatterySummary> {
    let series = client.fetch_series(device_id, BATTERY_ATTRIBUTE, TimeWindow::default())?;
    Ok(summarize(&series))
}

pub fn summarize(series: &TimeSeries) -> BatterySummary {
    let last = series.last();
    let current = last.map(|(_, value)| value);

    let last_full = series
        .points()
        .filter(|(_, value)| *value > FULL_THRESHOLD)
        .map(|(ts, _)| ts)
        .last();

    let estimated_life = match (last_full, last) {
        (Some(full_at), Some((last_at, level))) => {
            // NaN readings fail this comparison and need more data
            if level < MIN_DISCHARGE_LEVEL {
                let elapsed = (last_at - full_at).num_milliseconds() as f64 / 1000.0;
                EstimatedLife::Months(elapsed / (1.0 - level) / SECONDS_PER_MONTH)
            } else {
                EstimatedLife::NeedMoreData
            }
        }
        _ => EstimatedLife::Unknown,
    };

    BatterySummary {
        last_full,
        current,
        estimated_life,
        low: current.is_some_and(|level| level < LOW_THRESHOLD),
    }
}
