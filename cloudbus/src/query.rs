use chrono::{DateTime, Utc};

use crate::model::DeviceId;

/// Timestamp layout the data endpoint expects for `start`/`end`
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn series_url(
    base_url: &str,
    device: &DeviceId,
    attribute: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    let query = format!(
        "attr={}&start={}&end={}",
        attribute,
        start.format(QUERY_TIME_FORMAT),
        end.format(QUERY_TIME_FORMAT)
    );

    format!(
        "{}/cloudbus/device/{}/data?{}",
        base_url,
        device,
        query.replace(' ', "%20")
    )
}

pub fn device_current_url(base_url: &str, device: &DeviceId) -> String {
    format!("{}/cloudbus/device/{}/currentdata", base_url, device)
}

pub fn gateway_url(base_url: &str, gateway: &DeviceId) -> String {
    format!("{}/cloudbus/gateway/{}", base_url, gateway)
}

pub fn gateway_current_url(base_url: &str, gateway: &DeviceId) -> String {
    format!("{}/cloudbus/gateway/{}/currentdata", base_url, gateway)
}
