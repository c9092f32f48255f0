use std::env;

use chrono::Duration;
use cloudbus::ClientConfig;

const DEFAULT_ATTRIBUTES: &str = "temperature,humidity,rssi,battery_remaining";
const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientConfig,
    pub devices: Vec<String>,
    pub gateways: Vec<String>,
    pub attributes: Vec<String>,
    pub window_days: i64,
    pub window: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        let devices = env::var("DEVICES").unwrap_or_default();
        let gateways = env::var("GATEWAYS").unwrap_or_default();
        let attributes =
            env::var("ATTRIBUTES").unwrap_or_else(|_| DEFAULT_ATTRIBUTES.to_string());
        let window_days: i64 = env::var("WINDOW_DAYS")
            .unwrap_or_else(|_| DEFAULT_WINDOW_DAYS.to_string())
            .parse()
            .unwrap_or(DEFAULT_WINDOW_DAYS);
        let (window_days, window) = window_span(window_days);

        Self {
            client: ClientConfig::from_env(),
            devices: split_list(&devices),
            gateways: split_list(&gateways),
            attributes: split_list(&attributes),
            window_days,
            window,
        }
    }
}

/// Day count and span of the polling window, falling back to the default
/// when the count is not a positive, representable number of days
fn window_span(days: i64) -> (i64, Duration) {
    match Duration::try_days(days) {
        Some(span) if days > 0 => (days, span),
        _ => (DEFAULT_WINDOW_DAYS, Duration::days(DEFAULT_WINDOW_DAYS)),
    }
}

/// Splits a comma separated list, dropping blank entries
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
