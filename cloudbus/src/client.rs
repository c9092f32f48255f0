use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::decode::{decode_device_snapshot, decode_gateway_snapshot, decode_roster, decode_series};
use crate::errors::Result;
use crate::metrics::{POINTS_DECODED_TOTAL, REQUESTS_TOTAL, REQUEST_FAILURES_TOTAL};
use crate::model::{DeviceId, DeviceRoster, Snapshot, TimeSeries, TimeWindow};
use crate::query;
use crate::transport::{HttpTransport, Transport};
use crate::validate::validate_attribute;

/// An endpoint reporting the latest value of every attribute.
///
/// Devices and gateways expose this through differently shaped payloads,
/// so each shape is its own source.
pub trait SnapshotSource {
    fn url(base_url: &str, id: &DeviceId) -> String;
    fn decode(resp: &Value) -> Result<Snapshot>;
}

/// `/cloudbus/device/{id}/currentdata`, a list of endpoints
pub struct DeviceEndpoints;

/// `/cloudbus/gateway/{id}/currentdata`, one flat `currentData` object
pub struct GatewayCurrentData;

impl SnapshotSource for DeviceEndpoints {
    fn url(base_url: &str, id: &DeviceId) -> String {
        query::device_current_url(base_url, id)
    }

    fn decode(resp: &Value) -> Result<Snapshot> {
        decode_device_snapshot(resp)
    }
}

impl SnapshotSource for GatewayCurrentData {
    fn url(base_url: &str, id: &DeviceId) -> String {
        query::gateway_current_url(base_url, id)
    }

    fn decode(resp: &Value) -> Result<Snapshot> {
        decode_gateway_snapshot(resp)
    }
}

/// Client for the CloudBUS device and gateway APIs.
///
/// Every call validates its identifiers, issues exactly one GET and
/// decodes the body. Nothing is cached or retried.
#[derive(Debug, Clone)]
pub struct CloudBusClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl CloudBusClient<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(config, HttpTransport::new()?))
    }
}

impl<T: Transport> CloudBusClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Counts every request and its failures regardless of transport
    fn get(&self, url: &str) -> Result<Value> {
        REQUESTS_TOTAL.inc();
        track(self.transport.get_json(url))
    }

    /// Fetches every reported value of `attribute` for `device_id` inside
    /// `window`, ordered by timestamp.
    pub fn fetch_series(
        &self,
        device_id: &str,
        attribute: &str,
        window: TimeWindow,
    ) -> Result<TimeSeries> {
        let device = DeviceId::parse(device_id)?;
        validate_attribute(attribute)?;
        let (start, end) = window.resolve(Utc::now())?;

        let url = query::series_url(self.config.base_url(), &device, attribute, start, end);
        let resp = self.get(&url)?;
        let series = track(decode_series(&resp))?;

        POINTS_DECODED_TOTAL.inc_by(series.len() as f64);
        debug!(
            "Fetched {} points of {} for device {}",
            series.len(),
            attribute,
            device
        );
        Ok(series)
    }

    /// Latest value of every attribute, read from the source `S`
    pub fn fetch_snapshot<S: SnapshotSource>(&self, id: &str) -> Result<Snapshot> {
        let id = DeviceId::parse(id)?;
        let url = S::url(self.config.base_url(), &id);
        let resp = self.get(&url)?;
        let snapshot = track(S::decode(&resp))?;

        debug!("Fetched {} current attributes for {}", snapshot.len(), id);
        Ok(snapshot)
    }

    pub fn fetch_device_snapshot(&self, device_id: &str) -> Result<Snapshot> {
        self.fetch_snapshot::<DeviceEndpoints>(device_id)
    }

    pub fn fetch_gateway_snapshot(&self, gateway_id: &str) -> Result<Snapshot> {
        self.fetch_snapshot::<GatewayCurrentData>(gateway_id)
    }

    /// Devices provisioned to `gateway_id`. A gateway with nothing
    /// provisioned yields an empty roster.
    pub fn fetch_provisioned_devices(&self, gateway_id: &str) -> Result<DeviceRoster> {
        let gateway = DeviceId::parse(gateway_id)?;
        let url = query::gateway_url(self.config.base_url(), &gateway);
        let resp = self.get(&url)?;
        let roster = track(decode_roster(&resp))?;

        debug!("Gateway {} has {} provisioned devices", gateway, roster.len());
        Ok(roster)
    }
}

/// Counts a failed transport or decode step
fn track<R>(result: Result<R>) -> Result<R> {
    if result.is_err() {
        REQUEST_FAILURES_TOTAL.inc();
    }
    result
}
