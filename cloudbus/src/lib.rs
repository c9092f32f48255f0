//! Blocking client for the CloudBUS telemetry API.
//!
//! [`CloudBusClient`] turns a device id and attribute into a single GET
//! and decodes the response into a [`TimeSeries`], a [`Snapshot`] of
//! current values, or a gateway's [`DeviceRoster`].

pub mod battery;
pub mod client;
pub mod config;
pub mod decode;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod query;
pub mod transport;
pub mod units;
mod validate;

pub use client::{CloudBusClient, DeviceEndpoints, GatewayCurrentData, SnapshotSource};
pub use config::ClientConfig;
pub use errors::{Error, Result};
pub use model::{DeviceId, DeviceRoster, Snapshot, SnapshotEntry, TimeSeries, TimeWindow};
pub use transport::{HttpTransport, Transport};
