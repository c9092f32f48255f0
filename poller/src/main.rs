mod settings;

use anyhow::Context;
use cloudbus::battery::{self, BATTERY_ATTRIBUTE};
use cloudbus::metrics;
use cloudbus::units::bytes_to_mebibytes;
use cloudbus::{CloudBusClient, TimeWindow};
use settings::Settings;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Reported in bytes, logged in MB
const DATA_USE_ATTRIBUTE: &str = "4gdata-use";

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env();

    info!("Starting CloudBUS poller");
    info!(
        "CloudBUS: {}, Devices: {}, Gateways: {}, Window: {} days",
        settings.client.base_url(),
        settings.devices.len(),
        settings.gateways.len(),
        settings.window_days
    );

    if let Err(e) = metrics::init_metrics() {
        warn!("Failed to register metrics: {}", e);
    }

    let client =
        CloudBusClient::new(settings.client.clone()).context("Failed to create CloudBUS client")?;
    let window =
        TimeWindow::trailing(settings.window).context("Invalid polling window")?;

    for gateway in &settings.gateways {
        if let Err(e) = poll_gateway(&client, gateway) {
            error!("Skipping gateway {}: {}", gateway, e);
        }
    }

    for device in &settings.devices {
        if let Err(e) = poll_device(&client, device, &settings.attributes, window) {
            error!("Skipping device {}: {}", device, e);
        }
    }

    debug!("Metrics:\n{}", metrics::gather_metrics());
    info!("Poll complete");
    Ok(())
}

fn poll_gateway(client: &CloudBusClient, gateway: &str) -> anyhow::Result<()> {
    let roster = client
        .fetch_provisioned_devices(gateway)
        .with_context(|| format!("listing devices of gateway {}", gateway))?;
    info!("Gateway {}: {} provisioned devices", gateway, roster.len());
    for (device, kind) in &roster {
        info!("  {} ({})", device, kind);
    }

    let snapshot = client
        .fetch_gateway_snapshot(gateway)
        .with_context(|| format!("reading current data of gateway {}", gateway))?;
    info!("Gateway {} current data: {}", gateway, serde_json::to_string(&snapshot)?);

    Ok(())
}

fn poll_device(
    client: &CloudBusClient,
    device: &str,
    attributes: &[String],
    window: TimeWindow,
) -> anyhow::Result<()> {
    let snapshot = client
        .fetch_device_snapshot(device)
        .with_context(|| format!("reading current data of device {}", device))?;
    info!("Device {}: {} current attributes", device, snapshot.len());

    for attribute in attributes {
        let series = client
            .fetch_series(device, attribute, window)
            .with_context(|| format!("fetching {} of device {}", attribute, device))?;
        let series = if attribute == DATA_USE_ATTRIBUTE {
            series.map_values(bytes_to_mebibytes)
        } else {
            series
        };

        match series.last() {
            Some((ts, value)) => info!(
                "  {}: {} points, last {} at {}",
                attribute,
                series.len(),
                value,
                ts.to_rfc3339()
            ),
            None => info!("  {}: no data in window", attribute),
        }

        if attribute == BATTERY_ATTRIBUTE {
            let summary = battery::fetch_summary(client, device)
                .with_context(|| format!("reading battery history of device {}", device))?;
            let last_full = summary
                .last_full
                .map(|ts| ts.format("%Y/%m/%d").to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            if summary.low {
                warn!(
                    "  battery LOW: current {:?}, last full {}, est. life {}",
                    summary.current, last_full, summary.estimated_life
                );
            } else {
                info!(
                    "  battery: current {:?}, last full {}, est. life {}",
                    summary.current, last_full, summary.estimated_life
                );
            }
        }
    }

    Ok(())
}
