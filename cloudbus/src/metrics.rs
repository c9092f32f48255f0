use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref REQUESTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "cloudbus_requests_total",
        "Total HTTP requests issued to CloudBUS"
    ))
    .unwrap();
    pub static ref REQUEST_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "cloudbus_request_failures_total",
        "Total CloudBUS requests that failed in transport or decoding"
    ))
    .unwrap();
    pub static ref REQUEST_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "cloudbus_request_latency_seconds",
            "Time from issuing a request to a decoded JSON body"
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    )
    .unwrap();
    pub static ref POINTS_DECODED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "cloudbus_points_decoded_total",
        "Total time-series points decoded from data responses"
    ))
    .unwrap();
}

/// Registers the client metrics. Calling it more than once returns the
/// registry's `AlreadyReg` error.
pub fn init_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEST_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEST_LATENCY_SECONDS.clone()))?;
    REGISTRY.register(Box::new(POINTS_DECODED_TOTAL.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
