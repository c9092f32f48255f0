use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Error, Result};
use crate::metrics::REQUEST_LATENCY_SECONDS;

/// Issues a single GET and returns the decoded JSON body
pub trait Transport {
    fn get_json(&self, url: &str) -> Result<Value>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_json(&self, url: &str) -> Result<Value> {
        (**self).get_json(url)
    }
}

/// Blocking HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client })
    }

    fn fetch(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            warn!("CloudBUS returned {} for {}", status, url);
        }
        let response = response.error_for_status()?;

        let contents = response.text()?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::MalformedResponse(format!(
                "Unable to deserialize response ({}). Body was: {:?}",
                e, contents
            ))
        })
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);

        let start = Instant::now();
        let result = self.fetch(url);
        REQUEST_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());
        result
    }
}
