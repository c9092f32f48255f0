use std::env;

/// CloudBUS host the public service has historically listened on
pub const DEFAULT_BASE_URL: &str = "http://54.172.91.188:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Reads `CLOUDBUS_URL`, falling back to [`DEFAULT_BASE_URL`]
    pub fn from_env() -> Self {
        let base_url = env::var("CLOUDBUS_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::new("http://localhost:8080/");
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_default() {
        assert_eq!(ClientConfig::default().base_url(), DEFAULT_BASE_URL);
    }
}
