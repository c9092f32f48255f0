use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedResponse(msg.into())
    }

    /// True for network/HTTP failures, as opposed to bad input or bad payloads.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::InvalidArgument("Device ID cannot be empty".to_string());
        assert_eq!(err.to_string(), "Invalid argument: Device ID cannot be empty");

        let err = Error::malformed("'data' not in response");
        assert_eq!(err.to_string(), "Malformed response: 'data' not in response");
        assert!(!err.is_transport());
    }
}
