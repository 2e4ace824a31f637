//! Error types for chainpulse

use std::fmt;

/// Result type alias for chainpulse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for chainpulse
#[derive(Debug)]
pub enum Error {
    /// Store read or write failed
    Store(String),
    /// Upstream chain probe failed
    Probe(String),
    /// Configuration errors
    Config(String),
    /// Serialization errors
    Serialization(String),
    /// HTTP client errors
    Http(reqwest::Error),
    /// IO errors
    Io(std::io::Error),
    /// Internal error
    Internal(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Store(msg) => write!(f, "Store error: {}", msg),
            Error::Probe(msg) => write!(f, "Probe error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let err = Error::Store("connection refused".to_string());
        assert_eq!(err.to_string(), "Store error: connection refused");

        let err = Error::Config("SAMPLER must be one of [synthetic, rpc]".to_string());
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn serde_errors_convert_to_serialization() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn io_errors_keep_their_source() {
        use std::error::Error as _;
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(err.source().is_some());
    }
}
