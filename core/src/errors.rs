use thiserror::Error;

/// Errors surfaced by the pantry core
#[derive(Error, Debug)]
pub enum PantryError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Request Error: {0}")]
    Request(String),

    #[error("Response Error: {0}")]
    Response(String),

    #[error("Parsing Error: {0}")]
    Parsing(String),

    #[error("HTTP Error: {status_code} - {message}")]
    Http { status_code: u16, message: String },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PantryError {
    /// True for any failure of the request/response cycle with the assistant service.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Response(_) | Self::Parsing(_) | Self::Http { .. } | Self::Reqwest(_)
        )
    }
}

/// Result type for pantry operations
pub type PantryResult<T> = Result<T, PantryError>;

/// Reasons a directive marker is dropped during extraction.
///
/// These never reach callers of the extractor; they are logged and the scan
/// moves on.
#[derive(Error, Debug)]
pub enum DirectiveError {
    #[error("malformed directive payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("directive has no items")]
    Empty,

    #[error("directive payload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let http = PantryError::Http {
            status_code: 502,
            message: "bad gateway".to_string(),
        };
        assert!(http.is_transport());
        assert!(PantryError::Request("refused".to_string()).is_transport());
        assert!(!PantryError::Config("missing endpoint".to_string()).is_transport());
    }

    #[test]
    fn test_http_error_display() {
        let err = PantryError::Http {
            status_code: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP Error: 500 - boom");
    }
}
