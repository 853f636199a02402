//! Error taxonomy shared by the metadata API and document store clients.

/// Result alias for remote fetch and store operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Failure of a remote fetch or store operation.
///
/// `Clone` so a failure can be kept in view state and rendered later.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport or connectivity failure (DNS, TLS, connection refused, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status from the metadata API.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// Upstream HTTP status code.
        status: u16,
        /// Upstream message, or the raw body when no error document was returned.
        message: String,
    },

    /// Response body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Document store operation failure.
    #[error("store error: {0}")]
    Store(String),
}

impl FetchError {
    /// Wraps a transport failure, keeping the source chain in the message.
    pub(crate) fn network(context: &str, err: &reqwest::Error) -> Self {
        let mut message = format!("{context}: {err}");
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Network(message)
    }

    /// Upstream HTTP status, if this is an [`FetchError::Api`] failure.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) | Self::Store(_) => None,
        }
    }

    /// Returns `true` for transport failures.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_status() {
        // Arrange
        let err = FetchError::Api {
            status: 401,
            message: String::from("Invalid API key"),
        };

        // Act
        let text = err.to_string();

        // Assert
        assert_eq!(text, "API error (HTTP 401): Invalid API key");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_status_is_none_for_other_variants() {
        // Arrange & Act & Assert
        assert_eq!(FetchError::Network(String::from("reset")).status(), None);
        assert_eq!(FetchError::Store(String::from("down")).status(), None);
        assert_eq!(FetchError::Decode(String::from("eof")).status(), None);
    }

    #[test]
    fn test_is_network() {
        // Arrange & Act & Assert
        assert!(FetchError::Network(String::from("refused")).is_network());
        assert!(!FetchError::Store(String::from("refused")).is_network());
    }
}
