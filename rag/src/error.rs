use thiserror::Error;

/// Errors that can occur while running a retrieval turn.
///
/// Upstream services (embedding, ANN, lexical index, text completion) are
/// all network calls and share the same failure modes: they time out, they
/// refuse the connection, or they answer with something the adapter cannot
/// parse. A projection dimension mismatch is deliberately *not* an error;
/// the embedder passes the raw vector through (see `projection`).
#[derive(Error, Debug)]
pub enum EngineError {
    /// An upstream call exceeded its deadline.
    #[error("{service} timed out")]
    Timeout {
        /// Which service timed out (e.g., "embedding", "ann", "completion")
        service: String,
    },

    /// An upstream service could not be reached (connection/auth failure).
    #[error("{service} unavailable: {message}")]
    Unavailable { service: String, message: String },

    /// An upstream service answered with data the adapter cannot parse.
    #[error("malformed response from {service}: {message}")]
    Malformed { service: String, message: String },

    /// The completion API returned a non-success status.
    #[error("completion API error ({status}): {message}")]
    Completion { status: u16, message: String },

    /// An API key was required but not found.
    #[error("API key not found. Set the {env_var} environment variable")]
    MissingApiKey { env_var: String },

    /// The configured provider name is not one we know how to talk to.
    #[error("unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    /// The projection matrix file could not be loaded or is malformed.
    #[error("projection matrix error: {0}")]
    Projection(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// Map a reqwest failure to the taxonomy, tagging the upstream service.
    pub fn from_reqwest(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::Timeout {
                service: service.to_string(),
            }
        } else if err.is_decode() {
            EngineError::Malformed {
                service: service.to_string(),
                message: err.to_string(),
            }
        } else {
            EngineError::Unavailable {
                service: service.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout { .. })
    }

    /// Check if this is a network/availability failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_service() {
        let err = EngineError::Timeout {
            service: "ann".to_string(),
        };
        assert_eq!(err.to_string(), "ann timed out");
        assert!(err.is_timeout());

        let err = EngineError::Unavailable {
            service: "completion".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("completion"));
        assert!(err.is_unavailable());
    }
}
