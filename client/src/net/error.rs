//! Error taxonomy for backend calls.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Errors produced by the transport and the API client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend rejected the credential (HTTP 401).
    #[error("unauthorized")]
    Unauthorized { message: Option<String> },

    /// Any other 4xx: validation failures, not found, forbidden.
    #[error("request rejected: status {status}")]
    Rejected { status: u16, message: Option<String> },

    /// 5xx responses.
    #[error("server error: status {status}")]
    Server { status: u16, message: Option<String> },

    /// A success body did not have the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Classify a non-success status and its decoded body.
    #[must_use]
    pub fn from_status(status: u16, body: &serde_json::Value) -> Self {
        let message = body_message(body);
        match status {
            401 => Self::Unauthorized { message },
            500..=599 => Self::Server { status, message },
            _ => Self::Rejected { status, message },
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport(_) | Self::Parse(_) | Self::HttpClientBuild(_) => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The human-readable `message` the backend attached, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Rejected { message, .. } | Self::Server { message, .. } => {
                message.as_deref()
            }
            Self::Transport(_) | Self::Parse(_) | Self::HttpClientBuild(_) => None,
        }
    }

    /// Backend message when present, otherwise the caller's generic default.
    #[must_use]
    pub fn message_or(&self, default: &str) -> String {
        self.server_message()
            .map_or_else(|| default.to_owned(), str::to_owned)
    }
}

fn body_message(body: &serde_json::Value) -> Option<String> {
    body.get("message")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}
