use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Message used when the server gave none.
pub const FALLBACK_MESSAGE: &str = "API error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    /// 2xx response whose body carries `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Text suitable for a notice.
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } | Self::Rejected { message } => message.clone(),
            Self::Transport(e) => e.to_string(),
            Self::Decode(_) => String::from(FALLBACK_MESSAGE),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Pulls a message from `message` or `data.message`.
pub fn extract_message(body: &serde_json::Value) -> String {
    body.get("message")
        .and_then(|m| m.as_str())
        .or_else(|| {
            body.get("data")
                .and_then(|d| d.get("message"))
                .and_then(|m| m.as_str())
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(FALLBACK_MESSAGE)
        .to_string()
}
