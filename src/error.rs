//! Error types for talking to the answering service.

use thiserror::Error;

/// Everything that can go wrong between sending a message and reading the answer.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request never produced a response (connect, DNS, I/O).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{}", describe_status(.status, .body))]
    Status { status: u16, body: String },

    /// A success status whose body was not the expected JSON.
    #[error("Unexpected response from backend: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// The background request task panicked or was cancelled.
    #[error("Request task failed: {0}")]
    Task(String),
}

/// Prefer the body the server sent; fall back to the status code.
fn describe_status(status: &u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("Request failed with status {}", status)
    } else {
        body.to_string()
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_uses_body_when_present() {
        let err = ChatError::Status {
            status: 500,
            body: "upstream timeout".to_string(),
        };
        assert_eq!(err.to_string(), "upstream timeout");
    }

    #[test]
    fn status_error_falls_back_to_code() {
        let err = ChatError::Status {
            status: 502,
            body: "  \n".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed with status 502");
    }

    #[test]
    fn malformed_error_mentions_parse_failure() {
        let parse = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ChatError::from(parse);
        assert!(err.to_string().starts_with("Unexpected response from backend"));
    }
}
