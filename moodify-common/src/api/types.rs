//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint
///
/// # Examples
///
/// ```
/// use moodify_common::api::types::ErrorResponse;
///
/// let body = ErrorResponse::new("History entry not found");
/// assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"error":"History entry not found"}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Plain acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_response_serialization() {
        let body = MessageResponse::new("All history cleared successfully");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "All history cleared successfully");
    }
}
