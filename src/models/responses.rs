//! Response DTOs for the catalog API
//!
//! Products and pages serialize themselves; only the envelope types live here.

use serde::Serialize;

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
    /// Current timestamp in RFC 3339 format
    pub timestamp: String,
    /// "up", "down" or "disabled"
    pub cache: String,
}

impl HealthResponse {
    pub fn healthy(cache: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            cache: cache.into(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy("up");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(json.contains(r#""cache":"up""#));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}
