//! Persisted audit-log shapes for the revalidate dispatch engine.
//!
//! The engine stores its audit trail as a JSON array, newest entry first.
//! Admin viewers read the same array back through these types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Final classification of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Success,
    Error,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Success => "success",
            AttemptStatus::Error => "error",
        }
    }
}

/// Outbound request as it was sent, with the auth token redacted from `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    /// Request timeout in seconds.
    pub timeout: u64,
}

/// Response received from the revalidation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponseRecord {
    pub code: u16,
    pub message: String,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

/// Transport-level failure; no HTTP status was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFailure {
    pub error: bool,
    pub message: String,
    pub code: String,
}

impl TransportFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseRecord {
    Transport(TransportFailure),
    Http(HttpResponseRecord),
}

/// One entry of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchAttempt {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub path: String,
    pub status: AttemptStatus,
    pub status_code: Option<u16>,
    pub request: RequestRecord,
    pub response: ResponseRecord,
}

impl DispatchAttempt {
    pub fn is_success(&self) -> bool {
        self.status == AttemptStatus::Success
    }

    pub fn transport_failure(&self) -> Option<&TransportFailure> {
        match &self.response {
            ResponseRecord::Transport(failure) => Some(failure),
            ResponseRecord::Http(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn request() -> RequestRecord {
        RequestRecord {
            url: "https://front.example/api/revalidate?token=%5Bredacted%5D&path=%2F".to_string(),
            method: "GET".to_string(),
            headers: BTreeMap::from([("User-Agent".to_string(), "revalidate/0.3.0".to_string())]),
            timeout: 30,
        }
    }

    #[test]
    fn status_renders_lowercase() {
        let json = serde_json::to_string(&AttemptStatus::Error).expect("serialize status");
        assert_eq!(json, "\"error\"");
        assert_eq!(AttemptStatus::Success.as_str(), "success");
    }

    #[test]
    fn transport_failure_round_trips_as_transport_variant() {
        let attempt = DispatchAttempt {
            timestamp: datetime!(2026-03-01 12:00:00 UTC),
            path: "/".to_string(),
            status: AttemptStatus::Error,
            status_code: None,
            request: request(),
            response: ResponseRecord::Transport(TransportFailure::new("timeout", "timed out")),
        };

        let value = serde_json::to_value(&attempt).expect("serialize attempt");
        assert_eq!(value["response"]["error"], serde_json::Value::Bool(true));
        assert_eq!(value["timestamp"], "2026-03-01T12:00:00Z");

        let decoded: DispatchAttempt = serde_json::from_value(value).expect("decode attempt");
        assert_eq!(decoded.transport_failure().map(|f| f.code.as_str()), Some("timeout"));
    }

    #[test]
    fn http_response_decodes_as_http_variant() {
        let value = serde_json::json!({
            "timestamp": "2026-03-01T12:00:00Z",
            "path": "/blog/",
            "status": "error",
            "status_code": 503,
            "request": {
                "url": "https://front.example/api/revalidate",
                "method": "GET",
                "headers": {},
                "timeout": 30
            },
            "response": {
                "code": 503,
                "message": "Service Unavailable",
                "body": "down",
                "headers": {}
            }
        });

        let decoded: DispatchAttempt = serde_json::from_value(value).expect("decode attempt");
        assert!(!decoded.is_success());
        assert!(decoded.transport_failure().is_none());
        assert!(matches!(decoded.response, ResponseRecord::Http(ref r) if r.code == 503));
    }
}
