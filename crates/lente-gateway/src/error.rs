//! # Gateway Error Type
//!
//! Every failure that crosses the adapter boundary is a [`GatewayError`]
//! carrying a stable code, a human message and optional diagnostic details
//! (usually the gateway's own response body).
//!
//! ## Codes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INVALID_CONFIG     configuration missing or malformed                 │
//! │  INVALID_REQUEST    caller input rejected before any network call      │
//! │  AUTH_FAILED        token exchange refused                             │
//! │  UNAUTHORIZED       401 even after re-authentication                   │
//! │  TIMEOUT            no response within the configured timeout          │
//! │  TRANSPORT_ERROR    DNS, TLS, connection reset, ...                    │
//! │  NOT_FOUND          unknown nosso número                               │
//! │  REJECTED           4xx from the gateway (details = response body)     │
//! │  UPSTREAM_ERROR     5xx from the gateway                               │
//! │  DECODE_ERROR       response body did not match the wire contract      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `TIMEOUT` means the outcome is unknown, not that the call failed: a
//! boleto may have been registered anyway and must be reconciled through a
//! status query.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
pub const AUTH_FAILED: &str = "AUTH_FAILED";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const TIMEOUT: &str = "TIMEOUT";
pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const REJECTED: &str = "REJECTED";
pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
pub const DECODE_ERROR: &str = "DECODE_ERROR";

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{code}: {message}")]
pub struct GatewayError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl GatewayError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        GatewayError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(INVALID_CONFIG, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(DECODE_ERROR, message)
    }

    /// Maps a non-success HTTP response. `body` becomes the details: parsed
    /// as JSON when possible, kept as a string otherwise.
    pub fn from_status(status: u16, body: &str) -> Self {
        let (code, message) = match status {
            401 | 403 => (UNAUTHORIZED, "Gateway refused the credentials"),
            404 => (NOT_FOUND, "Boleto not found at the gateway"),
            400..=499 => (REJECTED, "Gateway rejected the request"),
            _ => (UPSTREAM_ERROR, "Gateway failed to process the request"),
        };

        let body_value = serde_json::from_str::<Value>(body)
            .unwrap_or_else(|_| Value::String(body.to_string()));

        GatewayError::new(code, format!("{message} (HTTP {status})")).with_details(
            serde_json::json!({
                "status": status,
                "body": body_value,
            }),
        )
    }

    /// True when the outcome of the call is unknown and must be reconciled.
    pub fn is_timeout(&self) -> bool {
        self.code == TIMEOUT
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code == UNAUTHORIZED
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::new(TIMEOUT, "Gateway did not respond in time")
        } else if err.is_decode() {
            GatewayError::decode(err.to_string())
        } else if let Some(status) = err.status() {
            GatewayError::from_status(status.as_u16(), "")
        } else {
            GatewayError::new(TRANSPORT_ERROR, err.to_string())
        }
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::invalid_config(format!("Failed to parse gateway config: {err}"))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::invalid_config(format!("Failed to read gateway config: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::from_status(401, "").code, UNAUTHORIZED);
        assert_eq!(GatewayError::from_status(404, "").code, NOT_FOUND);
        assert_eq!(GatewayError::from_status(422, "").code, REJECTED);
        assert_eq!(GatewayError::from_status(503, "").code, UPSTREAM_ERROR);
    }

    #[test]
    fn test_details_keep_json_body() {
        let err = GatewayError::from_status(400, r#"{"mensagem":"CPF inválido"}"#);
        let details = err.details.unwrap();
        assert_eq!(details["status"], 400);
        assert_eq!(details["body"]["mensagem"], "CPF inválido");

        let err = GatewayError::from_status(502, "Bad Gateway");
        assert_eq!(err.details.unwrap()["body"], "Bad Gateway");
    }

    #[test]
    fn test_display_includes_code() {
        let err = GatewayError::invalid_request("amount must be positive");
        assert_eq!(err.to_string(), "INVALID_REQUEST: amount must be positive");
        assert!(!err.is_timeout());
    }
}
