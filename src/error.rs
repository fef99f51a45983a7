//! Error taxonomy for the Google Sheets MCP server.
//!
//! Handlers return `anyhow::Result`; this module classifies those
//! errors into JSON-RPC codes at the server boundary. Sheet-not-found
//! conditions in several tools are deliberately *not* errors — they are
//! returned as `{"error": ...}` payloads (see the tools module).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// JSON-RPC 2.0 error codes plus custom application codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    // Standard JSON-RPC errors (-32700 to -32603)
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,

    // Custom application errors (-32000 to -32099)
    /// No usable credential source found
    AuthenticationError = -32001,
    /// The upstream Sheets/Drive API rejected a request
    BackendError = -32002,
    /// Parameter validation failed
    ValidationError = -32003,
    /// Resource URI did not match `spreadsheet://{id}/info`
    InvalidResourceUri = -32004,
    /// Tool disabled by configuration
    ToolDisabled = -32005,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Retry policy is the caller's concern (spec: this layer never
    /// retries); this flag is advisory only.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::InternalError | ErrorCode::BackendError)
    }

    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::ParseError | ErrorCode::InvalidRequest | ErrorCode::InvalidParams => {
                "client_error"
            }
            ErrorCode::MethodNotFound | ErrorCode::ToolDisabled => "not_found",
            ErrorCode::InternalError => "server_error",
            ErrorCode::AuthenticationError => "configuration_error",
            ErrorCode::BackendError => "backend_error",
            ErrorCode::ValidationError | ErrorCode::InvalidResourceUri => "validation_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Fatal configuration failure: none of the credential sources yielded
/// usable service account material.
#[derive(Debug, Error)]
#[error(
    "no Google credentials found; set CREDENTIALS_CONFIG, GOOGLE_SERVICE_ACCOUNT_KEY, \
     or GOOGLE_CLIENT_EMAIL + GOOGLE_PRIVATE_KEY"
)]
pub struct AuthenticationError;

/// Upstream Sheets/Drive rejection, carrying the original message.
#[derive(Debug, Error)]
#[error("Google API error ({status}): {message}")]
pub struct BackendError {
    pub status: u16,
    pub message: String,
}

/// Malformed resource URI.
#[derive(Debug, Error)]
#[error("invalid spreadsheet resource URI '{uri}': expected spreadsheet://{{spreadsheet_id}}/info")]
pub struct InvalidResourceUri {
    pub uri: String,
}

/// Classify an error for the MCP envelope.
pub fn classify(error: &anyhow::Error) -> ErrorCode {
    if error.downcast_ref::<AuthenticationError>().is_some() {
        return ErrorCode::AuthenticationError;
    }
    if error.downcast_ref::<BackendError>().is_some() {
        return ErrorCode::BackendError;
    }
    if error.downcast_ref::<InvalidResourceUri>().is_some() {
        return ErrorCode::InvalidResourceUri;
    }

    let message = error.to_string().to_lowercase();
    if message.contains("credentials") {
        ErrorCode::AuthenticationError
    } else if message.contains("invalid") || message.contains("malformed") {
        ErrorCode::ValidationError
    } else {
        ErrorCode::InternalError
    }
}

/// Convert a handler error into the protocol-level failure shape.
pub fn to_rmcp_error(error: anyhow::Error) -> rmcp::ErrorData {
    let code = classify(&error);
    let data = serde_json::json!({
        "code": code.code(),
        "category": code.category(),
        "retryable": code.is_retryable(),
    });

    tracing::debug!(error_code = %code, category = code.category(), "tool error");

    match code {
        ErrorCode::InvalidRequest | ErrorCode::ToolDisabled => {
            rmcp::ErrorData::invalid_request(error.to_string(), Some(data))
        }
        ErrorCode::InvalidParams | ErrorCode::ValidationError | ErrorCode::InvalidResourceUri => {
            rmcp::ErrorData::invalid_params(error.to_string(), Some(data))
        }
        ErrorCode::MethodNotFound => rmcp::ErrorData::new(
            rmcp::model::ErrorCode::METHOD_NOT_FOUND,
            error.to_string(),
            Some(data),
        ),
        _ => rmcp::ErrorData::internal_error(error.to_string(), Some(data)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_values() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::AuthenticationError.code(), -32001);
        assert_eq!(ErrorCode::BackendError.code(), -32002);
    }

    #[test]
    fn error_categories() {
        assert_eq!(ErrorCode::InvalidParams.category(), "client_error");
        assert_eq!(ErrorCode::InternalError.category(), "server_error");
        assert_eq!(
            ErrorCode::AuthenticationError.category(),
            "configuration_error"
        );
        assert_eq!(ErrorCode::BackendError.category(), "backend_error");
    }

    #[test]
    fn classify_downcasts_before_message_matching() {
        let err = anyhow::Error::new(BackendError {
            status: 403,
            message: "The caller does not have permission".to_string(),
        });
        assert_eq!(classify(&err), ErrorCode::BackendError);

        let err = anyhow::Error::new(AuthenticationError);
        assert_eq!(classify(&err), ErrorCode::AuthenticationError);

        let err = anyhow::anyhow!("something unexpected");
        assert_eq!(classify(&err), ErrorCode::InternalError);
    }

    #[test]
    fn retryable_errors() {
        assert!(ErrorCode::BackendError.is_retryable());
        assert!(!ErrorCode::ValidationError.is_retryable());
        assert!(!ErrorCode::AuthenticationError.is_retryable());
    }
}
