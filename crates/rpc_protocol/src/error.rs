//! Error objects carried in the `error` field of a response.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes emitted by the dispatcher itself.
pub mod error_codes {
    /// The method does not exist or the request did not name one.
    pub const METHOD_NOT_FOUND: &str = "method_not_found";
    /// The params could not be decoded into the handler's parameter type.
    pub const INVALID_PARAMS: &str = "invalid_params";
    /// Any error that was not explicitly constructed for the client.
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Message sent for sanitized internal errors.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Message sent for params that fail to decode.
pub const INVALID_PARAMS_MESSAGE: &str = "invalid params";

/// Error code, either a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// Numeric code.
    Number(i64),
    /// String code.
    String(String),
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        ErrorCode::String(code.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        ErrorCode::String(code)
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Number(code)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        ErrorCode::Number(i64::from(code))
    }
}

impl PartialEq<&str> for ErrorCode {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, ErrorCode::String(code) if code == other)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(code) => write!(f, "{}", code),
            ErrorCode::String(code) => f.write_str(code),
        }
    }
}

/// Client-visible error object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Error code
    pub code: ErrorCode,
    /// Error message
    pub message: String,
}

impl ErrorObject {
    /// Creates a new error
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a method not found error.
    ///
    /// An empty `method` means the request did not name one.
    pub fn method_not_found(method: &str) -> Self {
        let message = if method.is_empty() {
            "method not found".to_string()
        } else {
            format!("method '{}' not found", method)
        };
        Self::new(error_codes::METHOD_NOT_FOUND, message)
    }

    /// Creates an invalid params error
    pub fn invalid_params() -> Self {
        Self::new(error_codes::INVALID_PARAMS, INVALID_PARAMS_MESSAGE)
    }

    /// Creates an internal error with the generic message
    pub fn internal_error() -> Self {
        Self::new(error_codes::INTERNAL_ERROR, INTERNAL_ERROR_MESSAGE)
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_code_serialization() {
        let error = ErrorObject::method_not_found("Missing");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["code"], "method_not_found");
        assert_eq!(json["message"], "method 'Missing' not found");
    }

    #[test]
    fn test_numeric_code_serialization() {
        let error = ErrorObject::new(-32001, "rate limited");
        let json = serde_json::to_string(&error).unwrap();

        assert_eq!(json, r#"{"code":-32001,"message":"rate limited"}"#);
    }

    #[test]
    fn test_code_deserializes_either_form() {
        let numeric: ErrorObject =
            serde_json::from_str(r#"{"code":42,"message":"m"}"#).unwrap();
        let text: ErrorObject =
            serde_json::from_str(r#"{"code":"not_allowed","message":"m"}"#).unwrap();

        assert_eq!(numeric.code, ErrorCode::Number(42));
        assert_eq!(text.code, "not_allowed");
    }

    #[test]
    fn test_method_not_found_without_name() {
        let error = ErrorObject::method_not_found("");
        assert_eq!(error.message, "method not found");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ErrorObject::internal_error().to_string(),
            "[internal_error] internal error"
        );
    }
}
