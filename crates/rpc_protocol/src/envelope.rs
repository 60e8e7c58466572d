//! Request and response envelopes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ErrorObject;

/// A single call: the method to invoke and its params.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Method name. Empty when the client omitted it or sent `null`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub method: String,
    /// Optional parameters. `null` is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Creates a new request.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of a call. Serializes as `{"result": ...}` or `{"error": {...}}`,
/// never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    /// Successful call.
    Result(Value),
    /// Failed call.
    Error(ErrorObject),
}

impl Response {
    /// Creates a success response.
    pub fn success(result: Value) -> Self {
        Response::Result(result)
    }

    /// Creates an error response.
    pub fn error(error: ErrorObject) -> Self {
        Response::Error(error)
    }

    /// Returns the result value if the call succeeded.
    pub fn result(&self) -> Option<&Value> {
        match self {
            Response::Result(value) => Some(value),
            Response::Error(_) => None,
        }
    }

    /// Returns the error object if the call failed.
    pub fn error_object(&self) -> Option<&ErrorObject> {
        match self {
            Response::Result(_) => None,
            Response::Error(error) => Some(error),
        }
    }

    /// Returns true if the call failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}
