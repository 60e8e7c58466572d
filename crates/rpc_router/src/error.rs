//! Error types.

use std::fmt;

use rpc_protocol::{error_codes, ErrorCode};

/// Result type returned by handlers and middleware.
pub type RpcResult<T> = Result<T, RpcError>;

/// Error returned from a handler or middleware.
///
/// `Public` errors reach the client unchanged. `Internal` errors are
/// sanitized before rendering unless error dumping is enabled on the
/// dispatcher.
///
/// Any `std::error::Error` converts into `Internal`, so handlers can use `?`
/// freely and opt in to client-facing errors with [`RpcError::public`].
pub enum RpcError {
    /// Error meant for the client.
    Public {
        /// Error code
        code: ErrorCode,
        /// Error message
        message: String,
        /// Underlying cause. Logged, never sent to the client.
        cause: Option<anyhow::Error>,
    },
    /// Any other failure.
    Internal(anyhow::Error),
}

impl RpcError {
    /// Creates an error that is rendered to the client as-is.
    pub fn public(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        RpcError::Public {
            code: code.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Creates an internal error from a message.
    pub fn internal<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        RpcError::Internal(anyhow::Error::msg(message))
    }

    /// Attaches an internal cause to a public error. Internal errors are
    /// returned unchanged.
    pub fn with_cause(self, cause: impl Into<anyhow::Error>) -> Self {
        match self {
            RpcError::Public { code, message, .. } => RpcError::Public {
                code,
                message,
                cause: Some(cause.into()),
            },
            internal => internal,
        }
    }

    pub(crate) fn method_not_found(method: &str) -> Self {
        let error = rpc_protocol::ErrorObject::method_not_found(method);
        RpcError::public(error.code, error.message)
    }

    pub(crate) fn invalid_params() -> Self {
        RpcError::public(
            error_codes::INVALID_PARAMS,
            rpc_protocol::INVALID_PARAMS_MESSAGE,
        )
    }

    /// Returns true if the error is rendered to the client unchanged.
    pub fn is_public(&self) -> bool {
        matches!(self, RpcError::Public { .. })
    }

    /// Returns the public error code, if any.
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            RpcError::Public { code, .. } => Some(code),
            RpcError::Internal(_) => None,
        }
    }
}

impl<E> From<E> for RpcError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        RpcError::Internal(anyhow::Error::new(error))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Public {
                code,
                message,
                cause: Some(cause),
            } => write!(f, "[{}] {}: {:#}", code, message, cause),
            RpcError::Public { code, message, .. } => write!(f, "[{}] {}", code, message),
            RpcError::Internal(error) => write!(f, "{:#}", error),
        }
    }
}

impl fmt::Debug for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Public {
                code,
                message,
                cause,
            } => f
                .debug_struct("Public")
                .field("code", code)
                .field("message", message)
                .field("cause", cause)
                .finish(),
            RpcError::Internal(error) => f.debug_tuple("Internal").field(error).finish(),
        }
    }
}

/// Errors raised while registering methods.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A method with this name is already registered.
    #[error("method '{0}' is already registered")]
    DuplicateMethod(String),

    /// Method names must not be empty.
    #[error("method name must not be empty")]
    EmptyName,
}
