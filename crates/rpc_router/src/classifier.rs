//! Turns handler errors into client-visible error objects.

use rpc_protocol::{error_codes, ErrorObject};

use crate::error::RpcError;

/// Renders `error` for the client.
///
/// Public errors keep their code and message. Internal errors get the
/// generic `internal_error` code; their message is replaced by a fixed string
/// unless `dump_errors` is set, in which case the full error chain is sent.
pub fn classify(error: &RpcError, dump_errors: bool) -> ErrorObject {
    match error {
        RpcError::Public { code, message, .. } => ErrorObject::new(code.clone(), message.clone()),
        RpcError::Internal(error) if dump_errors => {
            ErrorObject::new(error_codes::INTERNAL_ERROR, format!("{:#}", error))
        }
        RpcError::Internal(_) => ErrorObject::internal_error(),
    }
}
