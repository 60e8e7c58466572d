//! Parameter binding.
//!
//! Each registered method carries its own decode closure, built from the
//! handler's parameter type at registration time. Decode failures are always
//! reported with the same public `invalid_params` error; the serde message is
//! only logged.

use std::{any::Any, fmt};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{RpcError, RpcResult};

/// Decodes raw params for one method.
pub(crate) type BindFn = Box<dyn Fn(Option<Value>) -> RpcResult<Params> + Send + Sync>;

/// Params for a single call, as seen by middleware and the handler.
///
/// Carries the raw JSON as received and, for methods that declare a
/// parameter type, the decoded value.
pub struct Params {
    raw: Option<Value>,
    decoded: Option<Box<dyn Any + Send>>,
}

impl Params {
    /// Params for a method that takes none.
    pub fn none() -> Self {
        Self {
            raw: None,
            decoded: None,
        }
    }

    /// Raw JSON params as sent by the client.
    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    /// Borrows the decoded params if they are of type `T`.
    pub fn decoded<T: 'static>(&self) -> Option<&T> {
        self.decoded.as_ref()?.downcast_ref::<T>()
    }

    /// Returns true if params were decoded for this call.
    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }

    pub(crate) fn into_decoded<T: 'static>(self) -> Option<T> {
        self.decoded?.downcast::<T>().ok().map(|value| *value)
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("raw", &self.raw)
            .field("decoded", &self.decoded.is_some())
            .finish()
    }
}

/// Binder for a handler that declares a parameter type.
///
/// Absent params decode from `null`, so `Option<T>` and `()` accept a
/// request without params while a struct does not.
pub(crate) fn typed<P>() -> BindFn
where
    P: DeserializeOwned + Send + 'static,
{
    Box::new(|raw: Option<Value>| {
        let value = raw.clone().unwrap_or(Value::Null);
        match serde_json::from_value::<P>(value) {
            Ok(params) => Ok(Params {
                raw,
                decoded: Some(Box::new(params)),
            }),
            Err(error) => {
                debug!(error = %error, "Failed to decode params");
                Err(RpcError::invalid_params())
            }
        }
    })
}

/// Binder for a handler without params. Supplied params are kept raw and
/// never decoded.
pub(crate) fn untyped() -> BindFn {
    Box::new(|raw: Option<Value>| Ok(Params { raw, decoded: None }))
}
