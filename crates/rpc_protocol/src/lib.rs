//! Wire envelope definitions for the JSON-RPC dispatch layer.
//!
//! A request names a method and optionally carries params:
//!
//! ```json
//! { "method": "Hello", "params": { "name": "world" } }
//! ```
//!
//! A response carries exactly one of `result` or `error`:
//!
//! ```json
//! { "result": { "message": "Hello, world" } }
//! { "error": { "code": "method_not_found", "message": "method 'Nope' not found" } }
//! ```

mod envelope;
mod error;

pub use envelope::*;
pub use error::*;
