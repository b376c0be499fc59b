//! Typed adapter errors.
//!
//! These are the synchronous misuse errors of the adapter surface: they are
//! reported to the caller before any suspension and never travel the
//! asynchronous rejection path on their own. Inside a frame they convert into
//! raise reasons via [`From<BridgeError>`], so fixture-style code can
//! propagate them with `?`.

use crate::value::Value;
use thiserror::Error;

/// Errors reported synchronously by the adapter, before any suspension.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The entry point handed to a spawn surface cannot be called.
    #[error("entry point is not callable")]
    NotCallable,

    /// A host value did not have the variant an operation required.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// The variant the operation required.
        expected: &'static str,
        /// The variant actually supplied.
        found: &'static str,
    },
}

impl From<BridgeError> for Value {
    /// Converts an adapter error into a raise reason carrying its message.
    fn from(err: BridgeError) -> Self {
        Self::text(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_callable_display() {
        assert_eq!(
            BridgeError::NotCallable.to_string(),
            "entry point is not callable"
        );
    }

    #[test]
    fn type_mismatch_display_names_both_sides() {
        let err = BridgeError::TypeMismatch {
            expected: "number",
            found: "text",
        };
        assert_eq!(err.to_string(), "expected number, found text");
    }

    #[test]
    fn error_converts_into_raise_reason() {
        let reason: Value = BridgeError::NotCallable.into();
        assert_eq!(reason, Value::text("entry point is not callable"));
    }
}
