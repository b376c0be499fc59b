//! Tagged host value model.
//!
//! The host environment traffics in rich value types; the adapter needs only
//! a narrow capability set from them: is it callable, can a number be pulled
//! out, and is it a promise whose settlement can be queried. [`Value`] is the
//! tagged union over exactly that set. Everything else about host values is
//! out of scope.

use crate::error::BridgeError;
use crate::promise::Promise;
use std::fmt;
use std::sync::Arc;

/// A host function callable from inside a frame.
///
/// The `Err` arm of a call is a raise reason, not an adapter error: a host
/// function that fails rejects the computation that called it.
#[derive(Clone)]
pub struct HostFn(Arc<dyn Fn(Value) -> Result<Value, Value> + Send + Sync>);

impl HostFn {
    /// Wraps a host function.
    pub fn new(f: impl Fn(Value) -> Result<Value, Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invokes the function with one argument.
    pub fn call(&self, argument: Value) -> Result<Value, Value> {
        (self.0)(argument)
    }
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostFn")
    }
}

/// An opaque host value, narrowed to the variants the adapter can act on.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absent value; what a frame resumes with before any await.
    Undefined,
    /// A host number.
    Number(f64),
    /// Host text; doubles as the usual shape of a rejection reason.
    Text(Arc<str>),
    /// A callable host function.
    Function(HostFn),
    /// A future value settled by the host event loop.
    Promise(Promise),
}

impl Value {
    /// Creates a number value.
    #[must_use]
    pub const fn number(n: f64) -> Self {
        Self::Number(n)
    }

    /// Creates a text value.
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(text.as_ref()))
    }

    /// Creates a callable value from a host function.
    pub fn function(f: impl Fn(Value) -> Result<Value, Value> + Send + Sync + 'static) -> Self {
        Self::Function(HostFn::new(f))
    }

    /// True when [`Value::call`] would succeed in dispatching.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// Invokes a callable value; a non-callable receiver raises.
    pub fn call(&self, argument: Value) -> Result<Value, Value> {
        match self {
            Self::Function(f) => f.call(argument),
            _ => Err(BridgeError::NotCallable.into()),
        }
    }

    /// Extracts a number, or reports which variant got in the way.
    pub fn expect_number(&self) -> Result<f64, BridgeError> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(BridgeError::TypeMismatch {
                expected: "number",
                found: other.type_name(),
            }),
        }
    }

    /// Settlement-query capability: the promise behind this value, if any.
    #[must_use]
    pub const fn as_promise(&self) -> Option<&Promise> {
        match self {
            Self::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// A stable variant name for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Function(_) => "function",
            Self::Promise(_) => "promise",
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for plain data, identity for functions and
    /// promises.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(&a.0, &b.0),
            (Self::Promise(a), Self::Promise(b)) => a.same(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_functions_are_callable() {
        assert!(Value::function(Ok).is_callable());
        assert!(!Value::Undefined.is_callable());
        assert!(!Value::number(1.0).is_callable());
        assert!(!Value::text("f").is_callable());
    }

    #[test]
    fn calling_a_non_callable_raises_not_callable() {
        let raised = Value::number(7.0).call(Value::Undefined).unwrap_err();
        assert_eq!(raised, Value::text("entry point is not callable"));
    }

    #[test]
    fn call_forwards_argument_and_result() {
        let double = Value::function(|arg| Ok(Value::number(arg.expect_number()? * 2.0)));
        assert_eq!(
            double.call(Value::number(21.0)),
            Ok(Value::number(42.0))
        );
    }

    #[test]
    fn host_function_failure_is_a_raise_reason() {
        let failing = Value::function(|_| Err(Value::text("boom")));
        assert_eq!(failing.call(Value::Undefined), Err(Value::text("boom")));
    }

    #[test]
    fn expect_number_reports_found_variant() {
        let err = Value::text("five").expect_number().unwrap_err();
        assert_eq!(
            err,
            BridgeError::TypeMismatch {
                expected: "number",
                found: "text",
            }
        );
    }

    #[test]
    fn equality_is_structural_for_data_and_identity_for_functions() {
        assert_eq!(Value::text("x"), Value::text("x"));
        assert_eq!(Value::number(2.0), Value::number(2.0));
        let f = Value::function(Ok);
        assert_eq!(f, f.clone());
        assert_ne!(f, Value::function(Ok));
        assert_ne!(Value::number(0.0), Value::Undefined);
    }
}
