//! Named callables over [`Value`]s.
//!
//! A [`Function`] is the only way the pipeline reaches student code. Native Rust closures and out-of-process
//! loaders both end up here, so the runner treats them identically.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::value::Value;

/// An error raised while calling a student function.
///
/// Any `CallError` counts as an *error* outcome, never as a *failure*.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The student code raised (for Python modules: an exception escaped the function).
    #[error("{kind}: {message}")]
    Raised { kind: String, message: String },

    #[error("{function}() takes {expected} positional argument(s) but {got} were given")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("TypeError: {0}")]
    Type(String),

    /// The callable panicked; the runner converts unwinding panics into this variant.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl CallError {
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CallError::Raised {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

type Callable = dyn Fn(&[Value]) -> Result<Value, CallError>;

/// A named callable. Cloning is cheap; clones share the same underlying callable.
#[derive(Clone)]
pub struct Function {
    name: String,
    callable: Rc<Callable>,
}

impl Function {
    pub fn new(name: impl Into<String>, callable: Rc<Callable>) -> Self {
        Self {
            name: name.into(),
            callable,
        }
    }

    /// Wrap a closure as a function.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + 'static,
    {
        Self::new(name, Rc::new(f))
    }

    /// Name used in unit names and reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, CallError> {
        (self.callable)(args)
    }

    /// Check that exactly `expected` arguments were supplied.
    ///
    /// Helper for native closures that want Python-style arity errors.
    pub fn check_arity(&self, args: &[Value], expected: usize) -> Result<(), CallError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(CallError::Arity {
                function: self.name.clone(),
                expected,
                got: args.len(),
            })
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_forwards_arguments() {
        let add = Function::from_fn("add", |args| match args {
            [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
            _ => Err(CallError::Type("expected two ints".to_string())),
        });
        assert_eq!(add.call(&[Value::Int(2), Value::Int(3)]), Ok(Value::Int(5)));
        assert_eq!(add.name(), "add");
    }

    #[test]
    fn test_clones_share_callable() {
        let f = Function::from_fn("one", |_| Ok(Value::Int(1)));
        let g = f.clone();
        assert_eq!(g.call(&[]), Ok(Value::Int(1)));
        assert_eq!(g.name(), f.name());
    }

    #[test]
    fn test_check_arity_message() {
        let f = Function::from_fn("square", |_| Ok(Value::None));
        let err = f.check_arity(&[], 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "square() takes 1 positional argument(s) but 0 were given"
        );
    }

    #[test]
    fn test_raised_display() {
        let err = CallError::raised("ZeroDivisionError", "division by zero");
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
    }
}
