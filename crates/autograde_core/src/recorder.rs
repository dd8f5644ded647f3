//! Expectation recording.
//!
//! A [`Recorder`] is an ordered, caller-owned list of [`Expectation`]s. Recording never calls the function and
//! never validates anything; problems surface when the suite runs.

use crate::function::Function;
use crate::value::Value;

/// One declared comparison: `function(*args)` should equal `expected` (within `tolerance` when given).
#[derive(Debug, Clone)]
pub struct Expectation {
    function: Function,
    args: Vec<Value>,
    expected: Value,
    tolerance: Option<f64>,
}

impl Expectation {
    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }

    pub fn tolerance(&self) -> Option<f64> {
        self.tolerance
    }
}

/// Ordered collection of expectations for one run.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    cases: Vec<Expectation>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an expectation.
    pub fn record(&mut self, function: Function, args: Vec<Value>, expected: Value, tolerance: Option<f64>) {
        self.cases.push(Expectation {
            function,
            args,
            expected,
            tolerance,
        });
    }

    /// Record an exact-equality expectation.
    pub fn expect<A, E>(&mut self, function: &Function, args: A, expected: E)
    where
        A: IntoIterator,
        A::Item: Into<Value>,
        E: Into<Value>,
    {
        let args = args.into_iter().map(Into::into).collect();
        self.record(function.clone(), args, expected.into(), None);
    }

    /// Record an expectation compared within an absolute `tolerance`.
    pub fn expect_approx<A, E>(&mut self, function: &Function, args: A, expected: E, tolerance: f64)
    where
        A: IntoIterator,
        A::Item: Into<Value>,
        E: Into<Value>,
    {
        let args = args.into_iter().map(Into::into).collect();
        self.record(function.clone(), args, expected.into(), Some(tolerance));
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn cases(&self) -> &[Expectation] {
        &self.cases
    }

    pub fn clear(&mut self) {
        self.cases.clear();
    }
}
