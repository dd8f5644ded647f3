//! Suite construction: one named unit per recorded expectation.

use std::fmt::Write as _;

use crate::recorder::{Expectation, Recorder};

/// A single executable comparison.
#[derive(Debug, Clone)]
pub struct TestUnit {
    /// 1-based position in the suite.
    pub index: usize,
    /// Human-readable name, e.g. `test_1: add(1, 2) = 3`.
    pub name: String,
    pub case: Expectation,
}

/// An ordered collection of test units, built fresh for every run.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    units: Vec<TestUnit>,
}

impl Suite {
    /// Build a suite from everything recorded so far.
    ///
    /// The suite always holds exactly `recorder.len()` units, in recording order.
    #[tracing::instrument(skip_all, fields(case_count = recorder.len()))]
    pub fn build(recorder: &Recorder) -> Self {
        let units = recorder
            .cases()
            .iter()
            .enumerate()
            .map(|(i, case)| {
                let index = i + 1;
                TestUnit {
                    index,
                    name: unit_name(index, case),
                    case: case.clone(),
                }
            })
            .collect();
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[TestUnit] {
        &self.units
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestUnit> {
        self.units.iter()
    }
}

impl<'a> IntoIterator for &'a Suite {
    type Item = &'a TestUnit;
    type IntoIter = std::slice::Iter<'a, TestUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

/// `test_{index}: {function}{args as a tuple} = {expected}`
fn unit_name(index: usize, case: &Expectation) -> String {
    let mut name = format!("test_{}: {}(", index, case.function().name());
    for (i, arg) in case.args().iter().enumerate() {
        if i > 0 {
            name.push_str(", ");
        }
        let _ = write!(name, "{}", arg);
    }
    if case.args().len() == 1 {
        name.push(',');
    }
    let _ = write!(name, ") = {}", case.expected());
    name
}
