//! Sequential suite execution and outcome tallying.
//!
//! ## RunObserver Trait
//!
//! Progress reporting is separated from execution through [`RunObserver`]. The runner calls the observer around
//! every unit; console output, JSON, or nothing at all are just different observers.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::compare::{Verdict, check};
use crate::function::CallError;
use crate::suite::{Suite, TestUnit};

/// Outcome of a single unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    /// The comparison did not hold.
    Failed(String),
    /// The function raised, panicked, or produced a value that could not be compared.
    Errored(String),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Hooks called while a suite runs.
pub trait RunObserver {
    /// Called once before the first unit.
    fn on_run_start(&mut self, _total: usize) {}

    /// Called before a unit executes.
    fn on_unit_start(&mut self, _unit: &TestUnit) {}

    /// Called after a unit executes.
    fn on_unit_complete(&mut self, _unit: &TestUnit, _outcome: &Outcome) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Per-unit record kept in the [`RunResult`].
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub index: usize,
    pub name: String,
    pub outcome: Outcome,
    pub duration: Duration,
}

/// Tally of one run. Derived from the suite each time; nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub total: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration: Duration,
    pub reports: Vec<UnitReport>,
}

impl RunResult {
    pub fn passed(&self) -> usize {
        self.total - self.failed - self.errored
    }

    /// True when nothing failed or errored. An empty run is a success.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitReport> {
        self.reports.iter().filter(|r| matches!(r.outcome, Outcome::Failed(_)))
    }

    pub fn errors(&self) -> impl Iterator<Item = &UnitReport> {
        self.reports.iter().filter(|r| matches!(r.outcome, Outcome::Errored(_)))
    }
}

/// Run every unit of `suite` in order.
pub fn run(suite: &Suite) -> RunResult {
    run_observed(suite, &mut NoopObserver)
}

/// Run every unit of `suite` in order, notifying `observer` as units start and finish.
///
/// Execution never stops early: a failing or erroring unit is tallied and the next one runs.
#[tracing::instrument(skip_all, fields(unit_count = suite.len()))]
pub fn run_observed(suite: &Suite, observer: &mut dyn RunObserver) -> RunResult {
    let start = Instant::now();
    let mut result = RunResult::default();

    observer.on_run_start(suite.len());

    for unit in suite {
        observer.on_unit_start(unit);

        let unit_start = Instant::now();
        let outcome = execute_unit(unit);
        let duration = unit_start.elapsed();

        result.total += 1;
        match &outcome {
            Outcome::Passed => {}
            Outcome::Failed(_) => result.failed += 1,
            Outcome::Errored(_) => result.errored += 1,
        }
        tracing::debug!(unit = %unit.name, ?outcome, "unit complete");

        observer.on_unit_complete(unit, &outcome);
        result.reports.push(UnitReport {
            index: unit.index,
            name: unit.name.clone(),
            outcome,
            duration,
        });
    }

    result.duration = start.elapsed();
    result
}

/// Call the unit's function and compare the result.
fn execute_unit(unit: &TestUnit) -> Outcome {
    let case = &unit.case;
    let call = panic::catch_unwind(AssertUnwindSafe(|| case.function().call(case.args())));

    let actual = match call {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => return Outcome::Errored(err.to_string()),
        Err(payload) => return Outcome::Errored(CallError::Panicked(panic_message(payload.as_ref())).to_string()),
    };

    match check(&actual, case.expected(), case.tolerance()) {
        Verdict::Match => Outcome::Passed,
        Verdict::Mismatch(msg) => Outcome::Failed(msg),
        Verdict::Incomparable(msg) => Outcome::Errored(msg),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
