//! Provide the expectation-to-verdict pipeline shared by the autograde CLI and by in-process self-tests.
//!
//! The pipeline runs in four steps:
//! - [`Recorder`] collects declared expectations (function, arguments, expected value, optional tolerance),
//! - [`Suite::build`] turns every expectation into a named [`TestUnit`],
//! - [`run`] executes the units in insertion order and tallies a [`RunResult`],
//! - the caller reports the result (see the `autograde` crate's `report` module).
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state. Recorders are owned by the caller, so
//!   independent runs can coexist in one process.
//! - Student code is reached only through [`Function`], which wraps any callable over [`Value`]s.

pub mod compare;
pub mod function;
pub mod recorder;
pub mod runner;
pub mod suite;
pub mod value;

pub use compare::{Verdict, check};
pub use function::{CallError, Function};
pub use recorder::{Expectation, Recorder};
pub use runner::{NoopObserver, Outcome, RunObserver, RunResult, UnitReport, run, run_observed};
pub use suite::{Suite, TestUnit};
pub use value::Value;
