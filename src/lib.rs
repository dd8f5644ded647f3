#![forbid(unsafe_code)]
//! Autograding harness
//!
//! Turns an instructor's declarative test cases into a suite of comparison units, runs them against a student's
//! code, prints a pass/fail/error summary, and then lints and type checks the submission with external tools.
//!
//! The pure pipeline (recording, suite construction, comparison, tallying) lives in `autograde_core`. This crate
//! adds everything that touches the outside world: the Python module loader, lesson files, the quality gate,
//! console reporting and the CLI.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Student code**: A panicking native function is caught by the runner and counted as an error.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod gate;
pub mod json;
pub mod lesson;
pub mod module;
pub mod python;
pub mod report;
pub mod version;
pub mod workspace;

pub use autograde_core::{CallError, Function, Recorder, RunResult, Suite, Value};
pub use cli::commands::summarize;
pub use config::HarnessConfig;
pub use lesson::{LessonFile, LessonSource, TestBuilder};
pub use module::{NativeModule, StudentModule};
pub use python::PythonModule;
pub use report::Palette;
