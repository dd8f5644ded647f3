//! External quality gate: linting and type checking
//!
//! Both tools run as blocking subprocesses behind the [`ToolRunner`] trait, which separates process spawning from
//! gate logic so the score and exit-code rules can be tested with a fake runner.
//!
//! A gate failure never stops the test portion of a grading run; it only decides the final exit status.

mod lint;
mod typecheck;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

pub use lint::{LintReport, Linter, parse_lint_score};
pub use typecheck::{TypeCheckReport, TypeChecker, highlight_typecheck_output};

use crate::config::HarnessConfig;

/// Errors produced by the quality gate
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Too many linting errors: score {score:.2}/10 is below the required {threshold:.2}")]
    LintScore { score: f64, threshold: f64 },

    #[error("{tool} did not report a score")]
    ScoreUnavailable { tool: String },

    #[error("Failure: please fix type errors ({tool} exited with {exit_code})")]
    TypeCheck { tool: String, exit_code: i32 },

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
}

/// A fully described subprocess call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Program name for messages (`pylint`, `mypy`, ...).
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run an external tool and capture its output.
pub trait ToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput>;
}

/// `std::process::Command` execution with captured output (blocking).
#[derive(Debug, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        tracing::debug!(program = %invocation.program.display(), args = ?invocation.args, "running tool");
        let output = Command::new(&invocation.program).args(&invocation.args).output()?;
        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Results of one pass of the quality gate.
#[derive(Debug, Default)]
pub struct GateReport {
    pub lint: Option<LintReport>,
    pub typecheck: Option<TypeCheckReport>,
    pub failures: Vec<GateError>,
}

impl GateReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<GateError>> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(self.failures)
        }
    }
}

/// Linter plus type checker over one target.
pub struct QualityGate<'a> {
    runner: &'a dyn ToolRunner,
    linter: Option<Linter>,
    type_checker: Option<TypeChecker>,
}

impl<'a> QualityGate<'a> {
    /// Build the gate for a student repository, honoring the enable flags in `config`.
    ///
    /// Generated configuration files are passed to the tools when they exist under `repo`.
    pub fn new(runner: &'a dyn ToolRunner, config: &HarnessConfig, repo: &Path) -> Self {
        let existing = |name: &str| {
            let path = repo.join(name);
            path.is_file().then_some(path)
        };
        let linter = config.lint_enabled.then(|| {
            Linter::new(&config.linter, config.lint_threshold).with_rcfile(existing(&config.pylintrc_name))
        });
        let type_checker = config
            .typecheck_enabled
            .then(|| TypeChecker::new(&config.type_checker).with_config_file(existing(&config.mypy_config_name)));
        Self {
            runner,
            linter,
            type_checker,
        }
    }

    /// Ask the linter for colored output.
    pub fn colorized(mut self, colorized: bool) -> Self {
        self.linter = self.linter.map(|l| l.with_colorized(colorized));
        self
    }

    /// Lint, then type check. Both steps always run; every failure is collected.
    #[tracing::instrument(skip_all, fields(target = %target.display()))]
    pub fn check(&self, target: &Path) -> GateReport {
        let mut report = GateReport::default();

        if let Some(linter) = &self.linter {
            match linter.run(self.runner, target) {
                Ok(lint) => {
                    if let Err(e) = lint.verdict() {
                        report.failures.push(e);
                    }
                    report.lint = Some(lint);
                }
                Err(e) => report.failures.push(e),
            }
        }

        if let Some(checker) = &self.type_checker {
            match checker.run(self.runner, target) {
                Ok(tc) => {
                    if let Err(e) = tc.verdict() {
                        report.failures.push(e);
                    }
                    report.typecheck = Some(tc);
                }
                Err(e) => report.failures.push(e),
            }
        }

        tracing::debug!(failures = report.failures.len(), "quality gate complete");
        report
    }
}
