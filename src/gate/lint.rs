//! Lint gate: run pylint and compare its global score against a threshold.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{GateError, ToolInvocation, ToolRunner};

static SCORE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"rated at (-?\d+(?:\.\d+)?)/10").ok());

/// Extract the global score from linter output (`Your code has been rated at 8.75/10`).
///
/// When the output holds several ratings (e.g. a `previous run` note follows), the first one is the current score.
pub fn parse_lint_score(output: &str) -> Option<f64> {
    let pattern = SCORE_PATTERN.as_ref()?;
    pattern
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Result of one linter run.
#[derive(Debug, Clone)]
pub struct LintReport {
    pub tool: String,
    pub score: Option<f64>,
    pub threshold: f64,
    /// Combined stdout and stderr, shown to the student as-is
    pub output: String,
}

impl LintReport {
    pub fn verdict(&self) -> Result<(), GateError> {
        match self.score {
            None => Err(GateError::ScoreUnavailable { tool: self.tool.clone() }),
            Some(score) if score < self.threshold => Err(GateError::LintScore {
                score,
                threshold: self.threshold,
            }),
            Some(_) => Ok(()),
        }
    }
}

/// pylint invocation settings
#[derive(Debug, Clone)]
pub struct Linter {
    program: PathBuf,
    threshold: f64,
    rcfile: Option<PathBuf>,
    colorized: bool,
}

impl Linter {
    pub fn new(program: impl Into<PathBuf>, threshold: f64) -> Self {
        Self {
            program: program.into(),
            threshold,
            rcfile: None,
            colorized: false,
        }
    }

    pub fn with_rcfile(mut self, rcfile: Option<PathBuf>) -> Self {
        self.rcfile = rcfile;
        self
    }

    /// Ask the linter for ANSI-colored messages.
    pub fn with_colorized(mut self, colorized: bool) -> Self {
        self.colorized = colorized;
        self
    }

    pub fn invocation(&self, target: &Path) -> ToolInvocation {
        let mut inv = ToolInvocation::new(&self.program);
        if let Some(rcfile) = &self.rcfile {
            inv = inv.arg(format!("--rcfile={}", rcfile.display()));
        }
        if self.colorized {
            inv = inv.arg("--output-format=colorized");
        }
        inv.arg(target)
    }

    pub fn run(&self, runner: &dyn ToolRunner, target: &Path) -> Result<LintReport, GateError> {
        let invocation = self.invocation(target);
        let tool = invocation.tool_name();
        let output = runner
            .run(&invocation)
            .map_err(|source| GateError::Spawn { tool: tool.clone(), source })?;

        let mut combined = output.stdout;
        combined.push_str(&output.stderr);
        let score = parse_lint_score(&combined);
        tracing::info!(%tool, ?score, threshold = self.threshold, "lint finished");

        Ok(LintReport {
            tool,
            score,
            threshold: self.threshold,
            output: combined,
        })
    }
}
