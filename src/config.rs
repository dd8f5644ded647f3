//! Harness configuration
//!
//! Defaults match the course setup: `python3`, `pylint` with a 9.0 score threshold, and `mypy` with untyped
//! definitions disallowed. CLI flags override individual fields through the `with_*` builders.

use std::path::PathBuf;

/// Environment variable that selects the Python interpreter (read by the CLI).
pub const PYTHON_ENV_VAR: &str = "AUTOGRADE_PYTHON";

/// Lint messages suppressed by the generated `.pylintrc`.
pub const DEFAULT_DISABLED_LINTS: &[&str] = &["C0301", "C0103", "C0303", "C0304", "R1732", "R0903"];

/// Directories (relative to the student repository) that mypy skips.
pub const DEFAULT_MYPY_EXCLUDES: &[&str] = &["tests-repo", "venv", "build", "docs", ".git"];

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Interpreter used to import and call student modules
    pub python: PathBuf,
    /// Linter executable
    pub linter: PathBuf,
    /// Type checker executable
    pub type_checker: PathBuf,
    /// Minimum acceptable lint score (out of 10)
    pub lint_threshold: f64,
    /// Linter configuration file name, relative to the student repository
    pub pylintrc_name: String,
    /// Type checker configuration file name, relative to the student repository
    pub mypy_config_name: String,
    /// Lint message ids written to the generated `.pylintrc`
    pub disabled_lints: Vec<String>,
    /// Directory name the linter ignores (instructor tests checked out into the student repo)
    pub lint_ignore_dir: String,
    /// Whether to run the linter at all
    pub lint_enabled: bool,
    /// Whether to run the type checker at all
    pub typecheck_enabled: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            linter: PathBuf::from("pylint"),
            type_checker: PathBuf::from("mypy"),
            lint_threshold: 9.0,
            pylintrc_name: ".pylintrc".to_string(),
            mypy_config_name: "mypy.ini".to_string(),
            disabled_lints: DEFAULT_DISABLED_LINTS.iter().map(|s| s.to_string()).collect(),
            lint_ignore_dir: "tests_repo".to_string(),
            lint_enabled: true,
            typecheck_enabled: true,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Python interpreter
    pub fn with_python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = python.into();
        self
    }

    /// Set the minimum lint score
    pub fn with_lint_threshold(mut self, threshold: f64) -> Self {
        self.lint_threshold = threshold;
        self
    }

    pub fn with_linter(mut self, linter: impl Into<PathBuf>) -> Self {
        self.linter = linter.into();
        self
    }

    pub fn with_type_checker(mut self, type_checker: impl Into<PathBuf>) -> Self {
        self.type_checker = type_checker.into();
        self
    }

    /// Enable or disable the lint gate
    pub fn with_lint(mut self, enabled: bool) -> Self {
        self.lint_enabled = enabled;
        self
    }

    /// Enable or disable the type-check gate
    pub fn with_typecheck(mut self, enabled: bool) -> Self {
        self.typecheck_enabled = enabled;
        self
    }
}
