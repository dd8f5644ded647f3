//! CLI module for the autograder
//!
//! ## Commands
//!
//! - `grade --path <repo> --files <f>... --tests <lesson>` - Test, lint and type check a submission
//! - `init --path <repo>` - Write the default linter and type checker configuration
//! - `lint <target>` - Run the lint gate only
//! - `typecheck <target>` - Run the type-check gate only
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::config::{HarnessConfig, PYTHON_ENV_VAR};
use crate::lesson::LessonError;
use crate::python::ImportError;
use crate::report::Palette;
use crate::version::AUTOGRADE_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<LessonError> for CliError {
    fn from(e: LessonError) -> Self {
        CliError::failure(format!("Error importing instructor test module: {}", e))
    }
}

impl From<ImportError> for CliError {
    fn from(e: ImportError) -> Self {
        CliError::failure(e.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::failure(format!("I/O error: {}", e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Autograding harness for introductory programming courses
#[derive(Parser, Debug)]
#[command(name = "autograde")]
#[command(version = AUTOGRADE_VERSION)]
#[command(about = "Grade student submissions against instructor tests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Disable ANSI colors (also honored: NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run instructor tests against student files, then lint and type check the repository
    Grade {
        /// Student repository
        #[arg(long = "path", value_name = "REPO")]
        path: PathBuf,
        /// Student files to import (relative to the repository)
        #[arg(long = "files", value_name = "FILE", num_args = 1.., required = true)]
        files: Vec<PathBuf>,
        /// Instructor tests: a lesson JSON file, a Python TestBuilder module, or a directory containing lesson_tests.json or lesson_tests.py
        #[arg(long = "tests", value_name = "LESSON")]
        tests: PathBuf,
        /// Minimum lint score (out of 10)
        #[arg(long, default_value_t = 9.0)]
        threshold: f64,
        /// Skip the lint gate
        #[arg(long)]
        no_lint: bool,
        /// Skip the type-check gate
        #[arg(long)]
        no_typecheck: bool,
        /// Python interpreter used to import student code
        #[arg(long, value_name = "PYTHON", env = PYTHON_ENV_VAR, default_value = "python3")]
        python: PathBuf,
        /// Print one line per test
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write default .pylintrc and mypy.ini into a repository (existing files are kept)
    Init {
        #[arg(long = "path", value_name = "REPO", default_value = ".")]
        path: PathBuf,
    },

    /// Lint a file or directory
    Lint {
        #[arg(value_name = "TARGET")]
        target: PathBuf,
        /// Minimum lint score (out of 10)
        #[arg(long, default_value_t = 9.0)]
        threshold: f64,
    },

    /// Type check a file or directory
    Typecheck {
        #[arg(value_name = "TARGET")]
        target: PathBuf,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let palette = Palette::detect(cli.no_color);

    match cli.command {
        Command::Grade {
            path,
            files,
            tests,
            threshold,
            no_lint,
            no_typecheck,
            python,
            verbose,
        } => {
            let config = HarnessConfig::new()
                .with_python(python)
                .with_lint_threshold(threshold)
                .with_lint(!no_lint)
                .with_typecheck(!no_typecheck);
            let options = commands::GradeOptions {
                repo: path,
                files,
                tests,
                verbose,
                palette,
            };
            commands::grade(&options, &config)
        }
        Command::Init { path } => commands::init_config(&path, &HarnessConfig::new()),
        Command::Lint { target, threshold } => {
            commands::lint(&target, &HarnessConfig::new().with_lint_threshold(threshold), palette)
        }
        Command::Typecheck { target } => commands::typecheck(&target, &HarnessConfig::new(), palette),
    }
}

// ============================================================================
// Tests
// ============================================================================
