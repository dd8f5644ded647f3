//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::io;
use std::path::{Path, PathBuf};

use autograde_core::{Recorder, Suite, run_observed};

use crate::config::HarnessConfig;
use crate::gate::{QualityGate, SystemToolRunner, ToolRunner, highlight_typecheck_output};
use crate::lesson::{LessonFile, LessonSource, TestBuilder};
use crate::module::StudentModule;
use crate::python::{HelperLauncher, PythonModule, SystemLauncher};
use crate::report::{ConsoleReporter, Palette, ReportError, banner, header, report};
use crate::workspace::{DirectoryListing, ensure_init_py, write_default_configs};

use super::{CliError, CliResult, ExitCode};

/// Inputs to a grading run.
#[derive(Debug, Clone)]
pub struct GradeOptions {
    pub repo: PathBuf,
    pub files: Vec<PathBuf>,
    pub tests: PathBuf,
    pub verbose: bool,
    pub palette: Palette,
}

// ============================================================================
// grade
// ============================================================================

/// Grade a student repository.
///
/// Import errors (lesson or student module) halt the run. Failing tests end the run with a failure before the
/// quality gate; otherwise the gate decides the exit code.
pub fn grade(options: &GradeOptions, config: &HarnessConfig) -> CliResult<ExitCode> {
    grade_with(&SystemToolRunner, &SystemLauncher, options, config)
}

#[tracing::instrument(skip_all, fields(repo = %options.repo.display()))]
pub(crate) fn grade_with(
    tools: &dyn ToolRunner,
    launcher: &dyn HelperLauncher,
    options: &GradeOptions,
    config: &HarnessConfig,
) -> CliResult<ExitCode> {
    let palette = options.palette;
    if !options.repo.is_dir() {
        return Err(CliError::failure(format!(
            "Student repository not found: {}",
            options.repo.display()
        )));
    }

    write_configs(&options.repo, config)?;

    let file_names: Vec<String> = options.files.iter().map(|f| f.display().to_string()).collect();
    let message = format!(
        "Running tests and linters for files {:?} and tests in {}",
        file_names,
        options.tests.display()
    );
    println!("{}", banner(&message, palette));

    let source = LessonSource::locate(&options.tests)?;

    let mut modules = Vec::with_capacity(options.files.len());
    for file in &options.files {
        let stem = file.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        println!("Attempting to import {}.py and build tests...", stem);
        let module = PythonModule::import(launcher, &config.python, &options.repo, file)?;
        println!("Student module {} imported successfully.", module.name());
        modules.push(module);
    }

    let lesson = match source {
        LessonSource::Json(lesson) => lesson,
        LessonSource::Python { dir, module } => {
            let mut cases = Vec::new();
            for student in &modules {
                cases.extend(student.build_lesson(&dir, &module)?.cases);
            }
            LessonFile {
                description: None,
                cases,
            }
        }
    };

    let bound: Vec<&dyn StudentModule> = modules.iter().map(|m| m as &dyn StudentModule).collect();
    lesson.verify_bindings(&bound)?;

    let mut recorder = Recorder::new();
    for module in &modules {
        lesson.build_tests(&mut recorder, module)?;
    }
    tracing::info!(cases = recorder.len(), modules = modules.len(), "recorded instructor tests");

    println!("{}", banner("Running instructor tests...", palette));
    if !run_and_report(&recorder, options.verbose, palette)? {
        return Ok(ExitCode::FAILURE);
    }

    if ensure_init_py(&options.repo)? {
        println!("Created __init__.py in {}", options.repo.display());
    }
    let gates_passed = run_gates(tools, config, &options.repo, &options.repo, palette);

    Ok(exit_code(gates_passed))
}

// ============================================================================
// summarize
// ============================================================================

/// Run self-recorded tests, report, then gate `source` when there is one and every test passed.
///
/// This is the library entry point for scripts that record their own expectations instead of using a lesson file.
pub fn summarize(
    recorder: &Recorder,
    source: Option<&Path>,
    config: &HarnessConfig,
    palette: Palette,
) -> CliResult<ExitCode> {
    summarize_with(&SystemToolRunner, recorder, source, config, palette)
}

pub(crate) fn summarize_with(
    runner: &dyn ToolRunner,
    recorder: &Recorder,
    source: Option<&Path>,
    config: &HarnessConfig,
    palette: Palette,
) -> CliResult<ExitCode> {
    let name = source.map_or_else(|| "<stdin>".to_string(), |s| s.display().to_string());
    let message = format!("Testing {}", name);
    println!("{}", header(&message));
    println!("{}", message);

    if !run_and_report(recorder, true, palette)? {
        return Ok(ExitCode::FAILURE);
    }

    let Some(source) = source else {
        println!("No need to lint the interpreter...");
        return Ok(ExitCode::SUCCESS);
    };
    let repo = source.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));

    Ok(exit_code(run_gates(runner, config, repo, source, palette)))
}

// ============================================================================
// init / lint / typecheck
// ============================================================================

/// Write the default tool configuration into `repo`.
pub fn init_config(repo: &Path, config: &HarnessConfig) -> CliResult<ExitCode> {
    if !repo.is_dir() {
        return Err(CliError::failure(format!("Not a directory: {}", repo.display())));
    }
    write_configs(repo, config)?;
    Ok(ExitCode::SUCCESS)
}

/// Run the lint gate over `target`.
pub fn lint(target: &Path, config: &HarnessConfig, palette: Palette) -> CliResult<ExitCode> {
    let config = config.clone().with_lint(true).with_typecheck(false);
    let passed = run_gates(&SystemToolRunner, &config, &config_root(target), target, palette);
    Ok(exit_code(passed))
}

/// Run the type-check gate over `target`.
pub fn typecheck(target: &Path, config: &HarnessConfig, palette: Palette) -> CliResult<ExitCode> {
    let config = config.clone().with_lint(false).with_typecheck(true);
    let passed = run_gates(&SystemToolRunner, &config, &config_root(target), target, palette);
    Ok(exit_code(passed))
}

// ============================================================================
// Helpers
// ============================================================================

fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Directory searched for `.pylintrc` / `mypy.ini` when gating `target`.
fn config_root(target: &Path) -> PathBuf {
    if target.is_dir() {
        return target.to_path_buf();
    }
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write missing configuration files and show the repository when anything was written.
fn write_configs(repo: &Path, config: &HarnessConfig) -> CliResult<()> {
    let written = write_default_configs(repo, config)?;
    if written.is_empty() {
        println!("{} and {} already exist.", config.pylintrc_name, config.mypy_config_name);
        return Ok(());
    }

    println!("Generating default configuration...");
    for path in &written {
        println!("Writing to: {}", path.display());
    }
    print!("{}", DirectoryListing::read(repo)?);
    Ok(())
}

/// Build and run the suite with console progress, then print the summary.
///
/// Returns whether every test passed.
fn run_and_report(recorder: &Recorder, verbose: bool, palette: Palette) -> CliResult<bool> {
    let suite = Suite::build(recorder);
    let mut reporter = ConsoleReporter::new(verbose, palette);
    let result = run_observed(&suite, &mut reporter);
    reporter.finish(&result)?;

    match report(&result, palette, &mut io::stdout()) {
        Ok(()) => Ok(true),
        Err(e @ ReportError::TestsFailed { .. }) => {
            println!("{}", palette.red(&e.to_string()));
            Ok(false)
        }
        Err(ReportError::Io(e)) => Err(e.into()),
    }
}

/// Run the enabled gates over `target` and print their output. Returns whether every gate passed.
fn run_gates(runner: &dyn ToolRunner, config: &HarnessConfig, repo: &Path, target: &Path, palette: Palette) -> bool {
    let gate = QualityGate::new(runner, config, repo).colorized(palette.enabled);
    let gate_report = gate.check(target);

    if config.lint_enabled {
        println!("{}", banner("Running linting...", palette));
        if let Some(lint) = &gate_report.lint {
            println!("{}", lint.output.trim_end());
        }
    }
    if config.typecheck_enabled {
        println!("{}", banner(&format!("Running type checks on {}", target.display()), palette));
        if let Some(tc) = &gate_report.typecheck {
            println!("{}", highlight_typecheck_output(tc.stdout.trim_end(), palette));
            if !tc.stderr.trim().is_empty() {
                println!("{}", tc.stderr.trim_end());
            }
        }
    }

    let passed = gate_report.is_success();
    for failure in &gate_report.failures {
        println!("{}", palette.red(&failure.to_string()));
    }
    passed
}
