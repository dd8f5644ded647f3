//! Result reporting
//!
//! [`ConsoleReporter`] streams per-unit progress while the suite runs (it is a [`RunObserver`]). Once the run is
//! over, [`report`] prints the three-line summary and turns any failure or error into [`ReportError::TestsFailed`],
//! the blocking signal for the test portion of a grading run.

use std::env;
use std::io::{self, Write};

use autograde_core::{Outcome, RunObserver, RunResult, TestUnit, UnitReport};
use thiserror::Error;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const RESET: &str = "\x1b[0m";

/// ANSI coloring, on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub enabled: bool,
}

impl Palette {
    pub const COLOR: Palette = Palette { enabled: true };
    pub const PLAIN: Palette = Palette { enabled: false };

    /// Colors unless `no_color` is set or the `NO_COLOR` environment variable is present.
    pub fn detect(no_color: bool) -> Self {
        Palette {
            enabled: !no_color && env::var_os("NO_COLOR").is_none(),
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.enabled {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }
}

/// A `=` rule as wide as `message`.
pub fn header(message: &str) -> String {
    "=".repeat(message.chars().count())
}

/// A blue rule followed by the blue message, used to announce each harness stage.
pub fn banner(message: &str, palette: Palette) -> String {
    format!("{}\n{}", palette.blue(&header(message)), palette.blue(message))
}

/// The blocking failure signal raised after reporting.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("There were errors or test failures! ({failed} failed, {errored} errored)")]
    TestsFailed { failed: usize, errored: usize },

    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Render the three summary lines (no trailing newline).
pub fn render_summary(result: &RunResult, palette: Palette) -> String {
    [
        palette.green(&format!("PASS: {} tests passed", result.passed())),
        palette.red(&format!("FAIL: {} tests failed", result.failed)),
        palette.yellow(&format!("ERROR: {} tests had errors", result.errored)),
    ]
    .join("\n")
}

/// Write the summary and signal failure when any unit failed or errored.
pub fn report(result: &RunResult, palette: Palette, out: &mut impl Write) -> Result<(), ReportError> {
    writeln!(out, "{}", render_summary(result, palette))?;
    if result.is_success() {
        Ok(())
    } else {
        Err(ReportError::TestsFailed {
            failed: result.failed,
            errored: result.errored,
        })
    }
}

/// Render the failure and error details section, in unit order.
pub fn render_details(result: &RunResult, palette: Palette) -> String {
    let mut out = String::new();
    let mut problems: Vec<&UnitReport> = result.failures().chain(result.errors()).collect();
    problems.sort_by_key(|r| r.index);

    for report in problems {
        let (label, message) = match &report.outcome {
            Outcome::Failed(msg) => (palette.red("FAIL"), format!("AssertionError: {}", msg)),
            Outcome::Errored(msg) => (palette.yellow("ERROR"), msg.clone()),
            Outcome::Passed => continue,
        };
        out.push_str(&"=".repeat(70));
        out.push('\n');
        out.push_str(&format!("{}: {}\n", label, report.name));
        out.push_str(&"-".repeat(70));
        out.push('\n');
        out.push_str(&message);
        out.push_str("\n\n");
    }
    out
}

/// Default console reporter (unittest-style).
///
/// Observer hooks cannot fail, so the first write error is kept and returned from [`ConsoleReporter::finish`].
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    verbose: bool,
    palette: Palette,
    error: Option<io::Error>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn new(verbose: bool, palette: Palette) -> Self {
        Self::with_writer(io::stdout(), verbose, palette)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W, verbose: bool, palette: Palette) -> Self {
        Self {
            out,
            verbose,
            palette,
            error: None,
        }
    }

    fn keep_error(&mut self, result: io::Result<()>) {
        match result {
            Err(e) if self.error.is_none() => self.error = Some(e),
            _ => {}
        }
    }

    /// Print the details section and the run footer.
    pub fn finish(&mut self, result: &RunResult) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        if !self.verbose && result.total > 0 {
            writeln!(self.out)?;
        }
        let details = render_details(result, self.palette);
        if !details.is_empty() {
            writeln!(self.out)?;
            write!(self.out, "{}", details)?;
        }
        writeln!(self.out, "{}", "-".repeat(70))?;
        writeln!(
            self.out,
            "Ran {} test{} in {:.3}s",
            result.total,
            if result.total == 1 { "" } else { "s" },
            result.duration.as_secs_f64()
        )?;
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RunObserver for ConsoleReporter<W> {
    fn on_unit_start(&mut self, unit: &TestUnit) {
        if self.verbose {
            let written = write!(self.out, "{} ... ", unit.name);
            self.keep_error(written);
        }
    }

    fn on_unit_complete(&mut self, _unit: &TestUnit, outcome: &Outcome) {
        let status = match (outcome, self.verbose) {
            (Outcome::Passed, true) => self.palette.green("ok"),
            (Outcome::Failed(_), true) => self.palette.red("FAIL"),
            (Outcome::Errored(_), true) => self.palette.yellow("ERROR"),
            (Outcome::Passed, false) => self.palette.green("."),
            (Outcome::Failed(_), false) => self.palette.red("F"),
            (Outcome::Errored(_), false) => self.palette.yellow("E"),
        };
        let written = if self.verbose {
            writeln!(self.out, "{}", status)
        } else {
            write!(self.out, "{}", status)
        }
        .and_then(|()| self.out.flush());
        self.keep_error(written);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn unit_report(index: usize, name: &str, outcome: Outcome) -> UnitReport {
        UnitReport {
            index,
            name: name.to_string(),
            outcome,
            duration: Duration::ZERO,
        }
    }

    fn sample_result() -> RunResult {
        RunResult {
            total: 3,
            failed: 1,
            errored: 1,
            duration: Duration::ZERO,
            reports: vec![
                unit_report(1, "test_1: add(1, 2) = 3", Outcome::Passed),
                unit_report(2, "test_2: add(2, 2) = 5", Outcome::Failed("4 != 5".to_string())),
                unit_report(3, "test_3: div(1, 0) = 0", Outcome::Errored("ZeroDivisionError: division by zero".to_string())),
            ],
        }
    }

    #[test]
    fn test_header_matches_message_width() {
        assert_eq!(header("Running linting..."), "==================");
        assert_eq!(header(""), "");
    }

    #[test]
    fn test_plain_palette_has_no_escapes() {
        assert_eq!(Palette::PLAIN.red("x"), "x");
        assert_eq!(Palette::COLOR.red("x"), "\x1b[91mx\x1b[0m");
    }

    #[test]
    fn test_banner() {
        assert_eq!(banner("Go", Palette::PLAIN), "==\nGo");
    }

    #[test]
    fn test_summary_lines() {
        let summary = render_summary(&sample_result(), Palette::PLAIN);
        insta::assert_snapshot!(summary, @r"
        PASS: 1 tests passed
        FAIL: 1 tests failed
        ERROR: 1 tests had errors
        ");
    }

    #[test]
    fn test_summary_colors() {
        let summary = render_summary(&RunResult::default(), Palette::COLOR);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "\x1b[92mPASS: 0 tests passed\x1b[0m");
        assert_eq!(lines[1], "\x1b[91mFAIL: 0 tests failed\x1b[0m");
        assert_eq!(lines[2], "\x1b[93mERROR: 0 tests had errors\x1b[0m");
    }

    #[test]
    fn test_report_signals_failure() {
        let mut out = Vec::new();
        let err = report(&sample_result(), Palette::PLAIN, &mut out).unwrap_err();
        assert!(matches!(err, ReportError::TestsFailed { failed: 1, errored: 1 }));
        assert!(String::from_utf8(out).unwrap().starts_with("PASS: 1 tests passed\n"));
    }

    #[test]
    fn test_report_empty_run_succeeds() {
        let mut out = Vec::new();
        report(&RunResult::default(), Palette::PLAIN, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "PASS: 0 tests passed\nFAIL: 0 tests failed\nERROR: 0 tests had errors\n"
        );
    }

    #[test]
    fn test_details_list_failures_and_errors_in_order() {
        let details = render_details(&sample_result(), Palette::PLAIN);
        let fail_at = details.find("FAIL: test_2").unwrap();
        let error_at = details.find("ERROR: test_3").unwrap();
        assert!(fail_at < error_at);
        assert!(details.contains("AssertionError: 4 != 5"));
        assert!(details.contains("ZeroDivisionError: division by zero"));
        assert!(!details.contains("test_1"));
    }

    #[test]
    fn test_console_reporter_verbose_lines() {
        let result = sample_result();
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), true, Palette::PLAIN);
        for r in &result.reports {
            // Only the name is read by the observer hooks.
            let unit = TestUnit {
                index: r.index,
                name: r.name.clone(),
                case: placeholder_case(),
            };
            reporter.on_unit_start(&unit);
            reporter.on_unit_complete(&unit, &r.outcome);
        }
        reporter.finish(&result).unwrap();
        let text = String::from_utf8(reporter.into_inner()).unwrap();

        assert!(text.starts_with(
            "test_1: add(1, 2) = 3 ... ok\ntest_2: add(2, 2) = 5 ... FAIL\ntest_3: div(1, 0) = 0 ... ERROR\n"
        ));
        assert!(text.contains("Ran 3 tests in 0.000s"));
    }

    /// Writer whose every write fails.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_reporter_returns_write_error_from_finish() {
        let result = sample_result();
        let mut reporter = ConsoleReporter::with_writer(ClosedPipe, false, Palette::PLAIN);
        let unit = TestUnit {
            index: 1,
            name: "test_1: add(1, 2) = 3".to_string(),
            case: placeholder_case(),
        };
        reporter.on_unit_complete(&unit, &Outcome::Passed);

        let err = reporter.finish(&result).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    fn placeholder_case() -> autograde_core::Expectation {
        let f = autograde_core::Function::from_fn("f", |_| Ok(autograde_core::Value::None));
        let mut recorder = autograde_core::Recorder::new();
        recorder.expect(&f, Vec::<autograde_core::Value>::new(), autograde_core::Value::None);
        recorder.cases()[0].clone()
    }
}
