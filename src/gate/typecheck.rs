//! Type-check gate: run mypy and fail on a nonzero exit.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{GateError, ToolInvocation, ToolRunner};
use crate::report::Palette;

static ERROR_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\berror\b").ok());
static SUCCESS_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\bSuccess:").ok());

/// Highlight `error` in red and `Success:` in green.
pub fn highlight_typecheck_output(output: &str, palette: Palette) -> String {
    if !palette.enabled {
        return output.to_string();
    }
    let mut text = output.to_string();
    if let Some(re) = ERROR_WORD.as_ref() {
        text = re.replace_all(&text, palette.red("error").as_str()).into_owned();
    }
    if let Some(re) = SUCCESS_WORD.as_ref() {
        text = re.replace_all(&text, palette.green("Success:").as_str()).into_owned();
    }
    text
}

/// Result of one type checker run.
#[derive(Debug, Clone)]
pub struct TypeCheckReport {
    pub tool: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl TypeCheckReport {
    pub fn verdict(&self) -> Result<(), GateError> {
        match self.exit_code {
            Some(0) => Ok(()),
            code => Err(GateError::TypeCheck {
                tool: self.tool.clone(),
                exit_code: code.unwrap_or(-1),
            }),
        }
    }
}

/// mypy invocation settings
#[derive(Debug, Clone)]
pub struct TypeChecker {
    program: PathBuf,
    config_file: Option<PathBuf>,
}

impl TypeChecker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config_file: None,
        }
    }

    pub fn with_config_file(mut self, config_file: Option<PathBuf>) -> Self {
        self.config_file = config_file;
        self
    }

    pub fn invocation(&self, target: &Path) -> ToolInvocation {
        let mut inv = ToolInvocation::new(&self.program).arg("--disallow-untyped-defs");
        if let Some(config) = &self.config_file {
            inv = inv.arg("--config-file").arg(config);
        }
        inv.arg(target)
    }

    pub fn run(&self, runner: &dyn ToolRunner, target: &Path) -> Result<TypeCheckReport, GateError> {
        let invocation = self.invocation(target);
        let tool = invocation.tool_name();
        let output = runner
            .run(&invocation)
            .map_err(|source| GateError::Spawn { tool: tool.clone(), source })?;
        tracing::info!(%tool, exit_code = ?output.exit_code, "type check finished");

        Ok(TypeCheckReport {
            tool,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeRunner, output};
    use super::*;

    #[test]
    fn test_invocation_args() {
        let checker = TypeChecker::new("mypy").with_config_file(Some(PathBuf::from("repo/mypy.ini")));
        let inv = checker.invocation(Path::new("repo"));
        let args: Vec<String> = inv.args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(
            args,
            vec!["--disallow-untyped-defs", "--config-file", "repo/mypy.ini", "repo"]
        );
    }

    #[test]
    fn test_nonzero_exit_fails() {
        let runner = FakeRunner::with_outputs(vec![output(1, "lab.py:2: error: Function is missing a type annotation\n")]);
        let report = TypeChecker::new("mypy").run(&runner, Path::new("lab.py")).unwrap();
        assert!(matches!(report.verdict(), Err(GateError::TypeCheck { exit_code: 1, .. })));
    }

    #[test]
    fn test_zero_exit_passes() {
        let runner = FakeRunner::with_outputs(vec![output(0, "Success: no issues found in 1 source file\n")]);
        let report = TypeChecker::new("mypy").run(&runner, Path::new("lab.py")).unwrap();
        assert!(report.verdict().is_ok());
    }

    #[test]
    fn test_killed_process_fails() {
        let report = TypeCheckReport {
            tool: "mypy".to_string(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(matches!(report.verdict(), Err(GateError::TypeCheck { exit_code: -1, .. })));
    }

    #[test]
    fn test_highlighting() {
        let out = "lab.py:2: error: bad\nSuccess: no issues found\n";
        assert_eq!(highlight_typecheck_output(out, Palette::PLAIN), out);

        let colored = highlight_typecheck_output(out, Palette::COLOR);
        assert!(colored.contains("\x1b[91merror\x1b[0m: bad"));
        assert!(colored.contains("\x1b[92mSuccess:\x1b[0m no issues"));
        // `errors` is not the word `error`
        assert_eq!(
            highlight_typecheck_output("Found 2 errors", Palette::COLOR),
            "Found 2 errors"
        );
    }
}
