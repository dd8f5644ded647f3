//! Python student modules
//!
//! Each imported student file gets one helper interpreter that lives as long as the [`PythonModule`]. The helper
//! imports the module once, then answers one JSON request per line on stdin with one JSON reply per line on stdout:
//!
//! - `{"call": "add", "args": [1, 2]}` calls a function (arguments use the [`crate::json`] encoding),
//! - `{"build": {"path": "...", "module": "lesson_tests"}}` runs an instructor `TestBuilder` against the module.
//!
//! Replies are `{"returned": <value>}` or `{"raised": {"kind": "...", "message": "..."}}`. The first reply, sent
//! right after the import, lists the module's top-level functions.
//!
//! The helper moves its own stdin/stdout to private descriptors and points fd 0 and fd 1 at the null device, so
//! student code that prints or reads input cannot corrupt the request channel.

use std::cell::RefCell;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::rc::Rc;

use autograde_core::{CallError, Function, Value};
use serde::Deserialize;
use serde_json::{Value as Json, json};
use thiserror::Error;

use crate::gate::ToolInvocation;
use crate::json;
use crate::lesson::{LessonCase, LessonError, LessonFile};
use crate::module::StudentModule;

const HELPER_SCRIPT: &str = r#"import importlib, inspect, json, math, os, sys
sys.dont_write_bytecode = True
sys.path.insert(0, sys.argv[1])

requests = os.fdopen(os.dup(0), "r", encoding="utf-8")
replies = os.fdopen(os.dup(1), "w", encoding="utf-8")
os.dup2(os.open(os.devnull, os.O_RDONLY), 0)
os.dup2(os.open(os.devnull, os.O_WRONLY), 1)

def reply(payload):
    replies.write(json.dumps(payload) + "\n")
    replies.flush()

def raised(exc):
    reply({"raised": {"kind": type(exc).__name__, "message": str(exc)}})

def decode(value):
    if isinstance(value, list):
        return [decode(v) for v in value]
    if isinstance(value, dict):
        if len(value) == 1 and "__tuple__" in value:
            return tuple(decode(v) for v in value["__tuple__"])
        if len(value) == 1 and "__float__" in value:
            return float(value["__float__"])
        return {k: decode(v) for k, v in value.items()}
    return value

def encode(value):
    if value is None or isinstance(value, (bool, int, str)):
        return value
    if isinstance(value, float):
        return value if math.isfinite(value) else {"__float__": repr(value)}
    if isinstance(value, tuple):
        return {"__tuple__": [encode(v) for v in value]}
    if isinstance(value, list):
        return [encode(v) for v in value]
    if isinstance(value, dict):
        return {str(k): encode(v) for k, v in value.items()}
    return {"__repr__": repr(value)}

def build(module, request):
    sys.path.insert(0, request["path"])
    lesson = importlib.import_module(request["module"])
    cases = []

    def expect(func, *args, expected, tolerance=None):
        cases.append({
            "function": getattr(func, "__name__", repr(func)),
            "args": [encode(a) for a in args],
            "expected": encode(expected),
            "tolerance": tolerance,
        })

    lesson.TestBuilder().build_tests(expect, module)
    return cases

try:
    module = importlib.import_module(sys.argv[2])
except BaseException as exc:
    raised(exc)
    sys.exit(0)
reply({"returned": [name for name, obj in inspect.getmembers(module, inspect.isfunction)
                    if obj.__module__ == module.__name__]})

for line in requests:
    try:
        request = json.loads(line)
        if "build" in request:
            result = build(module, request["build"])
        else:
            result = encode(getattr(module, request["call"])(*decode(request["args"])))
    except BaseException as exc:
        raised(exc)
    else:
        reply({"returned": result})
"#;

/// Errors importing a student module. All of them halt the run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("student file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("'{}' is not a Python source file", .0.display())]
    NotPython(PathBuf),

    #[error("failed to start {interpreter}: {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: io::Error,
    },

    #[error("Error importing module {module}: {kind}: {message}")]
    Raised {
        module: String,
        kind: String,
        message: String,
    },

    #[error("Error importing module {module}: {detail}")]
    Protocol { module: String, detail: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Returned(Json),
    Raised { kind: String, message: String },
}

// ============================================================================
// Helper process boundary
// ============================================================================

/// Line-oriented connection to a running helper interpreter.
pub trait HelperChannel {
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Next line from the helper, or `None` once it has exited.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Starts helper interpreters.
pub trait HelperLauncher {
    fn launch(&self, invocation: &ToolInvocation) -> io::Result<Box<dyn HelperChannel>>;
}

/// Spawns the helper as a child process with piped stdin/stdout. Its stderr is inherited.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl HelperLauncher for SystemLauncher {
    fn launch(&self, invocation: &ToolInvocation) -> io::Result<Box<dyn HelperChannel>> {
        tracing::debug!(program = %invocation.program.display(), "starting helper interpreter");
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => Ok(Box::new(ChildChannel {
                child,
                stdin: Some(stdin),
                stdout: BufReader::new(stdout),
            })),
            _ => {
                stop(&mut child);
                Err(io::Error::other("helper interpreter pipes are unavailable"))
            }
        }
    }
}

struct ChildChannel {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl HelperChannel for ChildChannel {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::BrokenPipe))?;
        writeln!(stdin, "{}", line)?;
        stdin.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl Drop for ChildChannel {
    fn drop(&mut self) {
        // Closing stdin ends the helper's request loop
        drop(self.stdin.take());
        stop(&mut self.child);
    }
}

fn stop(child: &mut Child) {
    if let Err(e) = child.kill().and_then(|()| child.wait().map(drop)) {
        tracing::debug!(error = %e, "failed to stop helper interpreter");
    }
}

/// Read one reply. `Err` carries a description of a broken helper.
fn read_reply(channel: &mut dyn HelperChannel) -> Result<Reply, String> {
    match channel.read_line() {
        Ok(Some(line)) => serde_json::from_str(line.trim()).map_err(|e| format!("malformed reply from interpreter: {}", e)),
        Ok(None) => Err("interpreter exited unexpectedly".to_string()),
        Err(e) => Err(format!("failed to read from interpreter: {}", e)),
    }
}

/// A live helper. Requests are strictly sequential.
struct Helper {
    channel: RefCell<Box<dyn HelperChannel>>,
}

impl Helper {
    fn request(&self, request: &Json) -> Result<Reply, String> {
        let mut channel = self.channel.borrow_mut();
        channel
            .send_line(&request.to_string())
            .map_err(|e| format!("failed to reach interpreter: {}", e))?;
        read_reply(&mut **channel)
    }

    fn call(&self, function: &str, args: &[Value]) -> Result<Value, CallError> {
        let args: Vec<Json> = args.iter().map(json::to_json).collect();
        match self.request(&json!({ "call": function, "args": args })) {
            Ok(Reply::Returned(value)) => Ok(json::from_json(value)),
            Ok(Reply::Raised { kind, message }) => Err(CallError::Raised { kind, message }),
            Err(detail) => Err(CallError::raised("ProcessError", detail)),
        }
    }
}

// ============================================================================
// PythonModule
// ============================================================================

/// A student's Python file, imported once into its own helper interpreter.
pub struct PythonModule {
    name: String,
    functions: Vec<String>,
    helper: Rc<Helper>,
}

impl PythonModule {
    /// Import `file` (relative paths are resolved against `repo`).
    #[tracing::instrument(skip(launcher, python))]
    pub fn import(
        launcher: &dyn HelperLauncher,
        python: &Path,
        repo: &Path,
        file: &Path,
    ) -> Result<Self, ImportError> {
        let path = if file.is_absolute() { file.to_path_buf() } else { repo.join(file) };
        if !path.is_file() {
            return Err(ImportError::NotFound(path));
        }
        if path.extension().is_none_or(|ext| ext != "py") {
            return Err(ImportError::NotPython(path));
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| ImportError::NotFound(path.clone()))?;
        let module_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| repo.to_path_buf());

        let invocation = ToolInvocation::new(python)
            .arg("-c")
            .arg(HELPER_SCRIPT)
            .arg(&module_dir)
            .arg(&name);
        let mut channel = launcher.launch(&invocation).map_err(|source| ImportError::Spawn {
            interpreter: python.display().to_string(),
            source,
        })?;

        let functions = match read_reply(&mut *channel) {
            Ok(Reply::Returned(Json::Array(names))) => names
                .into_iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect(),
            Ok(Reply::Returned(other)) => {
                return Err(ImportError::Protocol {
                    module: name,
                    detail: format!("unexpected function list {}", other),
                });
            }
            Ok(Reply::Raised { kind, message }) => {
                return Err(ImportError::Raised {
                    module: name,
                    kind,
                    message,
                });
            }
            Err(detail) => return Err(ImportError::Protocol { module: name, detail }),
        };
        tracing::debug!(module = %name, ?functions, "imported student module");

        Ok(Self {
            name,
            functions,
            helper: Rc::new(Helper {
                channel: RefCell::new(channel),
            }),
        })
    }

    /// Run the instructor's `TestBuilder` from the Python module `lesson_module` in `dir` against this module.
    ///
    /// Every recorded case is scoped to this module.
    pub fn build_lesson(&self, dir: &Path, lesson_module: &str) -> Result<LessonFile, LessonError> {
        let request = json!({ "build": { "path": dir.to_string_lossy(), "module": lesson_module } });
        let cases = match self.helper.request(&request) {
            Ok(Reply::Returned(cases)) => serde_json::from_value::<Vec<LessonCase>>(cases)
                .map_err(|e| LessonError::Builder(format!("{} recorded an unusable case: {}", lesson_module, e)))?,
            Ok(Reply::Raised { kind, message }) => {
                return Err(LessonError::Builder(format!("{}: {}", kind, message)));
            }
            Err(detail) => return Err(LessonError::Builder(detail)),
        };
        tracing::debug!(module = %self.name, cases = cases.len(), "built instructor tests");

        Ok(LessonFile {
            description: None,
            cases: cases
                .into_iter()
                .map(|case| LessonCase {
                    module: Some(self.name.clone()),
                    ..case
                })
                .collect(),
        })
    }
}

impl StudentModule for PythonModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn function_names(&self) -> Vec<String> {
        self.functions.clone()
    }

    fn function(&self, name: &str) -> Option<Function> {
        if !self.functions.iter().any(|f| f == name) {
            return None;
        }
        let helper = Rc::clone(&self.helper);
        let function = name.to_string();
        Some(Function::from_fn(name, move |args| helper.call(&function, args)))
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use super::testing::ScriptedLauncher;
    use super::*;

    fn student_repo(source: &str) -> tempfile::TempDir {
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("lab1.py"), source).unwrap();
        repo
    }

    fn import(launcher: &dyn HelperLauncher, repo: &Path, file: &str) -> Result<PythonModule, ImportError> {
        PythonModule::import(launcher, Path::new("python3"), repo, Path::new(file))
    }

    #[test]
    fn test_import_lists_functions() {
        let repo = student_repo("def add(a, b):\n    return a + b\n");
        let launcher = ScriptedLauncher::with_sessions(vec![vec!["{\"returned\": [\"add\", \"sub\"]}\n"]]);

        let module = import(&launcher, repo.path(), "lab1.py").unwrap();
        assert_eq!(module.name(), "lab1");
        assert_eq!(module.function_names(), vec!["add", "sub"]);
        assert!(module.function("mul").is_none());

        let launches = launcher.launches.borrow();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].args[0], "-c");
        assert_eq!(launches[0].args[3], "lab1");
    }

    #[test]
    fn test_import_missing_file() {
        let repo = tempfile::tempdir().unwrap();
        let err = import(&ScriptedLauncher::default(), repo.path(), "lab9.py").err().unwrap();
        assert!(matches!(err, ImportError::NotFound(_)));
    }

    #[test]
    fn test_import_non_python_file() {
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("notes.txt"), "").unwrap();
        let err = import(&ScriptedLauncher::default(), repo.path(), "notes.txt").err().unwrap();
        assert!(matches!(err, ImportError::NotPython(_)));
    }

    #[test]
    fn test_import_error_halts() {
        let repo = student_repo("import nonexistent\n");
        let launcher = ScriptedLauncher::with_sessions(vec![vec![
            "{\"raised\": {\"kind\": \"ModuleNotFoundError\", \"message\": \"No module named 'nonexistent'\"}}\n",
        ]]);
        let err = import(&launcher, repo.path(), "lab1.py").err().unwrap();
        assert_eq!(
            err.to_string(),
            "Error importing module lab1: ModuleNotFoundError: No module named 'nonexistent'"
        );
    }

    #[test]
    fn test_import_helper_exits_without_reply() {
        let repo = student_repo("");
        let launcher = ScriptedLauncher::with_sessions(vec![vec![]]);
        let err = import(&launcher, repo.path(), "lab1.py").err().unwrap();
        assert!(matches!(err, ImportError::Protocol { ref detail, .. } if detail == "interpreter exited unexpectedly"));
    }

    #[test]
    fn test_calls_share_one_helper() {
        let repo = student_repo("");
        let launcher = ScriptedLauncher::with_sessions(vec![vec![
            "{\"returned\": [\"div\"]}\n",
            "{\"returned\": 2.5}\n",
            "{\"raised\": {\"kind\": \"ZeroDivisionError\", \"message\": \"division by zero\"}}\n",
        ]]);
        let module = import(&launcher, repo.path(), "lab1.py").unwrap();
        let div = module.function("div").unwrap();

        assert_eq!(div.call(&[Value::Int(5), Value::Int(2)]), Ok(Value::Float(2.5)));
        assert_eq!(
            div.call(&[Value::Int(1), Value::Int(0)]),
            Err(CallError::raised("ZeroDivisionError", "division by zero"))
        );
        assert!(matches!(div.call(&[]), Err(CallError::Raised { ref kind, .. }) if kind == "ProcessError"));

        assert_eq!(launcher.launches.borrow().len(), 1);
        let sent = launcher.sent.borrow();
        let first: Json = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(first, json!({ "call": "div", "args": [5, 2] }));
    }

    #[test]
    fn test_build_lesson_scopes_cases_to_module() {
        let repo = student_repo("");
        let launcher = ScriptedLauncher::with_sessions(vec![vec![
            "{\"returned\": [\"add\"]}\n",
            "{\"returned\": [{\"function\": \"add\", \"args\": [1, 2], \"expected\": 3, \"tolerance\": null}]}\n",
        ]]);
        let module = import(&launcher, repo.path(), "lab1.py").unwrap();

        let lesson = module.build_lesson(Path::new("/course/tests"), "lesson_tests").unwrap();
        assert_eq!(lesson.cases.len(), 1);
        assert_eq!(lesson.cases[0].function, "add");
        assert_eq!(lesson.cases[0].module.as_deref(), Some("lab1"));

        let sent: Json = serde_json::from_str(&launcher.sent.borrow()[0]).unwrap();
        assert_eq!(sent["build"]["module"], "lesson_tests");
    }

    #[test]
    fn test_build_lesson_instructor_error() {
        let repo = student_repo("");
        let launcher = ScriptedLauncher::with_sessions(vec![vec![
            "{\"returned\": []}\n",
            "{\"raised\": {\"kind\": \"AttributeError\", \"message\": \"module 'lesson_tests' has no attribute 'TestBuilder'\"}}\n",
        ]]);
        let module = import(&launcher, repo.path(), "lab1.py").unwrap();
        let err = module.build_lesson(Path::new("."), "lesson_tests").unwrap_err();
        assert_eq!(
            err.to_string(),
            "AttributeError: module 'lesson_tests' has no attribute 'TestBuilder'"
        );
    }

    fn python_available() -> bool {
        Command::new("python3").arg("--version").output().is_ok_and(|o| o.status.success())
    }

    #[test]
    fn test_real_interpreter_round_trip() {
        if !python_available() {
            return; // Skip if python3 is not installed
        }
        let repo = student_repo(
            "def add(a: int, b: int) -> int:\n    print('noise')\n    return a + b\n\n\
             def pair(x: int) -> tuple:\n    return (x, x)\n\n\
             def ask() -> str:\n    return input()\n\n\
             def boom() -> None:\n    raise ValueError('bad')\n",
        );
        let module = import(&SystemLauncher, repo.path(), "lab1.py").unwrap();

        let mut names = module.function_names();
        names.sort();
        assert_eq!(names, vec!["add", "ask", "boom", "pair"]);

        let add = module.function("add").unwrap();
        assert_eq!(add.call(&[Value::Int(2), Value::Int(3)]), Ok(Value::Int(5)));
        let pair = module.function("pair").unwrap();
        assert_eq!(pair.call(&[Value::Int(1)]).unwrap().to_string(), "(1, 1)");
        let ask = module.function("ask").unwrap();
        assert!(matches!(ask.call(&[]), Err(CallError::Raised { ref kind, .. }) if kind == "EOFError"));
        let boom = module.function("boom").unwrap();
        assert_eq!(boom.call(&[]), Err(CallError::raised("ValueError", "bad")));
        assert_eq!(add.call(&[Value::Int(1), Value::Int(1)]), Ok(Value::Int(2)));
    }

    #[test]
    fn test_module_state_persists_across_calls() {
        if !python_available() {
            return; // Skip if python3 is not installed
        }
        let repo = tempfile::tempdir().unwrap();
        fs::write(
            repo.path().join("counter.py"),
            "COUNT = 0\n\n\ndef bump() -> int:\n    global COUNT\n    COUNT += 1\n    return COUNT\n",
        )
        .unwrap();
        let module = import(&SystemLauncher, repo.path(), "counter.py").unwrap();
        let bump = module.function("bump").unwrap();

        assert_eq!(bump.call(&[]), Ok(Value::Int(1)));
        assert_eq!(bump.call(&[]), Ok(Value::Int(2)));
        assert_eq!(module.function("bump").unwrap().call(&[]), Ok(Value::Int(3)));
    }
}
