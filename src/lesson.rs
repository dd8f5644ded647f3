//! Instructor test specifications
//!
//! An instructor supplies a [`TestBuilder`]: given a caller-owned [`Recorder`] and an imported
//! [`StudentModule`], it records expectations against the module's functions.
//!
//! The CLI uses [`LessonFile`], a JSON document listing cases:
//!
//! ```json
//! {
//!   "cases": [
//!     { "function": "add", "args": [1, 2], "expected": 3 },
//!     { "function": "area", "args": [2.0], "expected": 12.566, "tolerance": 0.01, "module": "circle" }
//!   ]
//! }
//! ```
//!
//! A case with `module` binds only to that module (and the module must define the function). A case without
//! `module` binds to every student module that defines the function.
//!
//! Instructors can also ship `lesson_tests.py` with a `TestBuilder` class whose `build_tests(expect, module)` calls
//! `expect(func, *args, expected=..., tolerance=None)`. [`LessonSource::locate`] finds it, and
//! [`crate::python::PythonModule::build_lesson`] runs it against each student module to produce a [`LessonFile`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use autograde_core::{Recorder, Value};
use serde::Deserialize;
use thiserror::Error;

use crate::json;
use crate::module::StudentModule;

/// File looked up when the lesson path is a directory.
pub const LESSON_FILE_NAME: &str = "lesson_tests.json";

/// Python module looked up when a lesson directory has no [`LESSON_FILE_NAME`].
pub const LESSON_MODULE_NAME: &str = "lesson_tests";

/// Errors loading or applying an instructor specification. All of them halt the run.
#[derive(Debug, Error)]
pub enum LessonError {
    #[error("instructor test specification not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid instructor test specification {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}", missing_function_message(.function, .module.as_deref()))]
    MissingFunction { function: String, module: Option<String> },

    #[error("{0}")]
    Builder(String),
}

fn missing_function_message(function: &str, module: Option<&str>) -> String {
    match module {
        Some(m) => format!("module '{}' has no function '{}'", m, function),
        None => format!("no student module defines function '{}'", function),
    }
}

/// Populate a recorder from a student module.
pub trait TestBuilder {
    fn build_tests(&self, recorder: &mut Recorder, module: &dyn StudentModule) -> Result<(), LessonError>;
}

impl<F> TestBuilder for F
where
    F: Fn(&mut Recorder, &dyn StudentModule) -> Result<(), LessonError>,
{
    fn build_tests(&self, recorder: &mut Recorder, module: &dyn StudentModule) -> Result<(), LessonError> {
        self(recorder, module)
    }
}

/// One declared case in a lesson file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LessonCase {
    pub function: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    pub expected: serde_json::Value,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub module: Option<String>,
}

impl LessonCase {
    fn targets(&self, module: &dyn StudentModule) -> bool {
        match &self.module {
            Some(name) => name == module.name(),
            None => module.has_function(&self.function),
        }
    }
}

/// A JSON lesson file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LessonFile {
    #[serde(default)]
    pub description: Option<String>,
    pub cases: Vec<LessonCase>,
}

impl LessonFile {
    /// Parse lesson JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a lesson from a `.json` file, or from `lesson_tests.json` inside a directory.
    pub fn load(path: &Path) -> Result<Self, LessonError> {
        let file = if path.is_dir() {
            path.join(LESSON_FILE_NAME)
        } else {
            path.to_path_buf()
        };
        if !file.is_file() {
            return Err(LessonError::NotFound(file));
        }

        let text = fs::read_to_string(&file).map_err(|source| LessonError::Read {
            path: file.clone(),
            source,
        })?;
        let lesson = Self::from_json(&text).map_err(|source| LessonError::Parse { path: file.clone(), source })?;
        tracing::debug!(path = %file.display(), cases = lesson.cases.len(), "loaded lesson");
        Ok(lesson)
    }

    /// Check that every case binds to at least one of `modules`.
    pub fn verify_bindings(&self, modules: &[&dyn StudentModule]) -> Result<(), LessonError> {
        for case in &self.cases {
            let bound = modules
                .iter()
                .any(|m| case.targets(*m) && m.has_function(&case.function));
            if !bound {
                return Err(LessonError::MissingFunction {
                    function: case.function.clone(),
                    module: case.module.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Where the instructor tests come from.
#[derive(Debug, Clone)]
pub enum LessonSource {
    Json(LessonFile),
    /// A Python module defining `TestBuilder`, imported from `dir`.
    Python { dir: PathBuf, module: String },
}

impl LessonSource {
    /// Resolve `path`: a `.py` file, a `.json` file, or a directory holding `lesson_tests.json` or
    /// `lesson_tests.py` (JSON wins when both exist).
    pub fn locate(path: &Path) -> Result<Self, LessonError> {
        if path.is_dir() {
            if path.join(LESSON_FILE_NAME).is_file() {
                return LessonFile::load(path).map(Self::Json);
            }
            if path.join(format!("{}.py", LESSON_MODULE_NAME)).is_file() {
                return Ok(Self::Python {
                    dir: path.to_path_buf(),
                    module: LESSON_MODULE_NAME.to_string(),
                });
            }
            return Err(LessonError::NotFound(path.join(LESSON_FILE_NAME)));
        }

        if path.extension().is_some_and(|ext| ext == "py") {
            if !path.is_file() {
                return Err(LessonError::NotFound(path.to_path_buf()));
            }
            let module = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .ok_or_else(|| LessonError::NotFound(path.to_path_buf()))?;
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            return Ok(Self::Python { dir, module });
        }

        LessonFile::load(path).map(Self::Json)
    }
}

impl TestBuilder for LessonFile {
    fn build_tests(&self, recorder: &mut Recorder, module: &dyn StudentModule) -> Result<(), LessonError> {
        for case in self.cases.iter().filter(|c| c.targets(module)) {
            let function = module
                .function(&case.function)
                .ok_or_else(|| LessonError::MissingFunction {
                    function: case.function.clone(),
                    module: Some(module.name().to_string()),
                })?;
            let args: Vec<Value> = case.args.iter().cloned().map(json::from_json).collect();
            recorder.record(function, args, json::from_json(case.expected.clone()), case.tolerance);
        }
        Ok(())
    }
}
