//! Student repository helpers
//!
//! Generates:
//! - `.pylintrc` and `mypy.ini` with the course's suppressed rules (only when absent)
//! - an empty `__init__.py` so the repository is importable as a package by the tools
//!
//! Also renders a directory listing so graders can see what the student submitted.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{DEFAULT_MYPY_EXCLUDES, HarnessConfig};
use crate::version::AUTOGRADE_VERSION;

/// Generate `.pylintrc` content
pub fn pylintrc_contents(repo: &Path, config: &HarnessConfig) -> String {
    format!(
        r#"# Generated by autograde {version}

[MASTER]
ignore={ignore}

[MESSAGES CONTROL]
disable={disabled}
"#,
        version = AUTOGRADE_VERSION,
        ignore = repo.join(&config.lint_ignore_dir).display(),
        disabled = config.disabled_lints.join(","),
    )
}

/// Generate `mypy.ini` content
pub fn mypy_ini_contents(repo: &Path) -> String {
    format!(
        r#"# Generated by autograde {version}

[mypy]
disallow_untyped_defs = True
exclude = {repo}/({excludes})/

[mypy-*.migrations.*]
ignore_errors = True
"#,
        version = AUTOGRADE_VERSION,
        repo = repo.display(),
        excludes = DEFAULT_MYPY_EXCLUDES.join("|"),
    )
}

/// Write the linter and type checker configuration into `repo`, skipping files that already exist.
///
/// Returns the paths that were written.
pub fn write_default_configs(repo: &Path, config: &HarnessConfig) -> io::Result<Vec<PathBuf>> {
    let files = [
        (repo.join(&config.pylintrc_name), pylintrc_contents(repo, config)),
        (repo.join(&config.mypy_config_name), mypy_ini_contents(repo)),
    ];

    let mut written = Vec::new();
    for (path, contents) in files {
        if path.exists() {
            tracing::debug!(path = %path.display(), "configuration already present");
            continue;
        }
        fs::write(&path, contents)?;
        tracing::info!(path = %path.display(), "wrote default configuration");
        written.push(path);
    }
    Ok(written)
}

/// Create an empty `__init__.py` in `root` if there is none. Returns whether a file was created.
pub fn ensure_init_py(root: &Path) -> io::Result<bool> {
    let init = root.join("__init__.py");
    if init.is_file() {
        return Ok(false);
    }
    fs::write(&init, "")?;
    tracing::info!(path = %init.display(), "created __init__.py");
    Ok(true)
}

/// Sorted contents of one directory (not recursive).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl DirectoryListing {
    pub fn read(path: &Path) -> io::Result<Self> {
        let mut listing = DirectoryListing::default();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_dir() {
                listing.directories.push(name);
            } else {
                listing.files.push(name);
            }
        }
        listing.directories.sort();
        listing.files.sort();
        Ok(listing)
    }
}

impl fmt::Display for DirectoryListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Directories:")?;
        for dir in &self.directories {
            writeln!(f, "  [D] {}", dir)?;
        }
        writeln!(f)?;
        writeln!(f, "Files:")?;
        for file in &self.files {
            writeln!(f, "  [F] {}", file)?;
        }
        Ok(())
    }
}
