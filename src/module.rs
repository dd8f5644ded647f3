//! Student modules: named collections of callable functions.

use autograde_core::Function;

/// A loaded student module that lesson builders reflect on.
pub trait StudentModule {
    /// Module name (for Python sources, the file stem).
    fn name(&self) -> &str;

    /// Names of the module's top-level functions.
    fn function_names(&self) -> Vec<String>;

    /// Look up a function by name.
    fn function(&self, name: &str) -> Option<Function>;

    fn has_function(&self, name: &str) -> bool {
        self.function_names().iter().any(|n| n == name)
    }
}

/// In-memory module of native Rust functions.
#[derive(Debug, Clone, Default)]
pub struct NativeModule {
    name: String,
    functions: Vec<Function>,
}

impl NativeModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    /// Add a function; a later function with the same name shadows an earlier one.
    pub fn with_function(mut self, function: Function) -> Self {
        self.functions.retain(|f| f.name() != function.name());
        self.functions.push(function);
        self
    }
}

impl StudentModule for NativeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn function_names(&self) -> Vec<String> {
        self.functions.iter().map(|f| f.name().to_string()).collect()
    }

    fn function(&self, name: &str) -> Option<Function> {
        self.functions.iter().find(|f| f.name() == name).cloned()
    }
}
