/// Scriptable ShaderCompiler for tests
///
/// Reflections are registered per entry point up front; compile calls are
/// counted so caching behaviour can be asserted. Entry points can also be
/// scripted to fail with a fixed diagnostic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::shader::compiler::{CompiledStage, ShaderCompiler, StageReflection};

/// GPU-free compiler returning pre-registered reflections
pub struct MockCompiler {
    reflections: Mutex<FxHashMap<String, StageReflection>>,
    failures: Mutex<FxHashMap<String, String>>,
    compile_count: AtomicUsize,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self {
            reflections: Mutex::new(FxHashMap::default()),
            failures: Mutex::new(FxHashMap::default()),
            compile_count: AtomicUsize::new(0),
        }
    }

    /// Register the reflection returned for `entry_point`
    pub fn script_reflection(&self, entry_point: &str, reflection: StageReflection) {
        if let Ok(mut reflections) = self.reflections.lock() {
            reflections.insert(entry_point.to_string(), reflection);
        }
    }

    /// Make `entry_point` fail with `diagnostic`
    pub fn script_failure(&self, entry_point: &str, diagnostic: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(entry_point.to_string(), diagnostic.to_string());
        }
    }

    /// Total number of compile calls, successful or not
    pub fn compile_count(&self) -> usize {
        self.compile_count.load(Ordering::SeqCst)
    }
}

impl Default for MockCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderCompiler for MockCompiler {
    fn compile(
        &self,
        _source: &str,
        entry_point: &str,
        profile: &str,
    ) -> std::result::Result<CompiledStage, String> {
        self.compile_count.fetch_add(1, Ordering::SeqCst);

        if let Ok(failures) = self.failures.lock() {
            if let Some(diagnostic) = failures.get(entry_point) {
                return Err(diagnostic.clone());
            }
        }

        let reflection = self
            .reflections
            .lock()
            .ok()
            .and_then(|r| r.get(entry_point).cloned())
            .unwrap_or_default();

        // Bytecode content is irrelevant; the mock device only rejects
        // empty byte slices.
        let bytecode = format!("{}:{}", profile, entry_point).into_bytes();
        Ok(CompiledStage { bytecode, reflection })
    }
}
