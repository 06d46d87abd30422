/// TechniqueCache - one compilation per source identity
///
/// The cache is an explicit, constructor-injected object: whoever builds
/// materials decides which cache (and therefore which compiler and device)
/// they share. Two materials created from the same source path and define
/// set receive the same `Arc<Technique>`; the shader is compiled once.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::device::RenderDevice;
use crate::error::Result;
use crate::shader::compiler::ShaderCompiler;
use crate::shader::source::ShaderSource;
use crate::shader::technique::Technique;

/// Shared cache of compiled techniques keyed by source identity
pub struct TechniqueCache {
    compiler: Arc<dyn ShaderCompiler>,
    device: Arc<Mutex<dyn RenderDevice>>,
    entries: Mutex<FxHashMap<String, Arc<Technique>>>,
}

impl TechniqueCache {
    pub fn new(compiler: Arc<dyn ShaderCompiler>, device: Arc<Mutex<dyn RenderDevice>>) -> Self {
        Self {
            compiler,
            device,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Cache key for a source path plus its define set
    ///
    /// Defines are folded in sorted order so the identity never depends on
    /// insertion order.
    pub fn identity_for(path: &str, defines: &BTreeMap<String, String>) -> String {
        let mut identity = String::from(path);
        for (name, value) in defines {
            identity.push('|');
            identity.push_str(name);
            identity.push('=');
            identity.push_str(value);
        }
        identity
    }

    /// Return the cached technique for `source` + `defines`, compiling it
    /// on first request
    ///
    /// The define set is prepended to the source text as `#define` lines so
    /// each define combination compiles its own variant.
    pub fn create_or_get(
        &self,
        source: &ShaderSource,
        defines: &BTreeMap<String, String>,
    ) -> Result<Arc<Technique>> {
        let identity = Self::identity_for(source.path(), defines);

        let mut entries = self.entries.lock().map_err(|_| {
            crate::engine_err!("hydra::TechniqueCache", "entries lock poisoned")
        })?;
        if let Some(technique) = entries.get(&identity) {
            crate::engine_trace!("hydra::TechniqueCache",
                "Cache hit for '{}'", identity);
            return Ok(Arc::clone(technique));
        }

        let text = apply_defines(source.text(), defines);
        let technique = {
            let mut device = self.device.lock().map_err(|_| {
                crate::engine_err!("hydra::TechniqueCache", "device lock poisoned")
            })?;
            Technique::build(&identity, source, &text, self.compiler.as_ref(), &mut *device)?
        };

        let technique = Arc::new(technique);
        entries.insert(identity, Arc::clone(&technique));
        Ok(technique)
    }

    /// Device shared with the cache's techniques
    pub fn device(&self) -> &Arc<Mutex<dyn RenderDevice>> {
        &self.device
    }

    /// Number of cached techniques
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn apply_defines(text: &str, defines: &BTreeMap<String, String>) -> String {
    if defines.is_empty() {
        return text.to_string();
    }
    let mut out = String::new();
    for (name, value) in defines {
        out.push_str("#define ");
        out.push_str(name);
        out.push(' ');
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(text);
    out
}

#[cfg(test)]
#[path = "technique_cache_tests.rs"]
mod tests;
