/// Technique - compiled stage programs plus their reflected layouts
///
/// A Technique is shared by every Material built from the same shader
/// source; it owns nothing mutable and lives as long as the longest-living
/// Material referencing it.

use std::collections::BTreeMap;

use crate::device::{RenderDevice, ShaderHandle, ShaderStage};
use crate::error::{Error, Result};
use crate::shader::compiler::{ShaderCompiler, StageReflection};
use crate::shader::source::ShaderSource;

/// Binding of one named variable inside a stage's constant buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarBinding {
    pub offset: u32,
    pub size: u32,
}

/// Deterministic, name-keyed layout of one compiled stage
///
/// Built from the compiler-reported reflection; keyed by name so lookup
/// order never depends on declaration order in the source.
#[derive(Debug, Clone, Default)]
pub struct StageLayout {
    /// Total constant-buffer byte size
    pub constant_buffer_size: u32,
    variables: BTreeMap<String, VarBinding>,
    textures: BTreeMap<String, u32>,
    samplers: BTreeMap<String, u32>,
}

impl StageLayout {
    /// Build the name-keyed layout from raw reflection data
    pub fn from_reflection(reflection: &StageReflection) -> Self {
        let mut variables = BTreeMap::new();
        for var in &reflection.variables {
            variables.insert(var.name.clone(), VarBinding { offset: var.offset, size: var.size });
        }
        let textures = reflection.textures.iter().cloned().collect();
        let samplers = reflection.samplers.iter().cloned().collect();
        Self {
            constant_buffer_size: reflection.constant_buffer_size,
            variables,
            textures,
            samplers,
        }
    }

    /// Constant-buffer binding for a variable name
    pub fn variable(&self, name: &str) -> Option<VarBinding> {
        self.variables.get(name).copied()
    }

    /// Iterate constant-buffer variables in name order
    pub fn variables(&self) -> impl Iterator<Item = (&str, VarBinding)> {
        self.variables.iter().map(|(n, b)| (n.as_str(), *b))
    }

    /// Texture slot for a name
    pub fn texture_slot(&self, name: &str) -> Option<u32> {
        self.textures.get(name).copied()
    }

    /// Iterate texture bindings in name order
    pub fn textures(&self) -> impl Iterator<Item = (&str, u32)> {
        self.textures.iter().map(|(n, s)| (n.as_str(), *s))
    }

    /// Sampler slot for a name
    pub fn sampler_slot(&self, name: &str) -> Option<u32> {
        self.samplers.get(name).copied()
    }

    /// Iterate sampler bindings in name order
    pub fn samplers(&self) -> impl Iterator<Item = (&str, u32)> {
        self.samplers.iter().map(|(n, s)| (n.as_str(), *s))
    }
}

/// One compiled stage of a technique
#[derive(Debug, Clone)]
pub struct StageProgram {
    pub stage: ShaderStage,
    pub entry_point: String,
    /// Device handle of the compiled shader
    pub shader: ShaderHandle,
    pub layout: StageLayout,
}

/// A compiled set of stage programs derived from one shader source
#[derive(Debug)]
pub struct Technique {
    identity: String,
    source_path: String,
    render_stage: Option<String>,
    stages: BTreeMap<ShaderStage, StageProgram>,
}

impl Technique {
    /// Compile every declared stage of `source`
    ///
    /// Per-stage compile failures are logged with the source path and the
    /// stage is simply absent from the technique. Only when every declared
    /// stage fails is the whole build an error.
    pub fn build(
        identity: &str,
        source: &ShaderSource,
        text: &str,
        compiler: &dyn ShaderCompiler,
        device: &mut dyn RenderDevice,
    ) -> Result<Self> {
        if source.entry_points().is_empty() {
            crate::engine_error!("hydra::Technique",
                "'{}' declares no shader stages", source.path());
            return Err(Error::CompileFailure(format!(
                "{}: no shader stages declared", source.path()
            )));
        }

        let mut stages = BTreeMap::new();
        for (stage, entry_point) in source.entry_points() {
            let compiled = match compiler.compile(text, entry_point, stage.profile()) {
                Ok(compiled) => compiled,
                Err(diagnostic) => {
                    crate::engine_error!("hydra::Technique",
                        "'{}' {:?} entry '{}' failed to compile: {}",
                        source.path(), stage, entry_point, diagnostic);
                    continue;
                }
            };

            let shader = device.create_shader(*stage, &compiled.bytecode)?;
            stages.insert(*stage, StageProgram {
                stage: *stage,
                entry_point: entry_point.clone(),
                shader,
                layout: StageLayout::from_reflection(&compiled.reflection),
            });
        }

        if stages.is_empty() {
            return Err(Error::CompileFailure(format!(
                "{}: every declared stage failed to compile", source.path()
            )));
        }

        crate::engine_debug!("hydra::Technique",
            "Built technique '{}' from '{}' ({} stages)",
            identity, source.path(), stages.len());

        Ok(Self {
            identity: identity.to_string(),
            source_path: source.path().to_string(),
            render_stage: source.render_stage().map(|s| s.to_string()),
            stages,
        })
    }

    /// Cache key this technique was built under
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Asset path of the source
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Render stage tag declared by the source, if any
    pub fn render_stage(&self) -> Option<&str> {
        self.render_stage.as_deref()
    }

    /// Compiled program for a stage; None when the source never declared it
    /// or its compilation failed
    pub fn stage(&self, stage: ShaderStage) -> Option<&StageProgram> {
        self.stages.get(&stage)
    }

    /// Iterate compiled stages in pipeline order
    pub fn stages(&self) -> impl Iterator<Item = &StageProgram> {
        self.stages.values()
    }

    /// Number of compiled stages
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

#[cfg(test)]
#[path = "technique_tests.rs"]
mod tests;
