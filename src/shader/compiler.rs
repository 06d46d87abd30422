/// ShaderCompiler trait and reflection types
///
/// The compiler is an external collaborator: it turns shader source text
/// plus an entry point into stage bytecode and the reflected resource
/// layout the material system binds against.

/// One constant-buffer variable reported by the compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedVariable {
    /// Variable name as written in the shader
    pub name: String,
    /// Byte offset within the stage's constant buffer
    pub offset: u32,
    /// Byte size of the variable
    pub size: u32,
}

/// Reflected resource layout of one compiled stage
///
/// The layout is reported by the compiler, not derived from source order.
#[derive(Debug, Clone, Default)]
pub struct StageReflection {
    /// Total constant-buffer byte size for the stage
    pub constant_buffer_size: u32,
    /// Constant-buffer variables
    pub variables: Vec<ReflectedVariable>,
    /// Texture bindings: (name, slot)
    pub textures: Vec<(String, u32)>,
    /// Sampler bindings: (name, slot)
    pub samplers: Vec<(String, u32)>,
}

/// Output of a successful stage compilation
#[derive(Debug, Clone)]
pub struct CompiledStage {
    /// Compiled bytecode, handed to `RenderDevice::create_shader`
    pub bytecode: Vec<u8>,
    pub reflection: StageReflection,
}

/// Shader compilation collaborator
///
/// Failure returns the compiler's diagnostic string; the caller decides
/// whether a missing stage is fatal.
pub trait ShaderCompiler: Send + Sync {
    /// Compile `source` at `entry_point` for the given target profile
    /// (e.g. "vs_5_0", "ps_5_0")
    fn compile(
        &self,
        source: &str,
        entry_point: &str,
        profile: &str,
    ) -> std::result::Result<CompiledStage, String>;
}
