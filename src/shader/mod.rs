/// Shader module - compilation collaborator, techniques and the technique cache

// Module declarations
pub mod compiler;
pub mod source;
pub mod technique;
pub mod technique_cache;
pub mod mock_compiler;

// Re-exports
pub use compiler::*;
pub use source::*;
pub use technique::*;
pub use technique_cache::*;
