/*!
# Hydra Render Engine

Core of a real-time deferred PBR renderer: material/shader variable binding,
technique caching and multi-pass render stage orchestration.

The crate sits between a scene layer and a graphics device. Both sides are
trait collaborators:

- **RenderDevice**: GPU resource factory and draw submission (a mock
  implementation is provided for GPU-free testing)
- **ShaderCompiler**: turns shader source + entry point into bytecode plus a
  reflected constant-buffer layout

On top of those, the crate provides:

- **VariableStore / Material**: typed named parameters over type-erased byte
  storage, resolved to reflected constant-buffer regions and texture slots
- **TechniqueCache**: one compilation per shader-source identity, shared
  `Technique` references
- **Graphics**: named render targets, samplers and full-screen/cube-map
  composite helpers
- **DeferredStage / RenderManager**: the deferred G-buffer + IBL composite
  pipeline, run once per frame
*/

// Internal modules
mod error;

pub mod log;
pub mod device;
pub mod shader;
pub mod material;
pub mod graphics;
pub mod stage;
pub mod render_manager;

// Main hydra namespace module
pub mod hydra {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Device sub-module with all device-facing types
    pub mod device {
        pub use crate::device::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Material sub-module
    pub mod material {
        pub use crate::material::*;
    }

    // Graphics context
    pub use crate::graphics::Graphics;

    // Render stages
    pub mod stage {
        pub use crate::stage::*;
    }

    pub use crate::render_manager::{CameraState, RenderInstance, RenderManager, SurfaceTextures};
}

// Re-export math library at crate root
pub use glam;
