/// RenderManager - per-frame orchestration of the stage pipeline
///
/// The manager owns the shared `Graphics` context, the ordered stage list
/// and a per-stage submission queue. Each frame: callers submit instances
/// to named stages, then `render_frame` runs every stage in registration
/// order against its queued instances. Instances are drawn in submission
/// order; the manager never reorders them.
///
/// Stage failures are contained: a stage that errors is logged and skipped,
/// the rest of the frame still renders.

use std::sync::{Arc, Mutex};

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

use crate::device::{DrawArguments, RenderDevice, TextureHandle};
use crate::error::Result;
use crate::graphics::Graphics;
use crate::stage::{FrameView, RenderStage};

/// Per-surface textures of one drawable instance
///
/// Only `albedo` is expected in practice; every other channel is optional
/// and the geometry pass tells the shader which ones are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceTextures {
    pub albedo: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub roughness: Option<TextureHandle>,
    pub metallic: Option<TextureHandle>,
    pub ao: Option<TextureHandle>,
    pub emission: Option<TextureHandle>,
}

/// One drawable submitted to a stage for the current frame
#[derive(Debug, Clone)]
pub struct RenderInstance {
    pub surfaces: SurfaceTextures,
    pub model_matrix: Mat4,
    pub draw_args: DrawArguments,
}

/// Camera state for the frame, including the view dimensions
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    pub projection: Mat4,
    pub view: Mat4,
    pub position: Vec3,
    pub width: u32,
    pub height: u32,
}

impl CameraState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            position: Vec3::ZERO,
            width,
            height,
        }
    }
}

/// Owns the stage pipeline and drives it once per frame
pub struct RenderManager {
    graphics: Graphics,
    stages: Vec<Box<dyn RenderStage>>,
    queues: FxHashMap<String, Vec<RenderInstance>>,
    camera: CameraState,
    sample_count: u32,
}

impl RenderManager {
    /// Build the manager and its graphics context for an initial view size
    pub fn new(device: Arc<Mutex<dyn RenderDevice>>, width: u32, height: u32) -> Result<Self> {
        let graphics = Graphics::new(device)?;
        crate::engine_info!("hydra::RenderManager",
            "Render manager initialized ({}x{})", width, height);
        Ok(Self {
            graphics,
            stages: Vec::new(),
            queues: FxHashMap::default(),
            camera: CameraState::new(width, height),
            sample_count: 1,
        })
    }

    pub fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.graphics
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Change the MSAA sample count; every stage's view-sized targets are
    /// recreated with the new count
    pub fn set_sample_count(&mut self, sample_count: u32) {
        if sample_count == self.sample_count {
            return;
        }
        self.sample_count = sample_count;
        self.resize(self.camera.width, self.camera.height);
    }

    /// Replace the frame camera; a changed view size triggers a resize
    pub fn set_camera(&mut self, camera: CameraState) {
        let resized = camera.width != self.camera.width || camera.height != self.camera.height;
        self.camera = camera;
        if resized {
            self.resize(camera.width, camera.height);
        }
    }

    /// Append a stage to the pipeline, allocating its view-sized resources
    pub fn add_stage(&mut self, mut stage: Box<dyn RenderStage>) -> Result<()> {
        stage.allocate_view_dependent_resources(
            &mut self.graphics,
            self.camera.width,
            self.camera.height,
            self.sample_count,
        )?;
        crate::engine_info!("hydra::RenderManager", "Added render stage '{}'", stage.name());
        self.stages.push(stage);
        Ok(())
    }

    /// Recreate every stage's view-sized resources for the new dimensions
    ///
    /// Always recreates, even for the same size. A stage that fails to
    /// reallocate is logged and left in place; the others still resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.width = width;
        self.camera.height = height;
        for stage in &mut self.stages {
            if let Err(err) = stage.allocate_view_dependent_resources(
                &mut self.graphics,
                width,
                height,
                self.sample_count,
            ) {
                crate::engine_error!("hydra::RenderManager",
                    "Stage '{}' failed to resize to {}x{}: {}",
                    stage.name(), width, height, err);
            }
        }
    }

    /// Queue an instance for a named stage this frame
    ///
    /// Instances are drawn in the order they were submitted.
    pub fn submit(&mut self, stage_name: &str, instance: RenderInstance) {
        self.queues.entry(stage_name.to_string()).or_default().push(instance);
    }

    /// Run every stage in registration order against its queued instances
    ///
    /// Queues are drained; a failing stage is logged and skipped.
    pub fn render_frame(&mut self) {
        for stage in &mut self.stages {
            let renderers = self.queues.remove(stage.name()).unwrap_or_default();
            let view = FrameView {
                camera: &self.camera,
                renderers: &renderers,
            };
            if let Err(err) = stage.render(&mut self.graphics, &view) {
                crate::engine_error!("hydra::RenderManager",
                    "Stage '{}' failed to render: {}", stage.name(), err);
            }
        }
        // Submissions to unknown stages would otherwise pile up forever.
        self.queues.clear();
    }

    /// Color output of the last stage, the frame's final image
    pub fn final_output(&self) -> Result<TextureHandle> {
        match self.stages.last() {
            Some(stage) => self.graphics.get_render_target(stage.output_name()),
            None => {
                crate::engine_error!("hydra::RenderManager", "No stages registered");
                Err(crate::hydra::Error::MissingResource("final output".to_string()))
            }
        }
    }
}

#[cfg(test)]
#[path = "render_manager_tests.rs"]
mod tests;
