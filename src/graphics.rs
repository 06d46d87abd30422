/// Graphics - shared rendering context
///
/// Owns the named resource registries (render targets, samplers, input
/// layouts) on top of the device. Named lookups fail loudly: a stage asking
/// for a target that was never created (or already released) gets a
/// `MissingResource` error, never a silent default.
///
/// Also provides the two geometry-free draw helpers every screen-space and
/// capture pass is built from: `composite` (full-screen triangle pair) and
/// `render_cube_map` (per-face, per-mip capture).

use std::f32::consts::FRAC_PI_2;
use std::sync::{Arc, Mutex};

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

use crate::device::{
    Color, DrawArguments, DrawState, InputLayoutHandle, RenderDevice, SamplerDesc, SamplerHandle,
    ShaderHandle, TargetBinding, TextureDesc, TextureFormat, TextureHandle, VertexAttributeDesc,
    Viewport,
};
use crate::error::{Error, Result};
use crate::material::Material;

/// Sampler every stage can rely on; created with the context
pub const DEFAULT_SAMPLER: &str = "DefaultSampler";

/// Index count of the full-screen triangle pair
const FULLSCREEN_INDEX_COUNT: u32 = 6;
/// Index count of the unit capture cube
const CUBE_INDEX_COUNT: u32 = 36;

/// Shared rendering context: device plus named resource registries
pub struct Graphics {
    device: Arc<Mutex<dyn RenderDevice>>,
    render_targets: FxHashMap<String, TextureHandle>,
    samplers: FxHashMap<String, SamplerHandle>,
    input_layouts: FxHashMap<String, InputLayoutHandle>,
}

impl Graphics {
    /// Build the context and create the default sampler
    pub fn new(device: Arc<Mutex<dyn RenderDevice>>) -> Result<Self> {
        let mut graphics = Self {
            device,
            render_targets: FxHashMap::default(),
            samplers: FxHashMap::default(),
            input_layouts: FxHashMap::default(),
        };
        graphics.create_sampler(DEFAULT_SAMPLER, SamplerDesc::default())?;
        Ok(graphics)
    }

    /// Device shared with materials and stages
    pub fn device(&self) -> &Arc<Mutex<dyn RenderDevice>> {
        &self.device
    }

    fn lock_device(&self) -> Result<std::sync::MutexGuard<'_, dyn RenderDevice + 'static>> {
        self.device.lock().map_err(|_| {
            crate::engine_err!("hydra::Graphics", "device lock poisoned")
        })
    }

    // ===== Named render targets =====

    /// Create (or replace) a named 2D render target
    ///
    /// Replacing destroys the previous texture first, so a resize is always
    /// a full release and recreate.
    pub fn create_render_target(
        &mut self,
        name: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
        clear_color: Color,
        sample_count: u32,
    ) -> Result<TextureHandle> {
        self.register_target(
            name,
            TextureDesc::render_target(name, format, width, height, clear_color, sample_count),
        )
    }

    /// Create (or replace) a named cube-map render target with `mip_levels`
    pub fn create_render_target_cube(
        &mut self,
        name: &str,
        format: TextureFormat,
        size: u32,
        mip_levels: u32,
    ) -> Result<TextureHandle> {
        self.register_target(
            name,
            TextureDesc::render_target_cube(name, format, size, Color::TRANSPARENT, mip_levels),
        )
    }

    fn register_target(&mut self, name: &str, desc: TextureDesc) -> Result<TextureHandle> {
        if let Some(previous) = self.render_targets.remove(name) {
            let mut device = self.lock_device()?;
            device.destroy_texture(previous)?;
        }
        let handle = {
            let mut device = self.lock_device()?;
            device.create_texture(desc)?
        };
        crate::engine_trace!("hydra::Graphics", "Created render target '{}'", name);
        self.render_targets.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Look up a named render target; unknown names are an error
    pub fn get_render_target(&self, name: &str) -> Result<TextureHandle> {
        self.render_targets.get(name).copied().ok_or_else(|| {
            crate::engine_error!("hydra::Graphics",
                "Render target '{}' does not exist", name);
            Error::MissingResource(format!("render target '{}'", name))
        })
    }

    /// Destroy a named render target and forget its name
    pub fn release_render_target(&mut self, name: &str) -> Result<()> {
        let handle = self.render_targets.remove(name).ok_or_else(|| {
            crate::engine_error!("hydra::Graphics",
                "Cannot release unknown render target '{}'", name);
            Error::MissingResource(format!("render target '{}'", name))
        })?;
        let mut device = self.lock_device()?;
        device.destroy_texture(handle)
    }

    /// Whether a named render target currently exists
    pub fn has_render_target(&self, name: &str) -> bool {
        self.render_targets.contains_key(name)
    }

    // ===== Named samplers =====

    /// Create (or replace) a named sampler
    pub fn create_sampler(&mut self, name: &str, desc: SamplerDesc) -> Result<SamplerHandle> {
        let handle = {
            let mut device = self.lock_device()?;
            device.create_sampler(desc)?
        };
        self.samplers.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Look up a named sampler; unknown names are an error
    pub fn get_sampler(&self, name: &str) -> Result<SamplerHandle> {
        self.samplers.get(name).copied().ok_or_else(|| {
            crate::engine_error!("hydra::Graphics", "Sampler '{}' does not exist", name);
            Error::MissingResource(format!("sampler '{}'", name))
        })
    }

    // ===== Named input layouts =====

    /// Create (or replace) a named vertex input layout
    pub fn create_input_layout(
        &mut self,
        name: &str,
        attributes: &[VertexAttributeDesc],
        vertex_shader: ShaderHandle,
    ) -> Result<InputLayoutHandle> {
        let handle = {
            let mut device = self.lock_device()?;
            device.create_input_layout(attributes, vertex_shader)?
        };
        self.input_layouts.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Look up a named input layout; unknown names are an error
    pub fn get_input_layout(&self, name: &str) -> Result<InputLayoutHandle> {
        self.input_layouts.get(name).copied().ok_or_else(|| {
            crate::engine_error!("hydra::Graphics", "Input layout '{}' does not exist", name);
            Error::MissingResource(format!("input layout '{}'", name))
        })
    }

    // ===== Draw helpers =====

    /// Draw arguments for the full-screen triangle pair
    pub fn fullscreen_draw_args() -> DrawArguments {
        DrawArguments::new(FULLSCREEN_INDEX_COUNT)
    }

    /// Draw arguments for the unit capture cube
    pub fn cube_draw_args() -> DrawArguments {
        DrawArguments::new(CUBE_INDEX_COUNT)
    }

    /// Draw a full-screen pass with `material` into the prepared `state`
    ///
    /// Runs one rendering pass: apply the material, draw the triangle pair,
    /// close the pass.
    pub fn composite(&self, material: &mut Material, state: &mut DrawState) -> Result<()> {
        material.apply_params(state)?;
        let mut device = self.lock_device()?;
        device.begin_rendering_pass()?;
        device.draw_indexed(state, &Self::fullscreen_draw_args(), 1)?;
        device.end_rendering_pass()
    }

    /// Render `material` into every face and mip of a cube map
    ///
    /// `setup` runs before each draw with the face index and mip level so
    /// the caller can set the face's view matrix and per-mip parameters.
    /// Each face/mip pair is one rendering pass targeting that sub-resource.
    pub fn render_cube_map<F>(
        &self,
        material: &mut Material,
        cube: TextureHandle,
        size: u32,
        mip_levels: u32,
        mut setup: F,
    ) -> Result<()>
    where
        F: FnMut(&mut Material, u32, u32) -> Result<()>,
    {
        for mip in 0..mip_levels {
            let mip_size = (size >> mip).max(1);
            for face in 0..6 {
                setup(material, face, mip)?;

                let mut state = DrawState::new();
                state.set_viewport(Viewport::new(mip_size as f32, mip_size as f32));
                state.set_targets(vec![TargetBinding::face(cube, face, mip)]);
                material.apply_params(&mut state)?;

                let mut device = self.lock_device()?;
                device.begin_rendering_pass()?;
                device.draw_indexed(&mut state, &Self::cube_draw_args(), 1)?;
                device.end_rendering_pass()?;
            }
        }
        Ok(())
    }
}

// ===== Cube capture cameras =====

/// Projection used when rendering into a cube face: 90 degree fov, square
/// aspect, 0.1..10.0 range
pub fn cube_capture_projection() -> Mat4 {
    Mat4::perspective_lh(FRAC_PI_2, 1.0, 0.1, 10.0)
}

/// View matrix for each cube face, indexed +X, -X, then the Y pair in
/// -Y, +Y order to match cube-face addressing, then +Z, -Z
pub fn cube_capture_views() -> [Mat4; 6] {
    let eye = Vec3::ZERO;
    [
        Mat4::look_at_lh(eye, Vec3::X, Vec3::Y),
        Mat4::look_at_lh(eye, Vec3::NEG_X, Vec3::Y),
        Mat4::look_at_lh(eye, Vec3::NEG_Y, Vec3::NEG_Z),
        Mat4::look_at_lh(eye, Vec3::Y, Vec3::Z),
        Mat4::look_at_lh(eye, Vec3::Z, Vec3::Y),
        Mat4::look_at_lh(eye, Vec3::NEG_Z, Vec3::Y),
    ]
}

#[cfg(test)]
#[path = "graphics_tests.rs"]
mod tests;
