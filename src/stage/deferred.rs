/// Deferred PBR stage - G-buffer fill plus IBL composite
///
/// Two passes per frame:
///
/// 1. **Geometry**: every submitted instance is drawn into the four
///    G-buffer color targets plus depth. The targets are cleared before
///    the first draw of the pass only.
/// 2. **Composite**: a full-screen pass reads the G-buffer and the
///    precomputed IBL textures and writes the lit result to the output
///    target.
///
/// The image-based-lighting textures (BRDF lookup table, diffuse IBL,
/// prefiltered environment, irradiance convolution) are rendered once at
/// construction from the supplied environment cube map; they are
/// view-independent and survive resizes. The G-buffer targets are
/// view-sized and recreated from scratch on every resize, together with
/// their texture-layout group.

use std::sync::Arc;

use crate::device::{
    AttributeFormat, ClearFlags, Color, DrawState, InputLayoutHandle, ShaderStage, TargetBinding,
    TextureFormat, TextureHandle, VertexAttributeDesc, Viewport,
};
use crate::error::{Error, Result};
use crate::graphics::{cube_capture_projection, cube_capture_views, Graphics, DEFAULT_SAMPLER};
use crate::material::Material;
use crate::shader::{ShaderSource, TechniqueCache};
use crate::stage::texture_layout::TextureLayout;
use crate::stage::{FrameView, RenderStage};

/// Stage name; shader sources tagged `rs:Deffered` belong here
pub const DEFERRED_STAGE_NAME: &str = "Deffered";

/// Texture-layout group holding the G-buffer channels
pub const GBUFFER_GROUP: &str = "DPBR";

// ===== Named render targets =====

pub const ALBEDO_METALLIC_TARGET: &str = "DPBR_AlbedoMetallic";
pub const NORMAL_ROUGHNESS_TARGET: &str = "DPBR_NormalRoughness";
pub const AO_EMISSION_TARGET: &str = "DPBR_AO_Emission";
pub const WORLD_POS_TARGET: &str = "DPBR_WorldPos";
pub const DEPTH_TARGET: &str = "DPBR_Depth";
pub const OUTPUT_TARGET: &str = "DPBR_Output";

/// Named vertex input layout of the geometry pass
pub const MESH_INPUT_LAYOUT: &str = "DPBR_Mesh";

pub const BRDF_LUT_TARGET: &str = "DPBR_BRDF_LUT";
pub const DIFFUSE_IBL_TARGET: &str = "DPBR_DiffuseIBL";
pub const ENV_MAP_TARGET: &str = "DPBR_EnvMap";
pub const IRRADIANCE_TARGET: &str = "DPBR_IrradianceMap";

/// Sizes of the precomputed IBL textures
#[derive(Debug, Clone, Copy)]
pub struct DeferredConfig {
    pub brdf_lut_size: u32,
    pub diffuse_ibl_size: u32,
    pub env_map_size: u32,
    pub env_map_mips: u32,
    pub irradiance_size: u32,
}

impl Default for DeferredConfig {
    fn default() -> Self {
        Self {
            brdf_lut_size: 512,
            diffuse_ibl_size: 64,
            env_map_size: 256,
            env_map_mips: 5,
            irradiance_size: 128,
        }
    }
}

/// Shader sources for the stage's own materials
pub struct DeferredShaderSet {
    /// Geometry pass, fills the G-buffer
    pub gbuffer: ShaderSource,
    /// Full-screen lighting composite
    pub composite: ShaderSource,
    /// BRDF lookup-table bake
    pub brdf_lut: ShaderSource,
    /// Diffuse IBL cube convolution
    pub diffuse_ibl: ShaderSource,
    /// Specular environment prefilter (one roughness per mip)
    pub env_prefilter: ShaderSource,
    /// Irradiance convolution cube
    pub irradiance: ShaderSource,
}

/// Deferred G-buffer + IBL composite stage
pub struct DeferredStage {
    config: DeferredConfig,
    gbuffer_material: Material,
    composite_material: Material,
    input_layout: InputLayoutHandle,
    layout: TextureLayout,
}

impl DeferredStage {
    /// Build the stage's materials, resolve the geometry-pass input layout
    /// and bake the IBL textures
    ///
    /// `environment` is the source environment cube map the diffuse IBL,
    /// prefiltered environment and irradiance textures are convolved from.
    /// It must already be a cube map; converting an equirectangular source
    /// happens in the asset importer before it reaches the stage.
    pub fn new(
        graphics: &mut Graphics,
        cache: &Arc<TechniqueCache>,
        shaders: DeferredShaderSet,
        environment: TextureHandle,
        config: DeferredConfig,
    ) -> Result<Self> {
        let gbuffer_material =
            Material::new("DPBR_GBuffer", shaders.gbuffer.clone(), Arc::clone(cache))?;
        let composite_material =
            Material::new("DPBR_Composite", shaders.composite.clone(), Arc::clone(cache))?;

        let vertex_shader = gbuffer_material.shader(ShaderStage::Vertex).ok_or_else(|| {
            crate::engine_error!("hydra::DeferredStage",
                "G-buffer technique has no vertex stage, cannot build the input layout");
            Error::InitializationFailed("G-buffer vertex shader missing".to_string())
        })?;
        let input_layout =
            graphics.create_input_layout(MESH_INPUT_LAYOUT, &mesh_attributes(), vertex_shader)?;

        let mut stage = Self {
            config,
            gbuffer_material,
            composite_material,
            input_layout,
            layout: TextureLayout::new(),
        };
        stage.bake_ibl(graphics, cache, &shaders, environment)?;
        crate::engine_info!("hydra::DeferredStage", "Deferred stage initialized");
        Ok(stage)
    }

    /// Read access to the stage's texture-layout groups
    pub fn layout(&self) -> &TextureLayout {
        &self.layout
    }

    // ===== IBL bake =====

    fn bake_ibl(
        &mut self,
        graphics: &mut Graphics,
        cache: &Arc<TechniqueCache>,
        shaders: &DeferredShaderSet,
        environment: TextureHandle,
    ) -> Result<()> {
        let clamp = graphics.create_sampler("DPBR_ClampSampler",
            crate::device::SamplerDesc::clamp())?;

        // BRDF lookup table: a single full-screen bake, no inputs.
        let brdf_lut = graphics.create_render_target(
            BRDF_LUT_TARGET,
            TextureFormat::RG16_FLOAT,
            self.config.brdf_lut_size,
            self.config.brdf_lut_size,
            Color::TRANSPARENT,
            1,
        )?;
        let mut brdf_material =
            Material::new("DPBR_BrdfLut", shaders.brdf_lut.clone(), Arc::clone(cache))?;
        let mut state = DrawState::new();
        state.set_viewport(Viewport::new(
            self.config.brdf_lut_size as f32,
            self.config.brdf_lut_size as f32,
        ));
        state.set_targets(vec![TargetBinding::new(brdf_lut)]);
        state.set_clear(ClearFlags::COLOR, Color::TRANSPARENT);
        graphics.composite(&mut brdf_material, &mut state)?;

        let projection = cube_capture_projection();
        let views = cube_capture_views();

        // Diffuse IBL convolution of the environment map.
        let diffuse_ibl = graphics.create_render_target_cube(
            DIFFUSE_IBL_TARGET,
            TextureFormat::RGBA16_FLOAT,
            self.config.diffuse_ibl_size,
            1,
        )?;
        let mut diffuse_material =
            Material::new("DPBR_DiffuseIBL", shaders.diffuse_ibl.clone(), Arc::clone(cache))?;
        diffuse_material.set_matrix4("g_ProjectionMatrix", &projection)?;
        diffuse_material.set_texture("g_EnvironmentMap", environment);
        diffuse_material.set_sampler(DEFAULT_SAMPLER, clamp);
        graphics.render_cube_map(
            &mut diffuse_material,
            diffuse_ibl,
            self.config.diffuse_ibl_size,
            1,
            |material, face, _mip| material.set_matrix4("g_ViewMatrix", &views[face as usize]),
        )?;

        // Specular prefilter: each mip convolves one roughness level.
        let env_map = graphics.create_render_target_cube(
            ENV_MAP_TARGET,
            TextureFormat::RGBA16_FLOAT,
            self.config.env_map_size,
            self.config.env_map_mips,
        )?;
        let mut prefilter_material =
            Material::new("DPBR_EnvPrefilter", shaders.env_prefilter.clone(), Arc::clone(cache))?;
        prefilter_material.set_matrix4("g_ProjectionMatrix", &projection)?;
        prefilter_material.set_texture("g_EnvironmentMap", environment);
        prefilter_material.set_sampler(DEFAULT_SAMPLER, clamp);
        let mip_span = self.config.env_map_mips.saturating_sub(1).max(1) as f32;
        graphics.render_cube_map(
            &mut prefilter_material,
            env_map,
            self.config.env_map_size,
            self.config.env_map_mips,
            |material, face, mip| {
                material.set_float("g_Roughness", mip as f32 / mip_span)?;
                material.set_matrix4("g_ViewMatrix", &views[face as usize])
            },
        )?;

        // Irradiance convolution.
        let irradiance = graphics.create_render_target_cube(
            IRRADIANCE_TARGET,
            TextureFormat::RGBA16_FLOAT,
            self.config.irradiance_size,
            1,
        )?;
        let mut irradiance_material =
            Material::new("DPBR_Irradiance", shaders.irradiance.clone(), Arc::clone(cache))?;
        irradiance_material.set_matrix4("g_ProjectionMatrix", &projection)?;
        irradiance_material.set_texture("g_EnvironmentMap", environment);
        irradiance_material.set_sampler(DEFAULT_SAMPLER, clamp);
        graphics.render_cube_map(
            &mut irradiance_material,
            irradiance,
            self.config.irradiance_size,
            1,
            |material, face, _mip| material.set_matrix4("g_ViewMatrix", &views[face as usize]),
        )?;

        Ok(())
    }

    // ===== Frame passes =====

    fn render_geometry(&mut self, graphics: &mut Graphics, view: &FrameView<'_>) -> Result<()> {
        let targets = vec![
            TargetBinding::new(graphics.get_render_target(ALBEDO_METALLIC_TARGET)?),
            TargetBinding::new(graphics.get_render_target(NORMAL_ROUGHNESS_TARGET)?),
            TargetBinding::new(graphics.get_render_target(AO_EMISSION_TARGET)?),
            TargetBinding::new(graphics.get_render_target(WORLD_POS_TARGET)?),
        ];
        let depth = TargetBinding::new(graphics.get_render_target(DEPTH_TARGET)?);
        let default_sampler = graphics.get_sampler(DEFAULT_SAMPLER)?;

        let mut state = DrawState::new();
        state.set_viewport(Viewport::new(
            view.camera.width as f32,
            view.camera.height as f32,
        ));
        state.set_targets(targets);
        state.set_depth_target(depth);
        state.set_input_layout(self.input_layout);
        state.set_clear(
            ClearFlags::COLOR | ClearFlags::DEPTH | ClearFlags::STENCIL,
            Color::TRANSPARENT,
        );

        let material = &mut self.gbuffer_material;
        material.set_matrix4("g_ProjectionMatrix", &view.camera.projection)?;
        material.set_matrix4("g_ViewMatrix", &view.camera.view)?;
        material.set_sampler(DEFAULT_SAMPLER, default_sampler);

        let device = Arc::clone(graphics.device());
        let lock_err = || crate::engine_err!("hydra::DeferredStage", "device lock poisoned");

        device.lock().map_err(|_| lock_err())?.begin_rendering_pass()?;
        for instance in view.renderers {
            material.set_matrix4("g_ModelMatrix", &instance.model_matrix)?;
            Self::bind_surfaces(material, &instance.surfaces)?;
            // apply_params may create pack buffers, so the device stays
            // unlocked until submission.
            material.apply_params(&mut state)?;
            device
                .lock()
                .map_err(|_| lock_err())?
                .draw_indexed(&mut state, &instance.draw_args, 1)?;
            // Only the first draw of the pass clears.
            state.disable_clear();
        }
        device.lock().map_err(|_| lock_err())?.end_rendering_pass()?;
        Ok(())
    }

    fn bind_surfaces(
        material: &mut Material,
        surfaces: &crate::render_manager::SurfaceTextures,
    ) -> Result<()> {
        let channels = [
            ("g_AlbedoMap", "g_HasAlbedoMap", surfaces.albedo),
            ("g_NormalMap", "g_HasNormalMap", surfaces.normal),
            ("g_RoughnessMap", "g_HasRoughnessMap", surfaces.roughness),
            ("g_MetallicMap", "g_HasMetallicMap", surfaces.metallic),
            ("g_AOMap", "g_HasAOMap", surfaces.ao),
            ("g_EmissionMap", "g_HasEmissionMap", surfaces.emission),
        ];
        for (map_name, flag_name, texture) in channels {
            material.set_bool(flag_name, texture.is_some())?;
            if let Some(texture) = texture {
                material.set_texture(map_name, texture);
            }
        }
        Ok(())
    }

    fn render_composite(&mut self, graphics: &mut Graphics, view: &FrameView<'_>) -> Result<()> {
        let output = graphics.get_render_target(OUTPUT_TARGET)?;

        let material = &mut self.composite_material;
        material.set_texture("g_AlbedoMetallic",
            self.layout.texture(GBUFFER_GROUP, ALBEDO_METALLIC_TARGET)?);
        material.set_texture("g_NormalRoughness",
            self.layout.texture(GBUFFER_GROUP, NORMAL_ROUGHNESS_TARGET)?);
        material.set_texture("g_AOEmission",
            self.layout.texture(GBUFFER_GROUP, AO_EMISSION_TARGET)?);
        material.set_texture("g_WorldPos",
            self.layout.texture(GBUFFER_GROUP, WORLD_POS_TARGET)?);
        material.set_texture("g_BrdfLut", graphics.get_render_target(BRDF_LUT_TARGET)?);
        material.set_texture("g_DiffuseIBL", graphics.get_render_target(DIFFUSE_IBL_TARGET)?);
        material.set_texture("g_EnvMap", graphics.get_render_target(ENV_MAP_TARGET)?);
        material.set_texture("g_IrradianceMap", graphics.get_render_target(IRRADIANCE_TARGET)?);
        material.set_sampler(DEFAULT_SAMPLER, graphics.get_sampler(DEFAULT_SAMPLER)?);
        material.set_vector3("g_CameraPosition", view.camera.position)?;

        let mut state = DrawState::new();
        state.set_viewport(Viewport::new(
            view.camera.width as f32,
            view.camera.height as f32,
        ));
        state.set_targets(vec![TargetBinding::new(output)]);
        state.set_clear(ClearFlags::COLOR, Color::TRANSPARENT);
        graphics.composite(material, &mut state)
    }
}

impl RenderStage for DeferredStage {
    fn name(&self) -> &str {
        DEFERRED_STAGE_NAME
    }

    fn output_name(&self) -> &str {
        OUTPUT_TARGET
    }

    fn depth_output_name(&self) -> Option<&str> {
        Some(DEPTH_TARGET)
    }

    /// Recreate the G-buffer and output targets for the new view size
    ///
    /// Targets are always destroyed and recreated, and the G-buffer
    /// texture-layout group is rebuilt so no consumer can see a stale
    /// handle.
    fn allocate_view_dependent_resources(
        &mut self,
        graphics: &mut Graphics,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<()> {
        let albedo = graphics.create_render_target(
            ALBEDO_METALLIC_TARGET, TextureFormat::RGBA8_UNORM, width, height,
            Color::TRANSPARENT, sample_count,
        )?;
        let normal = graphics.create_render_target(
            NORMAL_ROUGHNESS_TARGET, TextureFormat::RGBA16_FLOAT, width, height,
            Color::TRANSPARENT, sample_count,
        )?;
        let ao_emission = graphics.create_render_target(
            AO_EMISSION_TARGET, TextureFormat::RGBA16_FLOAT, width, height,
            Color::TRANSPARENT, sample_count,
        )?;
        let world_pos = graphics.create_render_target(
            WORLD_POS_TARGET, TextureFormat::RGBA16_FLOAT, width, height,
            Color::TRANSPARENT, sample_count,
        )?;
        let depth = graphics.create_render_target(
            DEPTH_TARGET, TextureFormat::D24S8, width, height, Color::splat(1.0), sample_count,
        )?;
        // The composite output is resolved, never multisampled.
        graphics.create_render_target(
            OUTPUT_TARGET, TextureFormat::RGBA8_UNORM, width, height, Color::TRANSPARENT, 1,
        )?;

        self.layout.delete_group(GBUFFER_GROUP);
        self.layout.begin_group(GBUFFER_GROUP)?;
        self.layout.add(ALBEDO_METALLIC_TARGET, albedo)?;
        self.layout.add(NORMAL_ROUGHNESS_TARGET, normal)?;
        self.layout.add(AO_EMISSION_TARGET, ao_emission)?;
        self.layout.add(WORLD_POS_TARGET, world_pos)?;
        self.layout.add(DEPTH_TARGET, depth)?;
        self.layout.end_group()?;

        crate::engine_debug!("hydra::DeferredStage",
            "Allocated G-buffer at {}x{} ({} samples)", width, height, sample_count);
        Ok(())
    }

    fn render(&mut self, graphics: &mut Graphics, view: &FrameView<'_>) -> Result<()> {
        self.render_geometry(graphics, view)?;
        self.render_composite(graphics, view)
    }
}

/// Vertex attributes the geometry pass expects: position, normal, tangent
/// and one texture coordinate set, interleaved in buffer 0
fn mesh_attributes() -> [VertexAttributeDesc; 4] {
    [
        VertexAttributeDesc::new("POSITION", 0, AttributeFormat::RGB32_FLOAT, 0, 0),
        VertexAttributeDesc::new("NORMAL", 0, AttributeFormat::RGB32_FLOAT, 0, 12),
        VertexAttributeDesc::new("TANGENT", 0, AttributeFormat::RGB32_FLOAT, 0, 24),
        VertexAttributeDesc::new("TEXCOORD", 0, AttributeFormat::RG32_FLOAT, 0, 36),
    ]
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;
