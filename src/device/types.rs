/// Common device-level types: handles, formats, descriptors

use bitflags::bitflags;
use slotmap::new_key_type;

new_key_type! {
    /// Opaque handle into the device's texture table
    pub struct TextureHandle;

    /// Opaque handle into the device's sampler table
    pub struct SamplerHandle;

    /// Opaque handle into the device's compiled-shader table
    pub struct ShaderHandle;

    /// Opaque handle into the device's buffer table
    pub struct BufferHandle;

    /// Opaque handle into the device's input-layout table
    pub struct InputLayoutHandle;
}

/// Shader pipeline stage
///
/// The full D3D11-style stage set. Most techniques only populate
/// Vertex + Pixel; the others are valid but optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Hull (tessellation control) shader
    Hull,
    /// Domain (tessellation evaluation) shader
    Domain,
    /// Geometry shader
    Geometry,
    /// Pixel/fragment shader
    Pixel,
    /// Compute shader
    Compute,
}

impl ShaderStage {
    /// All stages, in pipeline order
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::Vertex,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Geometry,
        ShaderStage::Pixel,
        ShaderStage::Compute,
    ];

    /// Shader-model 5.0 target profile for this stage
    pub fn profile(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Hull => "hs_5_0",
            ShaderStage::Domain => "ds_5_0",
            ShaderStage::Geometry => "gs_5_0",
            ShaderStage::Pixel => "ps_5_0",
            ShaderStage::Compute => "cs_5_0",
        }
    }
}

/// Texture/render-target pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    /// 8-bit RGBA, unsigned normalized
    RGBA8_UNORM,
    /// 16-bit float RGBA
    RGBA16_FLOAT,
    /// 32-bit float RGBA
    RGBA32_FLOAT,
    /// 16-bit float RG (BRDF lookup table)
    RG16_FLOAT,
    /// 24-bit depth + 8-bit stencil
    D24S8,
}

impl TextureFormat {
    /// True for depth/stencil formats
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::D24S8)
    }
}

/// RGBA clear color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same value in every channel
    pub const fn splat(v: f32) -> Self {
        Self { r: v, g: v, b: v, a: v }
    }

    /// Transparent black
    pub const TRANSPARENT: Self = Self::splat(0.0);
}

/// Descriptor for creating a texture / render target
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Debug name (also the registry name for named render targets)
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// MSAA sample count (1 = no multisampling)
    pub sample_count: u32,
    /// Mip chain length
    pub mip_levels: u32,
    /// True for cube maps (6 faces)
    pub is_cube: bool,
    /// Clear color used when the target is cleared
    pub clear_color: Color,
    /// True when the texture can be bound as a render target
    pub is_render_target: bool,
}

impl TextureDesc {
    /// 2D render target descriptor
    pub fn render_target(
        name: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
        clear_color: Color,
        sample_count: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            format,
            sample_count,
            mip_levels: 1,
            is_cube: false,
            clear_color,
            is_render_target: true,
        }
    }

    /// Cube-map render target descriptor
    pub fn render_target_cube(
        name: &str,
        format: TextureFormat,
        size: u32,
        clear_color: Color,
        mip_levels: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            width: size,
            height: size,
            format,
            sample_count: 1,
            mip_levels,
            is_cube: true,
            clear_color,
            is_render_target: true,
        }
    }
}

/// Texture coordinate wrap mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Repeat the texture
    Wrap,
    /// Clamp to edge
    Clamp,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc {
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub wrap_w: WrapMode,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            wrap_u: WrapMode::Wrap,
            wrap_v: WrapMode::Wrap,
            wrap_w: WrapMode::Wrap,
        }
    }
}

impl SamplerDesc {
    /// Clamp-to-edge on all axes (lookup tables, cube captures)
    pub fn clamp() -> Self {
        Self {
            wrap_u: WrapMode::Clamp,
            wrap_v: WrapMode::Clamp,
            wrap_w: WrapMode::Clamp,
        }
    }
}

/// Arguments for an indexed draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawArguments {
    pub index_count: u32,
    pub start_index: u32,
    pub base_vertex: i32,
    pub instance_count: u32,
}

impl DrawArguments {
    pub fn new(index_count: u32) -> Self {
        Self {
            index_count,
            start_index: 0,
            base_vertex: 0,
            instance_count: 1,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

bitflags! {
    /// Which attachments to clear before the next draw
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR   = 0b001;
        const DEPTH   = 0b010;
        const STENCIL = 0b100;
    }
}

/// Buffer element format for vertex attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum AttributeFormat {
    RG32_FLOAT,
    RGB32_FLOAT,
    RGBA32_FLOAT,
}

/// One attribute of a vertex input layout
#[derive(Debug, Clone)]
pub struct VertexAttributeDesc {
    /// Semantic name ("POSITION", "TEXCOORD", ...)
    pub name: String,
    /// Semantic index (WORLD 0..3 for a packed matrix)
    pub semantic_index: u32,
    pub format: AttributeFormat,
    /// Vertex buffer slot
    pub buffer_index: u32,
    /// Byte offset within the vertex
    pub offset: u32,
    /// True when the attribute advances per instance
    pub is_instanced: bool,
}

impl VertexAttributeDesc {
    /// Per-vertex attribute; instanced attributes set `is_instanced` directly
    pub fn new(
        name: &str,
        semantic_index: u32,
        format: AttributeFormat,
        buffer_index: u32,
        offset: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            semantic_index,
            format,
            buffer_index,
            offset,
            is_instanced: false,
        }
    }
}
