/// RenderDevice trait - the GPU collaborator interface
///
/// Implemented by backend-specific devices. The engine core only ever
/// creates resources and submits `DrawState` values; frame pacing,
/// swapchains and the window live outside this crate.

use crate::device::draw_state::DrawState;
use crate::device::types::{
    BufferHandle, DrawArguments, InputLayoutHandle, SamplerDesc, SamplerHandle, ShaderHandle,
    ShaderStage, TextureDesc, TextureHandle, VertexAttributeDesc,
};
use crate::error::Result;

/// Main device trait
///
/// All GPU state mutation is synchronous: one frame is processed
/// start-to-finish on the calling thread.
pub trait RenderDevice: Send {
    /// Create a texture or render target
    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle>;

    /// Destroy a texture; the handle becomes stale
    fn destroy_texture(&mut self, handle: TextureHandle) -> Result<()>;

    /// Descriptor of a live texture, None when the handle is stale
    fn texture_desc(&self, handle: TextureHandle) -> Option<&TextureDesc>;

    /// Create a sampler
    fn create_sampler(&mut self, desc: SamplerDesc) -> Result<SamplerHandle>;

    /// Create a compiled shader from bytecode
    fn create_shader(&mut self, stage: ShaderStage, bytecode: &[u8]) -> Result<ShaderHandle>;

    /// Create a constant buffer of the given byte size
    fn create_constant_buffer(&mut self, size: u32) -> Result<BufferHandle>;

    /// Create a vertex input layout validated against a vertex shader
    fn create_input_layout(
        &mut self,
        attributes: &[VertexAttributeDesc],
        vertex_shader: ShaderHandle,
    ) -> Result<InputLayoutHandle>;

    /// Begin a rendering pass
    fn begin_rendering_pass(&mut self) -> Result<()>;

    /// End the current rendering pass
    fn end_rendering_pass(&mut self) -> Result<()>;

    /// Submit one indexed draw with the accumulated state
    ///
    /// Drains the state's pending constant writes (uploading each region
    /// once) and issues the draw with the currently bound targets, shaders,
    /// textures and samplers.
    fn draw_indexed(
        &mut self,
        state: &mut DrawState,
        args: &DrawArguments,
        instances: u32,
    ) -> Result<()>;
}
