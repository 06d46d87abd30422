/// Mock RenderDevice for unit tests (no GPU required)
///
/// Records every pass, draw and constant-buffer upload so tests can assert
/// the exact binding sequence produced by materials and render stages.
/// Public on purpose: downstream users can drive the whole engine against
/// it without a graphics backend.

use slotmap::SlotMap;

use crate::device::draw_state::{DrawState, TargetBinding};
use crate::device::device::RenderDevice;
use crate::device::types::{
    BufferHandle, ClearFlags, DrawArguments, InputLayoutHandle, SamplerDesc, SamplerHandle,
    ShaderHandle, ShaderStage, TextureDesc, TextureHandle, VertexAttributeDesc, Viewport,
};
use crate::engine_bail;
use crate::error::Result;

/// One recorded constant-buffer region upload
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantUpload {
    pub stage: ShaderStage,
    /// Buffer bound for the stage at submission time
    pub buffer: Option<BufferHandle>,
    pub offset: u32,
    pub data: Vec<u8>,
}

/// Snapshot of one submitted draw call
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub targets: Vec<TargetBinding>,
    pub depth_target: Option<TargetBinding>,
    pub viewport: Option<Viewport>,
    pub clear_flags: ClearFlags,
    pub input_layout: Option<InputLayoutHandle>,
    pub shaders: Vec<(ShaderStage, ShaderHandle)>,
    pub constant_uploads: Vec<ConstantUpload>,
    pub textures: Vec<(ShaderStage, u32, TextureHandle)>,
    pub samplers: Vec<(ShaderStage, u32, SamplerHandle)>,
    pub index_count: u32,
    pub instances: u32,
}

/// Recorded device event stream
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    BeginPass,
    EndPass,
    DrawIndexed(DrawRecord),
}

/// GPU-free device that tracks resources and records submissions
pub struct MockDevice {
    textures: SlotMap<TextureHandle, TextureDesc>,
    samplers: SlotMap<SamplerHandle, SamplerDesc>,
    shaders: SlotMap<ShaderHandle, ShaderStage>,
    buffers: SlotMap<BufferHandle, u32>,
    input_layouts: SlotMap<InputLayoutHandle, usize>,
    events: Vec<DeviceEvent>,
    pass_depth: u32,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            textures: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            input_layouts: SlotMap::with_key(),
            events: Vec::new(),
            pass_depth: 0,
        }
    }

    /// Full recorded event stream
    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    /// Recorded draws only, in submission order
    pub fn draw_records(&self) -> Vec<&DrawRecord> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DeviceEvent::DrawIndexed(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// All constant uploads across every recorded draw
    pub fn constant_uploads(&self) -> Vec<&ConstantUpload> {
        self.draw_records()
            .into_iter()
            .flat_map(|r| r.constant_uploads.iter())
            .collect()
    }

    /// Number of live (not destroyed) textures
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Byte size of a live constant buffer
    pub fn buffer_size(&self, handle: BufferHandle) -> Option<u32> {
        self.buffers.get(handle).copied()
    }

    /// Forget recorded events (resource tables are kept)
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for MockDevice {
    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!("hydra::MockDevice",
                "create_texture '{}': zero-sized texture ({}x{})",
                desc.name, desc.width, desc.height);
        }
        Ok(self.textures.insert(desc))
    }

    fn destroy_texture(&mut self, handle: TextureHandle) -> Result<()> {
        if self.textures.remove(handle).is_none() {
            engine_bail!("hydra::MockDevice", "destroy_texture: stale handle");
        }
        Ok(())
    }

    fn texture_desc(&self, handle: TextureHandle) -> Option<&TextureDesc> {
        self.textures.get(handle)
    }

    fn create_sampler(&mut self, desc: SamplerDesc) -> Result<SamplerHandle> {
        Ok(self.samplers.insert(desc))
    }

    fn create_shader(&mut self, stage: ShaderStage, bytecode: &[u8]) -> Result<ShaderHandle> {
        if bytecode.is_empty() {
            engine_bail!("hydra::MockDevice", "create_shader: empty bytecode for {:?}", stage);
        }
        Ok(self.shaders.insert(stage))
    }

    fn create_constant_buffer(&mut self, size: u32) -> Result<BufferHandle> {
        if size == 0 {
            engine_bail!("hydra::MockDevice", "create_constant_buffer: zero size");
        }
        Ok(self.buffers.insert(size))
    }

    fn create_input_layout(
        &mut self,
        attributes: &[VertexAttributeDesc],
        vertex_shader: ShaderHandle,
    ) -> Result<InputLayoutHandle> {
        if !self.shaders.contains_key(vertex_shader) {
            engine_bail!("hydra::MockDevice", "create_input_layout: stale vertex shader handle");
        }
        Ok(self.input_layouts.insert(attributes.len()))
    }

    fn begin_rendering_pass(&mut self) -> Result<()> {
        self.pass_depth += 1;
        self.events.push(DeviceEvent::BeginPass);
        Ok(())
    }

    fn end_rendering_pass(&mut self) -> Result<()> {
        if self.pass_depth == 0 {
            engine_bail!("hydra::MockDevice", "end_rendering_pass: no pass is open");
        }
        self.pass_depth -= 1;
        self.events.push(DeviceEvent::EndPass);
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        state: &mut DrawState,
        args: &DrawArguments,
        instances: u32,
    ) -> Result<()> {
        for target in &state.targets {
            if !self.textures.contains_key(target.texture) {
                engine_bail!("hydra::MockDevice", "draw_indexed: stale render target handle");
            }
        }
        if let Some(depth) = &state.depth_target {
            if !self.textures.contains_key(depth.texture) {
                engine_bail!("hydra::MockDevice", "draw_indexed: stale depth target handle");
            }
        }

        let mut constant_uploads = Vec::new();
        let drained = state.take_constant_writes();
        for (stage, writes) in drained {
            let buffer = state.stage(stage).and_then(|b| b.constant_buffer);
            for write in writes {
                constant_uploads.push(ConstantUpload {
                    stage,
                    buffer,
                    offset: write.offset,
                    data: write.data,
                });
            }
        }

        let mut shaders = Vec::new();
        let mut textures = Vec::new();
        let mut samplers = Vec::new();
        for (stage, bindings) in state.stages() {
            if let Some(shader) = bindings.shader {
                shaders.push((stage, shader));
            }
            for (slot, texture) in &bindings.textures {
                textures.push((stage, *slot, *texture));
            }
            for (slot, sampler) in &bindings.samplers {
                samplers.push((stage, *slot, *sampler));
            }
        }

        self.events.push(DeviceEvent::DrawIndexed(DrawRecord {
            targets: state.targets.clone(),
            depth_target: state.depth_target,
            viewport: state.viewport,
            clear_flags: state.clear_flags,
            input_layout: state.input_layout,
            shaders,
            constant_uploads,
            textures,
            samplers,
            index_count: args.index_count,
            instances,
        }));
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
