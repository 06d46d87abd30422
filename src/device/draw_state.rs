/// Draw state builder - accumulated bindings for one draw call
///
/// A `DrawState` is a plain value that collects render targets, per-stage
/// shaders, constant-buffer region writes and texture/sampler slot bindings.
/// Nothing touches the GPU until the state is submitted through
/// `RenderDevice::draw_indexed`, which makes the exact binding sequence
/// inspectable in tests.
///
/// Persistent bindings (targets, shaders, textures, samplers) survive the
/// submission; pending constant writes are drained by the device, so each
/// region write is uploaded exactly once.

use std::collections::BTreeMap;

use crate::device::types::{
    BufferHandle, ClearFlags, Color, InputLayoutHandle, SamplerHandle, ShaderHandle, ShaderStage,
    TextureHandle, Viewport,
};

/// A pending write into a constant-buffer region
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantWrite {
    /// Byte offset of the region within the stage's constant buffer
    pub offset: u32,
    /// Raw bytes; length equals the reflected region size
    pub data: Vec<u8>,
}

/// A render-target attachment: a texture plus the face/mip it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetBinding {
    pub texture: TextureHandle,
    /// Array layer (cube face index for cube maps)
    pub layer: u32,
    pub mip_level: u32,
}

impl TargetBinding {
    /// Whole-texture binding (layer 0, mip 0)
    pub fn new(texture: TextureHandle) -> Self {
        Self { texture, layer: 0, mip_level: 0 }
    }

    /// Binding targeting a specific cube face and mip level
    pub fn face(texture: TextureHandle, layer: u32, mip_level: u32) -> Self {
        Self { texture, layer, mip_level }
    }
}

/// Per-stage accumulated bindings
#[derive(Debug, Clone, Default)]
pub struct StageBindings {
    /// Compiled shader bound for this stage
    pub shader: Option<ShaderHandle>,
    /// Constant buffer receiving the pending writes
    pub constant_buffer: Option<BufferHandle>,
    /// Region writes pending until the next submission
    pub constant_writes: Vec<ConstantWrite>,
    /// Texture slot bindings, kept sorted by slot
    pub textures: Vec<(u32, TextureHandle)>,
    /// Sampler slot bindings, kept sorted by slot
    pub samplers: Vec<(u32, SamplerHandle)>,
}

impl StageBindings {
    fn bind_slot<H: Copy>(slots: &mut Vec<(u32, H)>, slot: u32, handle: H) {
        match slots.binary_search_by_key(&slot, |(s, _)| *s) {
            Ok(i) => slots[i].1 = handle,
            Err(i) => slots.insert(i, (slot, handle)),
        }
    }

    /// Look up the texture bound at `slot`
    pub fn texture(&self, slot: u32) -> Option<TextureHandle> {
        self.textures
            .binary_search_by_key(&slot, |(s, _)| *s)
            .ok()
            .map(|i| self.textures[i].1)
    }
}

/// Accumulated state for a sequence of draw calls within one pass
#[derive(Debug, Clone)]
pub struct DrawState {
    /// Viewport for subsequent draws
    pub viewport: Option<Viewport>,
    /// Attachments cleared before the next draw (disabled after the first
    /// draw of a pass by the caller)
    pub clear_flags: ClearFlags,
    /// Clear color applied when `ClearFlags::COLOR` is set
    pub clear_color: Color,
    /// Color render targets, bound in order
    pub targets: Vec<TargetBinding>,
    /// Depth/stencil target
    pub depth_target: Option<TargetBinding>,
    /// Vertex input layout
    pub input_layout: Option<InputLayoutHandle>,
    stages: BTreeMap<ShaderStage, StageBindings>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawState {
    pub fn new() -> Self {
        Self {
            viewport: None,
            clear_flags: ClearFlags::empty(),
            clear_color: Color::TRANSPARENT,
            targets: Vec::new(),
            depth_target: None,
            input_layout: None,
            stages: BTreeMap::new(),
        }
    }

    /// Request clearing of the given attachments before the next draw
    pub fn set_clear(&mut self, flags: ClearFlags, color: Color) {
        self.clear_flags = flags;
        self.clear_color = color;
    }

    /// Stop clearing (after the first draw of a pass)
    pub fn disable_clear(&mut self) {
        self.clear_flags = ClearFlags::empty();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    /// Replace the color target list
    pub fn set_targets(&mut self, targets: Vec<TargetBinding>) {
        self.targets = targets;
    }

    pub fn set_depth_target(&mut self, target: TargetBinding) {
        self.depth_target = Some(target);
    }

    pub fn set_input_layout(&mut self, layout: InputLayoutHandle) {
        self.input_layout = Some(layout);
    }

    /// Bind a compiled shader for a stage
    pub fn set_shader(&mut self, stage: ShaderStage, shader: ShaderHandle) {
        self.stages.entry(stage).or_default().shader = Some(shader);
    }

    /// Bind the constant buffer that pending writes target
    pub fn bind_constant_buffer(&mut self, stage: ShaderStage, buffer: BufferHandle) {
        self.stages.entry(stage).or_default().constant_buffer = Some(buffer);
    }

    /// Queue a constant-buffer region write, consumed at the next submission
    pub fn write_constants(&mut self, stage: ShaderStage, offset: u32, data: &[u8]) {
        self.stages
            .entry(stage)
            .or_default()
            .constant_writes
            .push(ConstantWrite { offset, data: data.to_vec() });
    }

    /// Bind a texture to a slot (replaces any previous binding at that slot)
    pub fn bind_texture(&mut self, stage: ShaderStage, slot: u32, texture: TextureHandle) {
        let bindings = self.stages.entry(stage).or_default();
        StageBindings::bind_slot(&mut bindings.textures, slot, texture);
    }

    /// Bind a sampler to a slot (replaces any previous binding at that slot)
    pub fn bind_sampler(&mut self, stage: ShaderStage, slot: u32, sampler: SamplerHandle) {
        let bindings = self.stages.entry(stage).or_default();
        StageBindings::bind_slot(&mut bindings.samplers, slot, sampler);
    }

    /// Bindings accumulated for one stage
    pub fn stage(&self, stage: ShaderStage) -> Option<&StageBindings> {
        self.stages.get(&stage)
    }

    /// Iterate over stages with bindings, in pipeline order
    pub fn stages(&self) -> impl Iterator<Item = (ShaderStage, &StageBindings)> {
        self.stages.iter().map(|(s, b)| (*s, b))
    }

    /// Drain the pending constant writes of every stage
    ///
    /// Called by the device at submission; returns `(stage, writes)` pairs
    /// for stages that had pending writes.
    pub fn take_constant_writes(&mut self) -> Vec<(ShaderStage, Vec<ConstantWrite>)> {
        let mut drained = Vec::new();
        for (stage, bindings) in self.stages.iter_mut() {
            if !bindings.constant_writes.is_empty() {
                drained.push((*stage, std::mem::take(&mut bindings.constant_writes)));
            }
        }
        drained
    }
}

#[cfg(test)]
#[path = "draw_state_tests.rs"]
mod tests;
