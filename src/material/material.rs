/// Material - named parameters resolved against a technique's reflected layout
///
/// A material couples a `VariableStore` with an `Arc<Technique>` from the
/// shared cache. Typed setters establish each variable's type on first use;
/// `apply_params` resolves names to reflected constant-buffer regions and
/// texture/sampler slots and pushes them into a `DrawState`.
///
/// Constant buffers are owned per (pack, stage): materials rendered into
/// different binding packs (e.g. a shadow pass vs the main pass) never share
/// an upload destination.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;

use crate::device::{
    BufferHandle, DrawState, SamplerHandle, ShaderHandle, ShaderStage, TextureHandle,
};
use crate::error::Result;
use crate::material::variable::{VarType, VariableStore};
use crate::shader::{ShaderSource, Technique, TechniqueCache};

/// A shader technique plus the named parameter values bound to it
pub struct Material {
    name: String,
    source: ShaderSource,
    defines: BTreeMap<String, String>,
    cache: Arc<TechniqueCache>,
    technique: Arc<Technique>,
    store: VariableStore,
    pack_id: u32,
    /// Constant buffer per (pack, stage), created lazily at first apply
    pack_buffers: FxHashMap<(u32, ShaderStage), BufferHandle>,
}

impl Material {
    /// Create a material, resolving its technique through the shared cache
    ///
    /// Compilation happens at most once per (source path, defines) identity;
    /// a second material on the same source reuses the cached technique.
    pub fn new(name: &str, source: ShaderSource, cache: Arc<TechniqueCache>) -> Result<Self> {
        let defines = BTreeMap::new();
        let technique = cache.create_or_get(&source, &defines)?;
        crate::engine_debug!("hydra::Material",
            "Created material '{}' on technique '{}'", name, technique.identity());
        Ok(Self {
            name: name.to_string(),
            source,
            defines,
            cache,
            technique,
            store: VariableStore::new(),
            pack_id: 0,
            pack_buffers: FxHashMap::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Technique currently resolved for this material's define set
    pub fn technique(&self) -> &Arc<Technique> {
        &self.technique
    }

    /// Compiled shader handle for a stage, if the technique has one
    pub fn shader(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        self.technique.stage(stage).map(|p| p.shader)
    }

    /// Direct access to the variable store
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    // ===== Preprocessor defines =====

    /// Set a preprocessor define and re-resolve the technique
    ///
    /// The define set is part of the technique identity, so this may switch
    /// the material to a different compiled variant. All variables are
    /// marked dirty because the variant's constant buffers start empty.
    /// If the new variant fails to compile the material is untouched: it
    /// keeps its previous technique and define set, and the same call can
    /// be retried.
    pub fn set_define(&mut self, name: &str, value: &str) -> Result<()> {
        if self.defines.get(name).map(String::as_str) == Some(value) {
            return Ok(());
        }
        let mut defines = self.defines.clone();
        defines.insert(name.to_string(), value.to_string());
        let technique = self.cache.create_or_get(&self.source, &defines)?;
        self.defines = defines;
        self.technique = technique;
        self.pack_buffers.clear();
        self.store.mark_all_dirty();
        Ok(())
    }

    // ===== Pack selection =====

    /// Select the binding pack subsequent applies upload into
    pub fn set_pack_id(&mut self, pack_id: u32) {
        if self.pack_id != pack_id {
            self.pack_id = pack_id;
            // The new pack's buffers have seen none of the current values.
            self.store.mark_all_dirty();
        }
    }

    pub fn pack_id(&self) -> u32 {
        self.pack_id
    }

    // ===== Typed setters =====

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.store.set_raw(name, VarType::Int, bytemuck::bytes_of(&value))
    }

    pub fn set_uint(&mut self, name: &str, value: u32) -> Result<()> {
        self.store.set_raw(name, VarType::UInt, bytemuck::bytes_of(&value))
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.store.set_raw(name, VarType::Float, bytemuck::bytes_of(&value))
    }

    /// Booleans occupy 4 bytes, matching shader register layout
    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        let raw: u32 = if value { 1 } else { 0 };
        self.store.set_raw(name, VarType::Bool, bytemuck::bytes_of(&raw))
    }

    pub fn set_vector2(&mut self, name: &str, value: Vec2) -> Result<()> {
        self.store.set_raw(name, VarType::Vector2, bytemuck::bytes_of(&value))
    }

    pub fn set_vector3(&mut self, name: &str, value: Vec3) -> Result<()> {
        self.store.set_raw(name, VarType::Vector3, bytemuck::bytes_of(&value))
    }

    pub fn set_vector4(&mut self, name: &str, value: Vec4) -> Result<()> {
        self.store.set_raw(name, VarType::Vector4, bytemuck::bytes_of(&value))
    }

    pub fn set_matrix3(&mut self, name: &str, value: &Mat3) -> Result<()> {
        self.store.set_raw(name, VarType::Matrix3, bytemuck::bytes_of(value))
    }

    pub fn set_matrix4(&mut self, name: &str, value: &Mat4) -> Result<()> {
        self.store.set_raw(name, VarType::Matrix4, bytemuck::bytes_of(value))
    }

    /// Array length is fixed by the first write; a later write with a
    /// different element count is a `SizeMismatch`
    pub fn set_vector4_array(&mut self, name: &str, values: &[Vec4]) -> Result<()> {
        self.store.set_raw(name, VarType::Vector4Array, bytemuck::cast_slice(values))
    }

    /// Opaque struct bytes; size fixed at first write
    pub fn set_storage_struct(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.store.set_raw(name, VarType::StorageStruct, bytes)
    }

    /// Opaque struct array bytes; size fixed at first write
    pub fn set_storage_struct_array(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.store.set_raw(name, VarType::StorageStructArray, bytes)
    }

    pub fn set_texture(&mut self, name: &str, texture: TextureHandle) {
        self.store.set_texture(name, texture);
    }

    pub fn set_sampler(&mut self, name: &str, sampler: SamplerHandle) {
        self.store.set_sampler(name, sampler);
    }

    // ===== Typed getters =====

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get_pod(name, VarType::Int)
    }

    pub fn get_uint(&self, name: &str) -> Option<u32> {
        self.get_pod(name, VarType::UInt)
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.get_pod(name, VarType::Float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_pod::<u32>(name, VarType::Bool).map(|raw| raw != 0)
    }

    pub fn get_vector2(&self, name: &str) -> Option<Vec2> {
        self.get_pod(name, VarType::Vector2)
    }

    pub fn get_vector3(&self, name: &str) -> Option<Vec3> {
        self.get_pod(name, VarType::Vector3)
    }

    pub fn get_vector4(&self, name: &str) -> Option<Vec4> {
        self.get_pod(name, VarType::Vector4)
    }

    pub fn get_matrix3(&self, name: &str) -> Option<Mat3> {
        self.get_pod(name, VarType::Matrix3)
    }

    pub fn get_matrix4(&self, name: &str) -> Option<Mat4> {
        self.get_pod(name, VarType::Matrix4)
    }

    pub fn get_vector4_array(&self, name: &str) -> Option<Vec<Vec4>> {
        let (var_type, bytes) = self.store.get_raw(name)?;
        if var_type != VarType::Vector4Array {
            return None;
        }
        Some(bytemuck::cast_slice(bytes).to_vec())
    }

    pub fn get_texture(&self, name: &str) -> Option<TextureHandle> {
        self.store.texture(name)
    }

    pub fn get_sampler(&self, name: &str) -> Option<SamplerHandle> {
        self.store.sampler(name)
    }

    fn get_pod<T: bytemuck::Pod>(&self, name: &str, expected: VarType) -> Option<T> {
        let (var_type, bytes) = self.store.get_raw(name)?;
        if var_type != expected || bytes.len() != std::mem::size_of::<T>() {
            return None;
        }
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    // ===== Apply =====

    /// Push this material's bindings into `state`
    ///
    /// Per compiled stage: binds the shader, binds (creating on first use)
    /// the pack's constant buffer, queues a region write for every dirty
    /// variable the stage's reflection names, and re-binds every reflected
    /// texture and sampler present in the store. Dirty flags are cleared
    /// once at the end so a variable shared by several stages reaches all
    /// of them.
    pub fn apply_params(&mut self, state: &mut DrawState) -> Result<()> {
        let technique = Arc::clone(&self.technique);
        for program in technique.stages() {
            let stage = program.stage;
            state.set_shader(stage, program.shader);

            if program.layout.constant_buffer_size > 0 {
                let buffer = self.pack_buffer(stage, program.layout.constant_buffer_size)?;
                state.bind_constant_buffer(stage, buffer);

                for (name, binding) in program.layout.variables() {
                    if !self.store.is_dirty(name) {
                        continue;
                    }
                    if let Some((_, bytes)) = self.store.get_raw(name) {
                        let len = (binding.size as usize).min(bytes.len());
                        state.write_constants(stage, binding.offset, &bytes[..len]);
                        self.store.note_uploaded(name);
                    }
                }
            }

            for (name, slot) in program.layout.textures() {
                if let Some(texture) = self.store.texture(name) {
                    state.bind_texture(stage, slot, texture);
                }
            }
            for (name, slot) in program.layout.samplers() {
                if let Some(sampler) = self.store.sampler(name) {
                    state.bind_sampler(stage, slot, sampler);
                }
            }
        }

        self.store.finish_upload_cycle();
        Ok(())
    }

    /// Constant buffer for (current pack, stage), created on first use
    fn pack_buffer(&mut self, stage: ShaderStage, size: u32) -> Result<BufferHandle> {
        let key = (self.pack_id, stage);
        if let Some(buffer) = self.pack_buffers.get(&key) {
            return Ok(*buffer);
        }
        let buffer = {
            let mut device = self.cache.device().lock().map_err(|_| {
                crate::engine_err!("hydra::Material", "device lock poisoned")
            })?;
            device.create_constant_buffer(size)?
        };
        self.pack_buffers.insert(key, buffer);
        Ok(buffer)
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
