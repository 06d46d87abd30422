/// VariableStore - type-erased named parameter storage
///
/// Every variable is a named byte region tagged with a `VarType`. The type
/// and size are fixed at first write; later writes must match both or the
/// write is rejected and the stored value is untouched. A write that does
/// not change the bytes never marks the variable dirty.

use rustc_hash::FxHashMap;

use crate::device::{SamplerHandle, TextureHandle};
use crate::error::{Error, Result};

/// Value type of a material variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Int,
    UInt,
    Float,
    /// Stored as a 4-byte value, matching HLSL `bool` register layout
    Bool,
    Vector2,
    Vector3,
    Vector4,
    Matrix3,
    Matrix4,
    /// Contiguous `float4` array; length fixed at first write
    Vector4Array,
    /// Opaque user struct; size fixed at first write
    StorageStruct,
    /// Opaque user struct array; size fixed at first write
    StorageStructArray,
}

impl VarType {
    /// Byte size for fixed-size types; None for arrays and structs, whose
    /// size is established by the first write
    pub fn fixed_size(self) -> Option<u32> {
        match self {
            VarType::Int | VarType::UInt | VarType::Float | VarType::Bool => Some(4),
            VarType::Vector2 => Some(8),
            VarType::Vector3 => Some(12),
            VarType::Vector4 => Some(16),
            VarType::Matrix3 => Some(36),
            VarType::Matrix4 => Some(64),
            VarType::Vector4Array | VarType::StorageStruct | VarType::StorageStructArray => None,
        }
    }
}

/// One stored variable: its established type, bytes and dirty flag
#[derive(Debug, Clone)]
struct Var {
    var_type: VarType,
    data: Vec<u8>,
    dirty: bool,
}

/// Named variable, texture and sampler storage for one material
#[derive(Debug, Default)]
pub struct VariableStore {
    vars: FxHashMap<String, Var>,
    textures: FxHashMap<String, TextureHandle>,
    samplers: FxHashMap<String, SamplerHandle>,
    /// Variables uploaded during the current apply cycle; their dirty flags
    /// are cleared together when the cycle finishes, so a variable shared by
    /// several stages is uploaded to all of them first
    uploaded: Vec<String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw bytes for a variable
    ///
    /// The first write establishes the variable's type and size. A later
    /// write with a different type fails with `TypeMismatch`, a different
    /// byte length with `SizeMismatch`; either way the stored value is left
    /// exactly as it was. The dirty flag is raised only when the stored
    /// bytes actually change.
    pub fn set_raw(&mut self, name: &str, var_type: VarType, bytes: &[u8]) -> Result<()> {
        if let Some(expected) = var_type.fixed_size() {
            if bytes.len() as u32 != expected {
                return Err(Error::SizeMismatch(format!(
                    "'{}': {:?} expects {} bytes, got {}",
                    name, var_type, expected, bytes.len()
                )));
            }
        }

        match self.vars.get_mut(name) {
            Some(var) => {
                if var.var_type != var_type {
                    return Err(Error::TypeMismatch(format!(
                        "'{}' is {:?}, cannot re-set as {:?}",
                        name, var.var_type, var_type
                    )));
                }
                if var.data.len() != bytes.len() {
                    return Err(Error::SizeMismatch(format!(
                        "'{}' holds {} bytes, cannot re-set with {}",
                        name, var.data.len(), bytes.len()
                    )));
                }
                if var.data != bytes {
                    var.data.copy_from_slice(bytes);
                    var.dirty = true;
                }
            }
            None => {
                self.vars.insert(name.to_string(), Var {
                    var_type,
                    data: bytes.to_vec(),
                    dirty: true,
                });
            }
        }
        Ok(())
    }

    /// Read a variable's established type and current bytes
    pub fn get_raw(&self, name: &str) -> Option<(VarType, &[u8])> {
        self.vars.get(name).map(|v| (v.var_type, v.data.as_slice()))
    }

    /// Whether a variable holds bytes not yet uploaded
    pub fn is_dirty(&self, name: &str) -> bool {
        self.vars.get(name).map(|v| v.dirty).unwrap_or(false)
    }

    /// Variable count
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Queue a variable for clean-marking at the end of the apply cycle
    pub fn note_uploaded(&mut self, name: &str) {
        self.uploaded.push(name.to_string());
    }

    /// Clear the dirty flag of every variable uploaded this cycle
    pub fn finish_upload_cycle(&mut self) {
        for name in self.uploaded.drain(..) {
            if let Some(var) = self.vars.get_mut(&name) {
                var.dirty = false;
            }
        }
    }

    /// Raise every variable's dirty flag
    ///
    /// Used when the upload destination changes (technique re-resolution,
    /// pack switch) and freshly created constant buffers hold nothing yet.
    pub fn mark_all_dirty(&mut self) {
        for var in self.vars.values_mut() {
            var.dirty = true;
        }
    }

    /// Bind a texture by name (always re-bound at apply, never dirty-tracked)
    pub fn set_texture(&mut self, name: &str, texture: TextureHandle) {
        self.textures.insert(name.to_string(), texture);
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).copied()
    }

    /// Bind a sampler by name (always re-bound at apply, never dirty-tracked)
    pub fn set_sampler(&mut self, name: &str, sampler: SamplerHandle) {
        self.samplers.insert(name.to_string(), sampler);
    }

    pub fn sampler(&self, name: &str) -> Option<SamplerHandle> {
        self.samplers.get(name).copied()
    }
}

#[cfg(test)]
#[path = "variable_tests.rs"]
mod tests;
