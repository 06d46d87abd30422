/// TextureLayout - named groups of ordered texture channels
///
/// A group collects the textures one pass exposes to the next (the G-buffer
/// group, for example). Groups are built with begin/add/end so the channel
/// order is explicit, and rebuilt from scratch whenever their textures are
/// recreated. Lookups of unknown groups or channels fail loudly.

use rustc_hash::FxHashMap;

use crate::device::TextureHandle;
use crate::error::{Error, Result};

/// Named, ordered texture channel groups
#[derive(Debug, Default)]
pub struct TextureLayout {
    groups: FxHashMap<String, Vec<(String, TextureHandle)>>,
    open: Option<(String, Vec<(String, TextureHandle)>)>,
}

impl TextureLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a group; unknown names are fine (nothing to drop)
    pub fn delete_group(&mut self, name: &str) {
        self.groups.remove(name);
    }

    /// Start collecting channels for a group
    ///
    /// Replaces any group previously registered under the same name once
    /// `end_group` is called.
    pub fn begin_group(&mut self, name: &str) -> Result<()> {
        if let Some((open, _)) = &self.open {
            crate::engine_error!("hydra::TextureLayout",
                "begin_group('{}') while group '{}' is still open", name, open);
            return Err(Error::InitializationFailed(format!(
                "texture layout group '{}' is still open", open
            )));
        }
        self.open = Some((name.to_string(), Vec::new()));
        Ok(())
    }

    /// Append a channel to the open group
    pub fn add(&mut self, channel: &str, texture: TextureHandle) -> Result<()> {
        match &mut self.open {
            Some((_, channels)) => {
                channels.push((channel.to_string(), texture));
                Ok(())
            }
            None => {
                crate::engine_error!("hydra::TextureLayout",
                    "add('{}') without an open group", channel);
                Err(Error::InitializationFailed(
                    "no texture layout group is open".to_string(),
                ))
            }
        }
    }

    /// Close the open group and register it
    pub fn end_group(&mut self) -> Result<()> {
        match self.open.take() {
            Some((name, channels)) => {
                self.groups.insert(name, channels);
                Ok(())
            }
            None => {
                crate::engine_error!("hydra::TextureLayout", "end_group without an open group");
                Err(Error::InitializationFailed(
                    "no texture layout group is open".to_string(),
                ))
            }
        }
    }

    /// Whether a group is registered
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Channels of a group, in registration order
    pub fn group(&self, name: &str) -> Result<&[(String, TextureHandle)]> {
        self.groups.get(name).map(|g| g.as_slice()).ok_or_else(|| {
            crate::engine_error!("hydra::TextureLayout",
                "Texture layout group '{}' does not exist", name);
            Error::MissingResource(format!("texture layout group '{}'", name))
        })
    }

    /// Look up one channel of a group by name
    pub fn texture(&self, group: &str, channel: &str) -> Result<TextureHandle> {
        let channels = self.group(group)?;
        channels
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, texture)| *texture)
            .ok_or_else(|| {
                crate::engine_error!("hydra::TextureLayout",
                    "Channel '{}' does not exist in group '{}'", channel, group);
                Error::MissingResource(format!(
                    "texture layout channel '{}/{}'", group, channel
                ))
            })
    }
}

#[cfg(test)]
#[path = "texture_layout_tests.rs"]
mod tests;
