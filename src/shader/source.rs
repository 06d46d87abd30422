/// ShaderSource - preprocessed shader source handed to the technique cache
///
/// The asset importer (outside this crate) parses the
/// `#pragma hydra vert:MainVS pixel:MainPS rs:Deffered` convention out of
/// the source file and delivers the result as a `ShaderSource`. This crate
/// only consumes the stage -> entry-point mapping, it never parses pragmas.

use std::collections::BTreeMap;

use crate::device::ShaderStage;

/// Preprocessed shader source plus its declared stage entry points
#[derive(Debug, Clone)]
pub struct ShaderSource {
    /// Source identity (asset path); the technique cache key
    path: String,
    /// Source text with the pragma lines stripped
    text: String,
    /// Declared entry point per stage
    entry_points: BTreeMap<ShaderStage, String>,
    /// Render stage tag (`rs:` pragma value), if any
    render_stage: Option<String>,
}

impl ShaderSource {
    pub fn new(path: &str, text: &str) -> Self {
        Self {
            path: path.to_string(),
            text: text.to_string(),
            entry_points: BTreeMap::new(),
            render_stage: None,
        }
    }

    /// Declare an entry point for a stage (builder style)
    pub fn with_entry_point(mut self, stage: ShaderStage, entry_point: &str) -> Self {
        self.entry_points.insert(stage, entry_point.to_string());
        self
    }

    /// Tag the source with the render stage it belongs to (builder style)
    pub fn with_render_stage(mut self, render_stage: &str) -> Self {
        self.render_stage = Some(render_stage.to_string());
        self
    }

    /// Source identity (asset path)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Source text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Declared entry points, keyed by stage
    pub fn entry_points(&self) -> &BTreeMap<ShaderStage, String> {
        &self.entry_points
    }

    /// Render stage tag, if declared
    pub fn render_stage(&self) -> Option<&str> {
        self.render_stage.as_deref()
    }
}
