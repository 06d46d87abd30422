/// Render stages - multi-pass pipeline building blocks

// Module declarations
pub mod texture_layout;
pub mod deferred;

// Re-exports
pub use deferred::*;
pub use texture_layout::*;

use crate::error::Result;
use crate::graphics::Graphics;
use crate::render_manager::{CameraState, RenderInstance};

/// Everything a stage sees for one frame: the camera and the instances to
/// draw, already in submission order
pub struct FrameView<'a> {
    pub camera: &'a CameraState,
    pub renderers: &'a [RenderInstance],
}

/// One pass (or pass group) of the frame pipeline
///
/// Stages own their materials and named render targets; the manager owns
/// the stage list and drives `render` once per frame. View-sized resources
/// are (re)allocated through `allocate_view_dependent_resources`, which the
/// manager calls at startup and on every resize.
pub trait RenderStage {
    /// Stage name, matching the `rs:` tag of shader sources that belong
    /// to it
    fn name(&self) -> &str;

    /// Named render target holding the stage's color output
    fn output_name(&self) -> &str;

    /// Named depth target produced by the stage, if it writes one
    fn depth_output_name(&self) -> Option<&str>;

    /// Create (or recreate) every view-sized resource for the given
    /// dimensions and MSAA sample count; previous targets under the same
    /// names are destroyed
    fn allocate_view_dependent_resources(
        &mut self,
        graphics: &mut Graphics,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<()>;

    /// Run the stage's passes for one frame
    fn render(&mut self, graphics: &mut Graphics, view: &FrameView<'_>) -> Result<()>;
}
