/// Device module - the graphics-device collaborator interface
///
/// The engine core never talks to a GPU API directly. Everything goes
/// through the `RenderDevice` trait and the `DrawState` builder, so the
/// whole binding sequence is inspectable with `MockDevice` in tests.

// Module declarations
pub mod types;
pub mod draw_state;
pub mod device;
pub mod mock_device;

// Re-export everything device-facing
pub use device::*;
pub use draw_state::*;
pub use types::*;
