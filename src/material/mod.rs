/// Material module - typed named parameters bound to reflected shader layouts

// Module declarations
pub mod variable;
pub mod material;

// Re-exports
pub use material::*;
pub use variable::*;
