/// Shader module - descriptors, program records and uniform dispatch

// Module declarations
pub mod descriptor;
pub mod program;

// Re-export from other modules
pub use descriptor::*;
pub use program::*;
