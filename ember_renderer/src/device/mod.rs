/// Graphics device module - the backend-facing types and trait

// Module declarations
pub mod graphics_device;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
