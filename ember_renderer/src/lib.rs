/*!
# Ember Renderer

Core types for the Ember deferred rendering toy.

This crate provides the platform-agnostic rendering core: shader program and
geometry-buffer management, mesh/texture/light registries, and the deferred
draw pipeline (geometry pass, shadow pass, screen-space lighting pass). All
GPU work goes through the [`device::GraphicsDevice`] trait; backend
implementations (OpenGL via `ember_renderer_gl`) are plugged in at startup.

## Architecture

- **GraphicsDevice**: trait over the GPU operations the renderer issues
- **ShaderProgram**: linked program + growable vertex/index buffer pair
- **Mesh/Texture/Light registries**: opaque integer handles, renderer-owned
- **DeferredPipeline**: the three-pass frame orchestrator
- **Renderer**: facade owning the device, the registries and the pipeline

The renderer is single-threaded by design: every GPU call happens on the
thread owning the graphics context.
*/

// Internal modules
mod error;
pub mod log;
pub mod camera;
pub mod input;
pub mod device;
pub mod shader;
pub mod resource;
pub mod pipeline;
pub mod renderer;

// Error types at the crate root, used by backends as well
pub use crate::error::{Error, Result};

// Main ember namespace module
pub mod ember {
    // Error types
    pub use crate::error::{Error, Result};

    // Renderer facade
    pub use crate::renderer::{Renderer, RendererConfig};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: render_* macros are NOT re-exported here - they are crate-rooted
    }

    // Device sub-module with the backend-facing types
    pub mod device {
        pub use crate::device::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Pipeline sub-module
    pub mod pipeline {
        pub use crate::pipeline::*;
    }

    // Frame-loop utilities
    pub mod camera {
        pub use crate::camera::*;
    }
    pub mod input {
        pub use crate::input::*;
    }
}

// Re-export math library at crate root
pub use glam;
