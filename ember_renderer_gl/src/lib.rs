/*!
# Ember Renderer: OpenGL device

OpenGL implementation of the `ember_renderer` [`GraphicsDevice`] trait,
built on [`glow`].

Context creation stays with the caller: construct the device from the GL
loader function of an existing, current context (GLFW, SDL, glutin, ...).

```no_run
# fn get_proc_address(_name: &str) -> *const std::ffi::c_void { std::ptr::null() }
use ember_renderer::ember::{Renderer, RendererConfig};
use ember_renderer_gl::GlGraphicsDevice;

let device = unsafe { GlGraphicsDevice::from_loader(|name| get_proc_address(name)) };
let renderer = Renderer::new(Box::new(device), RendererConfig::default())?;
# Ok::<(), ember_renderer::Error>(())
```

[`GraphicsDevice`]: ember_renderer::device::GraphicsDevice
*/

mod gl_format;
mod gl_graphics_device;

pub use gl_graphics_device::GlGraphicsDevice;
