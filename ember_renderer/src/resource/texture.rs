//! Sampled-texture registry.
//!
//! Uploads pixel data to GPU-resident 2D images and hands out opaque 1-based
//! handles. Handle 0 does not exist by construction (`NonZeroU32`), which
//! keeps the "0 means no texture" convention of material slots impossible to
//! confuse with a live handle. There is no per-texture deletion; the registry
//! is torn down as a whole when the renderer shuts down.

use std::num::NonZeroU32;

use crate::device::{GraphicsDevice, PixelFormat, TextureFilter, TextureId, TextureUpload, TextureWrap};
use crate::error::Result;
use crate::render_bail;

/// Opaque 1-based texture handle; strictly increasing per creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(NonZeroU32);

impl TextureHandle {
    /// 1-based registry index
    pub fn index(&self) -> u32 {
        self.0.get()
    }
}

/// Creation parameters for a sampled texture
#[derive(Debug, Clone, Copy)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u8,
    pub format: PixelFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
}

/// Registry of GPU textures, indexed by 1-based handles
#[derive(Default)]
pub struct TextureRegistry {
    entries: Vec<TextureId>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload pixel data and register the resulting GPU texture.
    ///
    /// The descriptor's bits-per-pixel must agree with its pixel format, and
    /// `pixels` must carry exactly width × height × bpp / 8 bytes.
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<TextureHandle> {
        if descriptor.bits_per_pixel != descriptor.format.bits_per_pixel() {
            render_bail!(
                "ember::TextureRegistry",
                Validation,
                "{} bits per pixel does not match format {:?}",
                descriptor.bits_per_pixel,
                descriptor.format
            );
        }

        let expected =
            descriptor.width as usize * descriptor.height as usize * descriptor.bits_per_pixel as usize / 8;
        if pixels.len() != expected {
            render_bail!(
                "ember::TextureRegistry",
                Validation,
                "pixel data is {} bytes, expected {} for {}x{} at {} bpp",
                pixels.len(),
                expected,
                descriptor.width,
                descriptor.height,
                descriptor.bits_per_pixel
            );
        }

        let id = device.create_texture(&TextureUpload {
            width: descriptor.width,
            height: descriptor.height,
            format: descriptor.format,
            filter: descriptor.filter,
            wrap: descriptor.wrap,
            pixels,
        })?;

        self.entries.push(id);
        let index = NonZeroU32::new(self.entries.len() as u32)
            .expect("texture registry indices start at 1");
        Ok(TextureHandle(index))
    }

    /// Device-level id behind a handle
    pub fn device_id(&self, handle: TextureHandle) -> Option<TextureId> {
        self.entries.get(handle.index() as usize - 1).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every GPU texture in the registry
    pub(crate) fn destroy_all(&mut self, device: &mut dyn GraphicsDevice) {
        for id in self.entries.drain(..) {
            device.destroy_texture(id);
        }
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
