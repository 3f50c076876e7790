//! Mapping of renderer enums onto GL constants.

use ember_renderer::device::{
    PixelFormat, ShaderScalar, ShaderStageKind, TargetFormat, TextureFilter, TextureWrap,
};

/// GL shader stage for a stage kind
pub(crate) fn shader_stage_to_gl(kind: ShaderStageKind) -> u32 {
    match kind {
        ShaderStageKind::Vertex => glow::VERTEX_SHADER,
        ShaderStageKind::Fragment => glow::FRAGMENT_SHADER,
        ShaderStageKind::Geometry => glow::GEOMETRY_SHADER,
        ShaderStageKind::Compute => glow::COMPUTE_SHADER,
    }
}

/// GL component type for a vertex attribute scalar.
/// `None` for types that cannot feed an attribute (Mat4x4, Texture).
pub(crate) fn attribute_type_to_gl(scalar: ShaderScalar) -> Option<u32> {
    match scalar {
        ShaderScalar::U8 => Some(glow::UNSIGNED_BYTE),
        ShaderScalar::U16 => Some(glow::UNSIGNED_SHORT),
        ShaderScalar::U32 => Some(glow::UNSIGNED_INT),
        ShaderScalar::S8 => Some(glow::BYTE),
        ShaderScalar::S16 => Some(glow::SHORT),
        ShaderScalar::S32 => Some(glow::INT),
        ShaderScalar::F32 => Some(glow::FLOAT),
        ShaderScalar::Mat4x4 | ShaderScalar::Texture => None,
    }
}

/// GL pixel transfer format for an upload layout
pub(crate) fn pixel_format_to_gl(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Rgb => glow::RGB,
        PixelFormat::Rgba => glow::RGBA,
        PixelFormat::Bgr => glow::BGR,
        PixelFormat::Bgra => glow::BGRA,
    }
}

/// Magnification filter
pub(crate) fn filter_to_gl_mag(filter: TextureFilter) -> i32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST as i32,
        TextureFilter::Linear => glow::LINEAR as i32,
    }
}

/// Minification filter; sampled textures always carry mipmaps
pub(crate) fn filter_to_gl_min(filter: TextureFilter) -> i32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST_MIPMAP_NEAREST as i32,
        TextureFilter::Linear => glow::LINEAR_MIPMAP_LINEAR as i32,
    }
}

/// Coordinate wrap mode
pub(crate) fn wrap_to_gl(wrap: TextureWrap) -> i32 {
    match wrap {
        TextureWrap::Repeat => glow::REPEAT as i32,
        TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT as i32,
        TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE as i32,
        TextureWrap::ClampToBorder => glow::CLAMP_TO_BORDER as i32,
    }
}

/// (internal format, transfer format, component type) of a render target
pub(crate) fn target_format_to_gl(format: TargetFormat) -> (i32, u32, u32) {
    match format {
        TargetFormat::Rgba16Float => (glow::RGBA16F as i32, glow::RGBA, glow::FLOAT),
        TargetFormat::R32Float => (glow::R32F as i32, glow::RED, glow::FLOAT),
        TargetFormat::Depth32Float => (
            glow::DEPTH_COMPONENT32F as i32,
            glow::DEPTH_COMPONENT,
            glow::FLOAT,
        ),
    }
}

#[cfg(test)]
#[path = "gl_format_tests.rs"]
mod tests;
