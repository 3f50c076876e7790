use super::*;

// ============================================================================
// Stage mapping tests
// ============================================================================

#[test]
fn test_shader_stage_mapping() {
    assert_eq!(shader_stage_to_gl(ShaderStageKind::Vertex), glow::VERTEX_SHADER);
    assert_eq!(shader_stage_to_gl(ShaderStageKind::Fragment), glow::FRAGMENT_SHADER);
    assert_eq!(shader_stage_to_gl(ShaderStageKind::Geometry), glow::GEOMETRY_SHADER);
    assert_eq!(shader_stage_to_gl(ShaderStageKind::Compute), glow::COMPUTE_SHADER);
}

// ============================================================================
// Attribute mapping tests
// ============================================================================

#[test]
fn test_attribute_scalar_mapping() {
    assert_eq!(attribute_type_to_gl(ShaderScalar::U8), Some(glow::UNSIGNED_BYTE));
    assert_eq!(attribute_type_to_gl(ShaderScalar::U16), Some(glow::UNSIGNED_SHORT));
    assert_eq!(attribute_type_to_gl(ShaderScalar::U32), Some(glow::UNSIGNED_INT));
    assert_eq!(attribute_type_to_gl(ShaderScalar::S8), Some(glow::BYTE));
    assert_eq!(attribute_type_to_gl(ShaderScalar::S16), Some(glow::SHORT));
    assert_eq!(attribute_type_to_gl(ShaderScalar::S32), Some(glow::INT));
    assert_eq!(attribute_type_to_gl(ShaderScalar::F32), Some(glow::FLOAT));
}

#[test]
fn test_non_attribute_scalars_have_no_mapping() {
    assert_eq!(attribute_type_to_gl(ShaderScalar::Mat4x4), None);
    assert_eq!(attribute_type_to_gl(ShaderScalar::Texture), None);
}

// ============================================================================
// Texture mapping tests
// ============================================================================

#[test]
fn test_pixel_format_mapping() {
    assert_eq!(pixel_format_to_gl(PixelFormat::Rgb), glow::RGB);
    assert_eq!(pixel_format_to_gl(PixelFormat::Rgba), glow::RGBA);
    assert_eq!(pixel_format_to_gl(PixelFormat::Bgr), glow::BGR);
    assert_eq!(pixel_format_to_gl(PixelFormat::Bgra), glow::BGRA);
}

#[test]
fn test_min_filter_uses_mipmap_variants() {
    assert_eq!(
        filter_to_gl_min(TextureFilter::Nearest),
        glow::NEAREST_MIPMAP_NEAREST as i32
    );
    assert_eq!(
        filter_to_gl_min(TextureFilter::Linear),
        glow::LINEAR_MIPMAP_LINEAR as i32
    );
}

#[test]
fn test_mag_filter_has_no_mipmap_variants() {
    assert_eq!(filter_to_gl_mag(TextureFilter::Nearest), glow::NEAREST as i32);
    assert_eq!(filter_to_gl_mag(TextureFilter::Linear), glow::LINEAR as i32);
}

#[test]
fn test_wrap_mapping() {
    assert_eq!(wrap_to_gl(TextureWrap::Repeat), glow::REPEAT as i32);
    assert_eq!(wrap_to_gl(TextureWrap::MirroredRepeat), glow::MIRRORED_REPEAT as i32);
    assert_eq!(wrap_to_gl(TextureWrap::ClampToEdge), glow::CLAMP_TO_EDGE as i32);
    assert_eq!(wrap_to_gl(TextureWrap::ClampToBorder), glow::CLAMP_TO_BORDER as i32);
}

// ============================================================================
// Render target mapping tests
// ============================================================================

#[test]
fn test_target_format_mapping() {
    assert_eq!(
        target_format_to_gl(TargetFormat::Rgba16Float),
        (glow::RGBA16F as i32, glow::RGBA, glow::FLOAT)
    );
    assert_eq!(
        target_format_to_gl(TargetFormat::R32Float),
        (glow::R32F as i32, glow::RED, glow::FLOAT)
    );
    assert_eq!(
        target_format_to_gl(TargetFormat::Depth32Float),
        (glow::DEPTH_COMPONENT32F as i32, glow::DEPTH_COMPONENT, glow::FLOAT)
    );
}
