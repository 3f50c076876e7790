//! Graphics device abstraction.
//!
//! An object-safe trait over the GPU operations the deferred renderer issues,
//! plus the plain-data types crossing that boundary. Backend implementations
//! map each operation 1:1 onto their API (OpenGL in `ember_renderer_gl`);
//! unit tests use the recording mock in this module's sibling file.
//!
//! All ids handed out by a device are opaque integers scoped to that device.
//! The renderer owns every id it receives and destroys them at teardown.

use bitflags::bitflags;
use crate::error::Result;

// ===== IDS =====

/// Compiled shader stage id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(pub u32);

/// Linked program id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// GPU buffer id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Vertex array (attribute layout) id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

/// GPU texture id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Framebuffer id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

/// Resolved uniform location id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocationId(pub u32);

// ===== SHADER DATA TYPES =====

/// Shader stage kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
    Geometry,
    Compute,
}

/// Scalar element types flowing through vertex inputs and uniforms.
///
/// `Texture` is its own case: a sampler binding is not an integer even though
/// it is set through the signed-integer uniform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderScalar {
    U8,
    U16,
    U32,
    S8,
    S16,
    S32,
    F32,
    Mat4x4,
    Texture,
}

impl ShaderScalar {
    /// Size in bytes of one element of this type
    pub fn size_bytes(&self) -> usize {
        match self {
            ShaderScalar::U8 | ShaderScalar::S8 => 1,
            ShaderScalar::U16 | ShaderScalar::S16 => 2,
            ShaderScalar::U32 | ShaderScalar::S32 | ShaderScalar::F32 => 4,
            ShaderScalar::Mat4x4 => 64,
            // sampler slot index, set as a single S32
            ShaderScalar::Texture => 4,
        }
    }

    /// Whether values of this type can feed a vertex attribute
    pub fn is_attribute_compatible(&self) -> bool {
        !matches!(self, ShaderScalar::Mat4x4 | ShaderScalar::Texture)
    }
}

// ===== GEOMETRY TYPES =====

/// Buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Vertex,
    /// Triangle index data (u32 elements)
    Index,
}

/// One vertex attribute derived from a shader input declaration
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// Attribute location (declaration order)
    pub location: u32,
    /// Component count (1-4)
    pub components: u32,
    /// Component scalar type
    pub scalar: ShaderScalar,
    /// Interleaved stride in bytes
    pub stride: u32,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

// ===== TEXTURE TYPES =====

/// Pixel layout of sampled-texture uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
    Bgr,
    Bgra,
}

impl PixelFormat {
    /// Bits per pixel this layout implies
    pub fn bits_per_pixel(&self) -> u8 {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => 24,
            PixelFormat::Rgba | PixelFormat::Bgra => 32,
        }
    }
}

/// Texture sampling filter. The minification path uses the mipmap variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Texture coordinate wrap mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Sampled-texture upload description
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    pub pixels: &'a [u8],
}

/// Offscreen render-target texel formats used by the deferred pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// 16-bit float RGBA (position/normal/albedo-specular targets)
    Rgba16Float,
    /// 32-bit float single channel (shadow accumulation target)
    R32Float,
    /// 32-bit float depth
    Depth32Float,
}

// ===== UNIFORM VALUES =====

/// A typed uniform value ready for the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    F32(f32),
    F32x2([f32; 2]),
    F32x3([f32; 3]),
    F32x4([f32; 4]),
    F32Slice(&'a [f32]),
    S32(i32),
    S32x2([i32; 2]),
    S32x3([i32; 3]),
    S32x4([i32; 4]),
    S32Slice(&'a [i32]),
    U32(u32),
    U32x2([u32; 2]),
    U32x3([u32; 3]),
    U32x4([u32; 4]),
    U32Slice(&'a [u32]),
    /// Column-major 4×4 matrix, always a single matrix
    Mat4(&'a [f32; 16]),
}

bitflags! {
    /// Framebuffer clear mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

// ===== TRAIT =====

/// The GPU operations the renderer issues, in backend-neutral form.
///
/// Deliberately not `Send`/`Sync`: every call must happen on the thread that
/// owns the graphics context. Void operations on an unknown id are ignored by
/// backends (the renderer validates handles before they reach the device).
pub trait GraphicsDevice {
    // ===== SHADER STAGES AND PROGRAMS =====

    /// Compile one shader stage from source. The error carries the driver log.
    fn create_shader_stage(&mut self, kind: ShaderStageKind, source: &str) -> Result<StageId>;

    /// Release a compiled stage
    fn destroy_shader_stage(&mut self, stage: StageId);

    /// Attach the stages, link a program, detach. The error carries the link log.
    fn create_program(&mut self, stages: &[StageId]) -> Result<ProgramId>;

    /// Release a linked program
    fn destroy_program(&mut self, program: ProgramId);

    /// Make the program current for subsequent uniform sets and draws
    fn use_program(&mut self, program: ProgramId);

    /// Resolve a uniform name to a location in the linked program.
    /// `None` means the uniform is absent or was optimized out.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocationId>;

    /// Set a uniform on the current program
    fn set_uniform(&mut self, location: UniformLocationId, value: UniformValue<'_>);

    // ===== GEOMETRY BUFFERS =====

    fn create_vertex_array(&mut self) -> Result<VertexArrayId>;

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId);

    /// Allocate a buffer with fixed capacity and undefined contents
    fn create_buffer(&mut self, target: BufferTarget, capacity_bytes: usize) -> Result<BufferId>;

    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Sub-range write into a previously allocated buffer
    fn write_buffer(
        &mut self,
        target: BufferTarget,
        buffer: BufferId,
        offset_bytes: usize,
        data: &[u8],
    );

    /// Record the attribute layout of a vertex/index buffer pair into the
    /// vertex array
    fn configure_vertex_layout(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        attributes: &[VertexAttribute],
    );

    /// Bind a vertex array and its buffer pair for drawing
    fn bind_geometry(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
    );

    /// Draw indexed triangles over `[first_index, first_index + index_count)`
    fn draw_indexed(&mut self, first_index: u32, index_count: u32);

    /// Draw a triangle strip over `[first_vertex, first_vertex + vertex_count)`
    fn draw_strip(&mut self, first_vertex: u32, vertex_count: u32);

    // ===== TEXTURES =====

    /// Upload a sampled 2D texture, generating mipmaps
    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureId>;

    /// Allocate an offscreen render-target texture (nearest filtering, no data)
    fn create_target_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TargetFormat,
    ) -> Result<TextureId>;

    fn destroy_texture(&mut self, texture: TextureId);

    /// Bind a texture to a sampling unit
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<FramebufferId>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Attach a color target texture at the given slot
    fn attach_color_target(&mut self, framebuffer: FramebufferId, slot: u32, texture: TextureId);

    /// Attach a depth target texture
    fn attach_depth_target(&mut self, framebuffer: FramebufferId, texture: TextureId);

    /// Declare how many color slots the framebuffer writes (0 = depth only)
    fn set_color_target_count(&mut self, framebuffer: FramebufferId, count: u32);

    /// Bind a framebuffer for drawing; `None` binds the default framebuffer
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    // ===== FIXED STATE =====

    fn set_viewport(&mut self, width: u32, height: u32);

    fn clear(&mut self, mask: ClearMask);

    fn set_depth_test(&mut self, enabled: bool);

    fn set_depth_write(&mut self, enabled: bool);
}
