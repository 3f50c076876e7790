//! Linked shader programs and their shared geometry buffers.
//!
//! A [`ShaderProgram`] owns one linked GPU program, the vertex-array layout
//! derived from its descriptor, and a growable-by-append vertex/index buffer
//! pair shared by every mesh drawing with it. Buffer capacity is fixed at
//! creation; an append past capacity returns a recoverable
//! `Error::CapacityExceeded` and leaves all state untouched.

use rustc_hash::FxHashMap;

use crate::device::{
    BufferId, BufferTarget, GraphicsDevice, ProgramId, ShaderScalar, StageId, UniformValue,
    VertexArrayId, VertexAttribute,
};
use crate::error::Result;
use crate::render_bail;
use crate::resource::UploadRange;
use super::{ShaderDescriptor, ShaderInput, ShaderUniform, TextureAttachment};

/// Opaque handle to a shader program (sequential index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(u32);

impl ShaderHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Sequential index of this shader in the renderer
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Per-uniform failure codes.
///
/// Deliberately not [`Error`](crate::Error): a failed uniform set during a
/// frame skips one call, it never aborts the frame. The variants mirror the
/// distinct conditions a set can fail on, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformError {
    /// The shader handle does not name a live program
    UnknownShader,
    /// The program declares no uniforms at all
    MissingUniformTable,
    /// No declared uniform carries this name
    UnknownUniform,
    /// Payload size does not match components × scalar size
    SizeMismatch,
    /// The linked program has no location for this name
    UnresolvedLocation,
    /// The scalar type has no uniform-set form (U8/U16/S8/S16)
    UnsupportedType,
}

/// Index-buffer element width in bytes (u32 indices)
pub const INDEX_SIZE_BYTES: u32 = 4;

/// A linked program plus the geometry buffers and uniform tables derived from
/// its descriptor.
pub struct ShaderProgram {
    handle: ShaderHandle,
    program: ProgramId,
    vertex_array: VertexArrayId,
    vertex_buffer: BufferId,
    index_buffer: BufferId,

    vertex_stride: u32,
    vertex_capacity: u32,
    index_capacity: u32,
    // monotonic write cursors, in elements
    vertex_cursor: u32,
    index_cursor: u32,

    inputs: Vec<ShaderInput>,
    uniforms: Vec<ShaderUniform>,
    uniform_index: FxHashMap<String, usize>,
    texture_attachments: Vec<TextureAttachment>,
}

impl ShaderProgram {
    /// Build a program from a validated descriptor and pre-compiled stages.
    ///
    /// Creates the vertex array, allocates the vertex/index buffers at the
    /// given capacities, links the program and validates that every declared
    /// uniform resolves to a live location. On any failure every GPU object
    /// created so far is destroyed before the error is returned.
    pub(crate) fn build(
        device: &mut dyn GraphicsDevice,
        handle: ShaderHandle,
        descriptor: &ShaderDescriptor,
        stages: &[StageId],
        vertex_capacity: u32,
        index_capacity: u32,
    ) -> Result<Self> {
        descriptor.validate()?;
        let vertex_stride = descriptor.vertex_stride();

        let vertex_array = device.create_vertex_array()?;

        let vertex_buffer =
            match device.create_buffer(BufferTarget::Vertex, (vertex_capacity * vertex_stride) as usize) {
                Ok(buffer) => buffer,
                Err(error) => {
                    device.destroy_vertex_array(vertex_array);
                    return Err(error);
                }
            };

        let index_buffer =
            match device.create_buffer(BufferTarget::Index, (index_capacity * INDEX_SIZE_BYTES) as usize) {
                Ok(buffer) => buffer,
                Err(error) => {
                    device.destroy_buffer(vertex_buffer);
                    device.destroy_vertex_array(vertex_array);
                    return Err(error);
                }
            };

        let attributes = Self::attribute_layout(&descriptor.inputs, vertex_stride);
        device.configure_vertex_layout(vertex_array, vertex_buffer, index_buffer, &attributes);

        let cleanup_buffers = |device: &mut dyn GraphicsDevice| {
            device.destroy_buffer(index_buffer);
            device.destroy_buffer(vertex_buffer);
            device.destroy_vertex_array(vertex_array);
        };

        let program = match device.create_program(stages) {
            Ok(program) => program,
            Err(error) => {
                cleanup_buffers(device);
                return Err(error);
            }
        };

        for uniform in &descriptor.uniforms {
            if device.uniform_location(program, &uniform.name).is_none() {
                device.destroy_program(program);
                cleanup_buffers(device);
                render_bail!(
                    "ember::ShaderProgram",
                    Validation,
                    "uniform '{}' not found in linked program",
                    uniform.name
                );
            }
        }

        let uniform_index = descriptor
            .uniforms
            .iter()
            .enumerate()
            .map(|(index, uniform)| (uniform.name.clone(), index))
            .collect();

        Ok(Self {
            handle,
            program,
            vertex_array,
            vertex_buffer,
            index_buffer,
            vertex_stride,
            vertex_capacity,
            index_capacity,
            vertex_cursor: 0,
            index_cursor: 0,
            inputs: descriptor.inputs.clone(),
            uniforms: descriptor.uniforms.clone(),
            uniform_index,
            texture_attachments: descriptor.texture_attachments.clone(),
        })
    }

    /// Interleaved attribute layout in declaration order
    fn attribute_layout(inputs: &[ShaderInput], stride: u32) -> Vec<VertexAttribute> {
        let mut attributes = Vec::with_capacity(inputs.len());
        let mut offset = 0;
        for (location, input) in inputs.iter().enumerate() {
            attributes.push(VertexAttribute {
                location: location as u32,
                components: input.components,
                scalar: input.scalar,
                stride,
                offset,
            });
            offset += input.components * input.scalar.size_bytes() as u32;
        }
        attributes
    }

    /// Release every GPU object this program owns
    pub(crate) fn destroy(&self, device: &mut dyn GraphicsDevice) {
        device.destroy_program(self.program);
        device.destroy_vertex_array(self.vertex_array);
        device.destroy_buffer(self.vertex_buffer);
        device.destroy_buffer(self.index_buffer);
    }

    // ===== ACCESSORS =====

    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }

    pub fn program_id(&self) -> ProgramId {
        self.program
    }

    pub fn vertex_array_id(&self) -> VertexArrayId {
        self.vertex_array
    }

    pub fn vertex_buffer_id(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn index_buffer_id(&self) -> BufferId {
        self.index_buffer
    }

    /// Interleaved vertex stride in bytes
    pub fn vertex_stride(&self) -> u32 {
        self.vertex_stride
    }

    pub fn vertex_capacity(&self) -> u32 {
        self.vertex_capacity
    }

    pub fn index_capacity(&self) -> u32 {
        self.index_capacity
    }

    /// Vertices written so far
    pub fn vertex_cursor(&self) -> u32 {
        self.vertex_cursor
    }

    /// Indices written so far
    pub fn index_cursor(&self) -> u32 {
        self.index_cursor
    }

    pub fn inputs(&self) -> &[ShaderInput] {
        &self.inputs
    }

    pub fn uniforms(&self) -> &[ShaderUniform] {
        &self.uniforms
    }

    pub fn texture_attachments(&self) -> &[TextureAttachment] {
        &self.texture_attachments
    }

    /// Whether an uploaded range still fits the buffers and can be drawn
    pub fn range_drawable(&self, range: UploadRange) -> bool {
        range.vertex_count > 0
            && range.index_count > 0
            && range.vertex_offset + range.vertex_count <= self.vertex_capacity
            && range.index_offset + range.index_count <= self.index_capacity
    }

    // ===== GEOMETRY APPEND =====

    /// Append vertex and index data at the current cursors.
    ///
    /// Input indices are mesh-relative (0-based); each is rewritten by adding
    /// the current vertex cursor so it is absolute within the shared buffer.
    /// Fails with `CapacityExceeded` before any write if the append would
    /// overflow either preallocated buffer.
    pub(crate) fn append_geometry(
        &mut self,
        device: &mut dyn GraphicsDevice,
        vertex_data: &[u8],
        indices: &[u32],
    ) -> Result<UploadRange> {
        if vertex_data.is_empty() || indices.is_empty() {
            render_bail!(
                "ember::ShaderProgram",
                Validation,
                "mesh upload carries no vertex or index data"
            );
        }
        if vertex_data.len() % self.vertex_stride as usize != 0 {
            render_bail!(
                "ember::ShaderProgram",
                Validation,
                "vertex data length {} is not a multiple of stride {}",
                vertex_data.len(),
                self.vertex_stride
            );
        }

        let vertex_count = (vertex_data.len() / self.vertex_stride as usize) as u32;
        let index_count = indices.len() as u32;

        if self.vertex_cursor + vertex_count > self.vertex_capacity {
            render_bail!(
                "ember::ShaderProgram",
                CapacityExceeded,
                "vertex buffer full: {} + {} exceeds capacity {}",
                self.vertex_cursor,
                vertex_count,
                self.vertex_capacity
            );
        }
        if self.index_cursor + index_count > self.index_capacity {
            render_bail!(
                "ember::ShaderProgram",
                CapacityExceeded,
                "index buffer full: {} + {} exceeds capacity {}",
                self.index_cursor,
                index_count,
                self.index_capacity
            );
        }

        device.write_buffer(
            BufferTarget::Vertex,
            self.vertex_buffer,
            (self.vertex_cursor * self.vertex_stride) as usize,
            vertex_data,
        );

        let rewritten: Vec<u32> = indices.iter().map(|index| index + self.vertex_cursor).collect();
        device.write_buffer(
            BufferTarget::Index,
            self.index_buffer,
            (self.index_cursor * INDEX_SIZE_BYTES) as usize,
            bytemuck::cast_slice(&rewritten),
        );

        let range = UploadRange {
            vertex_offset: self.vertex_cursor,
            vertex_count,
            index_offset: self.index_cursor,
            index_count,
        };

        self.vertex_cursor += vertex_count;
        self.index_cursor += index_count;

        Ok(range)
    }

    /// Reserve vertices written directly into the vertex buffer, so later
    /// appends land past them (used for the light-pass quad).
    pub(crate) fn reserve_vertices(&mut self, count: u32) {
        self.vertex_cursor += count;
    }

    // ===== UNIFORM SETS =====

    /// Set a declared uniform, validating name, payload size and location.
    pub fn set_uniform(
        &self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        data: &[u8],
    ) -> std::result::Result<(), UniformError> {
        if self.uniforms.is_empty() {
            return Err(UniformError::MissingUniformTable);
        }
        let index = *self
            .uniform_index
            .get(name)
            .ok_or(UniformError::UnknownUniform)?;
        let uniform = &self.uniforms[index];
        if data.len() != uniform.size_bytes() {
            return Err(UniformError::SizeMismatch);
        }
        let location = device
            .uniform_location(self.program, name)
            .ok_or(UniformError::UnresolvedLocation)?;
        dispatch_uniform(device, location, uniform.scalar, data)
    }

    /// Set a uniform that is not tracked in the descriptor, typing the data
    /// only by the caller-supplied scalar (used for derived matrices).
    pub fn set_uniform_raw(
        &self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        data: &[u8],
        scalar: ShaderScalar,
    ) -> std::result::Result<(), UniformError> {
        if self.uniforms.is_empty() {
            return Err(UniformError::MissingUniformTable);
        }
        let location = device
            .uniform_location(self.program, name)
            .ok_or(UniformError::UnresolvedLocation)?;
        dispatch_uniform(device, location, scalar, data)
    }

    /// Whether a declared uniform resolves to a live location
    pub fn uniform_exists(&self, device: &mut dyn GraphicsDevice, name: &str) -> bool {
        if !self.uniform_index.contains_key(name) {
            return false;
        }
        device.uniform_location(self.program, name).is_some()
    }
}

/// Convert a byte payload into the typed device call for the scalar.
///
/// 1-4 component payloads use the distinct fixed-arity forms, larger counts
/// the slice form, matrices always the single-matrix form. U8/U16/S8/S16
/// have no uniform-set form and fail with `UnsupportedType`.
fn dispatch_uniform(
    device: &mut dyn GraphicsDevice,
    location: crate::device::UniformLocationId,
    scalar: ShaderScalar,
    data: &[u8],
) -> std::result::Result<(), UniformError> {
    match scalar {
        ShaderScalar::F32 => {
            let values = read_components::<f32>(data)?;
            let value = match values.as_slice() {
                [x] => UniformValue::F32(*x),
                [x, y] => UniformValue::F32x2([*x, *y]),
                [x, y, z] => UniformValue::F32x3([*x, *y, *z]),
                [x, y, z, w] => UniformValue::F32x4([*x, *y, *z, *w]),
                _ => UniformValue::F32Slice(&values),
            };
            device.set_uniform(location, value);
            Ok(())
        }
        ShaderScalar::S32 | ShaderScalar::Texture => {
            let values = read_components::<i32>(data)?;
            let value = match values.as_slice() {
                [x] => UniformValue::S32(*x),
                [x, y] => UniformValue::S32x2([*x, *y]),
                [x, y, z] => UniformValue::S32x3([*x, *y, *z]),
                [x, y, z, w] => UniformValue::S32x4([*x, *y, *z, *w]),
                _ => UniformValue::S32Slice(&values),
            };
            device.set_uniform(location, value);
            Ok(())
        }
        ShaderScalar::U32 => {
            let values = read_components::<u32>(data)?;
            let value = match values.as_slice() {
                [x] => UniformValue::U32(*x),
                [x, y] => UniformValue::U32x2([*x, *y]),
                [x, y, z] => UniformValue::U32x3([*x, *y, *z]),
                [x, y, z, w] => UniformValue::U32x4([*x, *y, *z, *w]),
                _ => UniformValue::U32Slice(&values),
            };
            device.set_uniform(location, value);
            Ok(())
        }
        ShaderScalar::Mat4x4 => {
            let values = read_components::<f32>(data)?;
            let matrix: [f32; 16] = values
                .as_slice()
                .try_into()
                .map_err(|_| UniformError::SizeMismatch)?;
            device.set_uniform(location, UniformValue::Mat4(&matrix));
            Ok(())
        }
        ShaderScalar::U8 | ShaderScalar::U16 | ShaderScalar::S8 | ShaderScalar::S16 => {
            Err(UniformError::UnsupportedType)
        }
    }
}

/// Read a payload as native-endian 4-byte components without an alignment
/// requirement on the input slice.
fn read_components<T: bytemuck::Pod>(data: &[u8]) -> std::result::Result<Vec<T>, UniformError> {
    let size = std::mem::size_of::<T>();
    if data.is_empty() || data.len() % size != 0 {
        return Err(UniformError::SizeMismatch);
    }
    Ok(data
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

#[cfg(test)]
#[path = "program_tests.rs"]
mod tests;
