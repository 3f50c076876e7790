//! Mesh registry.
//!
//! A mesh ties a transform and a material to an uploaded vertex/index range
//! inside its shader's shared geometry buffer. Transform and material stay
//! mutable for the caller through the registry; the upload range is managed
//! by the renderer. Meshes are never destroyed individually; they live for
//! the renderer's lifetime.

use glam::{Mat4, Vec3};

use crate::shader::ShaderHandle;
use super::TextureHandle;

/// Position, rotation (degrees) and scale of a mesh
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Model matrix: translate · rotate · scale.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * self.rotation_matrix() * Mat4::from_scale(self.scale)
    }

    /// Rotation part alone, applied Y then Z then X (degrees).
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_degrees.y.to_radians())
            * Mat4::from_rotation_z(self.rotation_degrees.z.to_radians())
            * Mat4::from_rotation_x(self.rotation_degrees.x.to_radians())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Base color plus ordered texture slots.
///
/// Slot order matches the shader's texture-attachment declaration order;
/// slots past the end of the list are drawn with the "no texture" sampler.
#[derive(Debug, Clone)]
pub struct Material {
    pub color: Vec3,
    pub textures: Vec<TextureHandle>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            textures: Vec::new(),
        }
    }
}

/// Uploaded range inside the owning shader's geometry buffer, in elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadRange {
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub index_offset: u32,
    pub index_count: u32,
}

impl UploadRange {
    /// Whether any geometry has been uploaded for this range
    pub fn is_uploaded(&self) -> bool {
        self.vertex_count > 0 && self.index_count > 0
    }
}

/// Opaque mesh handle (sequential index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(u32);

impl MeshHandle {
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// One registered mesh
#[derive(Debug)]
pub struct Mesh {
    pub transform: Transform,
    pub material: Material,
    shader: ShaderHandle,
    range: UploadRange,
}

impl Mesh {
    /// The shader program this mesh draws with (fixed at creation)
    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    /// Current uploaded range; a default range means "not uploaded"
    pub fn range(&self) -> UploadRange {
        self.range
    }
}

/// Registry of meshes, indexed by sequential handles
#[derive(Default)]
pub struct MeshRegistry {
    entries: Vec<Mesh>,
}

impl MeshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh with no uploaded geometry yet
    pub fn create(
        &mut self,
        transform: Transform,
        material: Material,
        shader: ShaderHandle,
    ) -> MeshHandle {
        let handle = MeshHandle(self.entries.len() as u32);
        self.entries.push(Mesh {
            transform,
            material,
            shader,
            range: UploadRange::default(),
        });
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.entries.get(handle.0 as usize)
    }

    /// Mutable access for transform/material updates between frames
    pub fn get_mut(&mut self, handle: MeshHandle) -> Option<&mut Mesh> {
        self.entries.get_mut(handle.0 as usize)
    }

    /// Record a freshly appended range for the mesh.
    ///
    /// A re-upload repoints the mesh at the new range; the previous range
    /// becomes unreferenced dead space in the shared buffer.
    pub(crate) fn set_range(&mut self, handle: MeshHandle, range: UploadRange) {
        if let Some(mesh) = self.entries.get_mut(handle.0 as usize) {
            mesh.range = range;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mesh> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
