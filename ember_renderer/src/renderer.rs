//! Renderer facade.
//!
//! Owns the boxed graphics device, the shader table, the mesh/texture/light
//! registries and the deferred pipeline. Every public operation validates its
//! handles before anything reaches the device; construction-time failures are
//! fatal to the call, per-frame failures are skipped and counted.
//!
//! The built-in pass shaders (geometry, lighting, shadow depth, shadow
//! composite) are compiled at startup from embedded source; callers draw with
//! the default geometry shader or register their own pipeline configurations
//! through `create_shader`.

use glam::Vec3;

use crate::camera::Camera;
use crate::device::{GraphicsDevice, ShaderScalar, ShaderStageKind, StageId};
use crate::error::Result;
use crate::pipeline::shaders as builtin;
use crate::pipeline::{DeferredPipeline, FrameStats};
use crate::render_bail;
use crate::render_info;
use crate::resource::{
    LightHandle, LightRegistry, Material, Mesh, MeshHandle, MeshRegistry, TextureDescriptor,
    TextureHandle, TextureRegistry, Transform,
};
use crate::shader::{
    ShaderDescriptor, ShaderHandle, ShaderInput, ShaderProgram, ShaderUniform, TextureAttachment,
    TextureRole, UniformError,
};

/// Startup configuration.
///
/// All capacities are fixed for the renderer's lifetime; geometry appends
/// past capacity fail with a recoverable `CapacityExceeded`.
#[derive(Debug, Clone, Copy)]
pub struct RendererConfig {
    /// G-buffer target width in pixels
    pub surface_width: u32,
    /// G-buffer target height in pixels
    pub surface_height: u32,
    /// Per-shader vertex buffer capacity, in vertices
    pub vertex_capacity: u32,
    /// Per-shader index buffer capacity, in indices
    pub index_capacity: u32,
    /// Shadow map resolution (square)
    pub shadow_map_size: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_width: 800,
            surface_height: 600,
            vertex_capacity: 1024,
            index_capacity: 1024,
            shadow_map_size: 1024,
        }
    }
}

/// The renderer: device + registries + deferred pipeline
///
/// Manual `Debug` impl: the boxed `dyn GraphicsDevice` is not `Debug`, so the
/// struct cannot derive it.
pub struct Renderer {
    device: Box<dyn GraphicsDevice>,
    config: RendererConfig,
    shaders: Vec<ShaderProgram>,
    meshes: MeshRegistry,
    textures: TextureRegistry,
    lights: LightRegistry,
    pipeline: DeferredPipeline,
    default_shader: ShaderHandle,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("shader_count", &self.shaders.len())
            .field("default_shader", &self.default_shader)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Build a renderer over a graphics device.
    ///
    /// Compiles and links the four built-in pass shaders and allocates the
    /// offscreen targets. Any failure here is fatal: startup cannot proceed
    /// without the pipeline.
    pub fn new(mut device: Box<dyn GraphicsDevice>, config: RendererConfig) -> Result<Self> {
        let mut shaders = Vec::new();

        let default_shader = Self::build_builtin(
            device.as_mut(),
            &mut shaders,
            &config,
            default_shader_descriptor(),
            builtin::GEOMETRY_VERT,
            builtin::GEOMETRY_FRAG,
        )?;

        let light_shader = Self::build_builtin(
            device.as_mut(),
            &mut shaders,
            &config,
            light_pass_descriptor(),
            builtin::LIGHT_VERT,
            builtin::LIGHT_FRAG,
        )?;

        let depth_shader = Self::build_builtin(
            device.as_mut(),
            &mut shaders,
            &config,
            shadow_depth_descriptor(),
            builtin::SHADOW_DEPTH_VERT,
            builtin::SHADOW_DEPTH_FRAG,
        )?;

        let composite_shader = Self::build_builtin(
            device.as_mut(),
            &mut shaders,
            &config,
            shadow_composite_descriptor(),
            builtin::SHADOW_COMPOSITE_VERT,
            builtin::SHADOW_COMPOSITE_FRAG,
        )?;

        let pipeline = DeferredPipeline::new(
            device.as_mut(),
            &config,
            &mut shaders,
            light_shader,
            depth_shader,
            composite_shader,
        )?;

        render_info!(
            "ember::Renderer",
            "renderer initialized: {}x{} surface, {} vertex / {} index capacity",
            config.surface_width,
            config.surface_height,
            config.vertex_capacity,
            config.index_capacity
        );

        Ok(Self {
            device,
            config,
            shaders,
            meshes: MeshRegistry::new(),
            textures: TextureRegistry::new(),
            lights: LightRegistry::new(),
            pipeline,
            default_shader,
        })
    }

    /// Compile both stages of a built-in shader, build the program, release
    /// the stages.
    fn build_builtin(
        device: &mut dyn GraphicsDevice,
        shaders: &mut Vec<ShaderProgram>,
        config: &RendererConfig,
        descriptor: ShaderDescriptor,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle> {
        let vertex_stage = device.create_shader_stage(ShaderStageKind::Vertex, vertex_source)?;
        let fragment_stage =
            match device.create_shader_stage(ShaderStageKind::Fragment, fragment_source) {
                Ok(stage) => stage,
                Err(error) => {
                    device.destroy_shader_stage(vertex_stage);
                    return Err(error);
                }
            };

        let handle = Self::build_shader(
            device,
            shaders,
            config,
            &descriptor,
            &[vertex_stage, fragment_stage],
        );

        device.destroy_shader_stage(vertex_stage);
        device.destroy_shader_stage(fragment_stage);
        handle
    }

    fn build_shader(
        device: &mut dyn GraphicsDevice,
        shaders: &mut Vec<ShaderProgram>,
        config: &RendererConfig,
        descriptor: &ShaderDescriptor,
        stages: &[StageId],
    ) -> Result<ShaderHandle> {
        let handle = ShaderHandle::new(shaders.len() as u32);
        let program = ShaderProgram::build(
            device,
            handle,
            descriptor,
            stages,
            config.vertex_capacity,
            config.index_capacity,
        )?;
        shaders.push(program);
        Ok(handle)
    }

    // ===== SHADER API =====

    /// Compile one shader stage from source
    pub fn create_shader_stage(&mut self, kind: ShaderStageKind, source: &str) -> Result<StageId> {
        self.device.create_shader_stage(kind, source)
    }

    /// Release a compiled stage
    pub fn destroy_shader_stage(&mut self, stage: StageId) {
        self.device.destroy_shader_stage(stage);
    }

    /// Build a linked shader program from a descriptor and compiled stages.
    ///
    /// The stages stay owned by the caller and can be released afterwards.
    pub fn create_shader(
        &mut self,
        descriptor: &ShaderDescriptor,
        stages: &[StageId],
    ) -> Result<ShaderHandle> {
        Self::build_shader(
            self.device.as_mut(),
            &mut self.shaders,
            &self.config,
            descriptor,
            stages,
        )
    }

    /// The built-in geometry shader, usable for meshes out of the box
    pub fn default_shader(&self) -> ShaderHandle {
        self.default_shader
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// Make a shader program current
    pub fn shader_use(&mut self, shader: ShaderHandle) -> Result<()> {
        let Some(program) = self.shaders.get(shader.index() as usize) else {
            render_bail!(
                "ember::Renderer",
                ResourceNotFound,
                "shader {} does not exist",
                shader.index()
            );
        };
        self.device.use_program(program.program_id());
        Ok(())
    }

    /// Set a declared uniform on a shader.
    ///
    /// Returns a [`UniformError`] code instead of an [`Error`](crate::Error):
    /// per-frame failures are meant to be skipped, not propagated.
    pub fn shader_uniform(
        &mut self,
        shader: ShaderHandle,
        name: &str,
        data: &[u8],
    ) -> std::result::Result<(), UniformError> {
        let program = self
            .shaders
            .get(shader.index() as usize)
            .ok_or(UniformError::UnknownShader)?;
        program.set_uniform(self.device.as_mut(), name, data)
    }

    /// Set a uniform that is not tracked in the shader's descriptor, typed
    /// only by the caller-supplied scalar
    pub fn shader_uniform_raw(
        &mut self,
        shader: ShaderHandle,
        name: &str,
        data: &[u8],
        scalar: ShaderScalar,
    ) -> std::result::Result<(), UniformError> {
        let program = self
            .shaders
            .get(shader.index() as usize)
            .ok_or(UniformError::UnknownShader)?;
        program.set_uniform_raw(self.device.as_mut(), name, data, scalar)
    }

    /// Whether a declared uniform resolves to a live location
    pub fn shader_uniform_exists(&mut self, shader: ShaderHandle, name: &str) -> bool {
        match self.shaders.get(shader.index() as usize) {
            Some(program) => program.uniform_exists(self.device.as_mut(), name),
            None => false,
        }
    }

    // ===== MESH API =====

    /// Register a mesh drawing with the given shader.
    ///
    /// Transform and material stay mutable through `mesh_mut`; the shader
    /// binding is fixed at creation.
    pub fn create_mesh(
        &mut self,
        transform: Transform,
        material: Material,
        shader: ShaderHandle,
    ) -> Result<MeshHandle> {
        if self.shaders.get(shader.index() as usize).is_none() {
            render_bail!(
                "ember::Renderer",
                ResourceNotFound,
                "shader {} does not exist",
                shader.index()
            );
        }
        Ok(self.meshes.create(transform, material, shader))
    }

    /// Upload mesh geometry into its shader's shared buffers.
    ///
    /// `indices` are mesh-relative (0-based); they are rewritten to absolute
    /// positions during the append. Re-uploading a mesh appends a fresh range
    /// and repoints the mesh at it; the previous range becomes dead space.
    pub fn mesh_upload(
        &mut self,
        mesh: MeshHandle,
        vertex_data: &[u8],
        indices: &[u32],
    ) -> Result<()> {
        let Some(entry) = self.meshes.get(mesh) else {
            render_bail!(
                "ember::Renderer",
                ResourceNotFound,
                "mesh {} does not exist",
                mesh.index()
            );
        };
        let shader = entry.shader();
        let Some(program) = self.shaders.get_mut(shader.index() as usize) else {
            render_bail!(
                "ember::Renderer",
                ResourceNotFound,
                "shader {} does not exist",
                shader.index()
            );
        };

        let range = program.append_geometry(self.device.as_mut(), vertex_data, indices)?;
        self.meshes.set_range(mesh, range);
        Ok(())
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle)
    }

    /// Mutable access for per-frame transform/material updates
    pub fn mesh_mut(&mut self, handle: MeshHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    // ===== TEXTURE API =====

    /// Upload a texture; handles are 1-based and strictly increasing
    pub fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<TextureHandle> {
        self.textures
            .create(self.device.as_mut(), descriptor, pixels)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ===== LIGHT API =====

    /// Register a point light
    pub fn create_light(&mut self, position: Vec3, color: Vec3, intensity: f32) -> LightHandle {
        self.lights.create(position, color, intensity)
    }

    pub fn light(&self, handle: LightHandle) -> Option<&crate::resource::Light> {
        self.lights.get(handle)
    }

    /// Move a light between frames
    pub fn set_light_position(&mut self, handle: LightHandle, position: Vec3) -> Result<()> {
        if !self.lights.set_position(handle, position) {
            render_bail!(
                "ember::Renderer",
                ResourceNotFound,
                "light {} does not exist",
                handle.index()
            );
        }
        Ok(())
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    // ===== FRAME =====

    /// Draw one frame: geometry pass, shadow pass, lighting pass.
    ///
    /// `screen` is the current window size and `time` the caller's clock;
    /// both are plain inputs, so repeated calls with unchanged state issue an
    /// identical command sequence.
    pub fn draw(&mut self, camera: &Camera, screen: (u32, u32), time: f32) -> FrameStats {
        let matrices = camera.matrices();
        let Self {
            device,
            shaders,
            meshes,
            textures,
            lights,
            pipeline,
            ..
        } = self;
        pipeline.draw(
            device.as_mut(),
            shaders,
            meshes,
            textures,
            lights,
            &matrices,
            camera.transform.position,
            screen,
            time,
        )
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let Self {
            device,
            shaders,
            textures,
            pipeline,
            ..
        } = self;
        pipeline.destroy(device.as_mut());
        for program in shaders.iter() {
            program.destroy(device.as_mut());
        }
        textures.destroy_all(device.as_mut());
        render_info!("ember::Renderer", "renderer shut down");
    }
}

// ===== BUILT-IN SHADER DESCRIPTORS =====

fn uniform(scalar: ShaderScalar, components: u32, name: &str) -> ShaderUniform {
    ShaderUniform {
        scalar,
        components,
        name: name.to_string(),
    }
}

/// Default geometry shader: position/uv/normal inputs, material color plus
/// albedo/normal/specular texture slots
fn default_shader_descriptor() -> ShaderDescriptor {
    ShaderDescriptor {
        stages: vec![ShaderStageKind::Vertex, ShaderStageKind::Fragment],
        starting_stage: ShaderStageKind::Vertex,
        inputs: vec![
            ShaderInput { scalar: ShaderScalar::F32, components: 3 },
            ShaderInput { scalar: ShaderScalar::F32, components: 2 },
            ShaderInput { scalar: ShaderScalar::F32, components: 3 },
        ],
        uniforms: vec![
            uniform(ShaderScalar::F32, 3, "unif_material_color"),
            uniform(ShaderScalar::Texture, 1, "unif_texture_albedo"),
            uniform(ShaderScalar::Texture, 1, "unif_texture_normal"),
            uniform(ShaderScalar::Texture, 1, "unif_texture_specular"),
            uniform(ShaderScalar::Mat4x4, 1, "unif_mvp"),
        ],
        texture_attachments: vec![
            TextureAttachment { role: TextureRole::Albedo, uniform: "unif_texture_albedo".to_string() },
            TextureAttachment { role: TextureRole::Normal, uniform: "unif_texture_normal".to_string() },
            TextureAttachment { role: TextureRole::Specular, uniform: "unif_texture_specular".to_string() },
        ],
    }
}

/// Lighting pass shader: clip-space quad input, G-buffer samplers
fn light_pass_descriptor() -> ShaderDescriptor {
    ShaderDescriptor {
        stages: vec![ShaderStageKind::Vertex, ShaderStageKind::Fragment],
        starting_stage: ShaderStageKind::Vertex,
        inputs: vec![ShaderInput { scalar: ShaderScalar::F32, components: 2 }],
        uniforms: vec![
            uniform(ShaderScalar::Texture, 1, "unif_gbuffer_geometry"),
            uniform(ShaderScalar::Texture, 1, "unif_gbuffer_normal"),
            uniform(ShaderScalar::Texture, 1, "unif_gbuffer_albedo_specular"),
            uniform(ShaderScalar::Texture, 1, "unif_gbuffer_shadows"),
            uniform(ShaderScalar::F32, 2, "unif_screen"),
        ],
        texture_attachments: vec![],
    }
}

/// Shadow depth shader: mesh-compatible inputs, light matrices only
fn shadow_depth_descriptor() -> ShaderDescriptor {
    ShaderDescriptor {
        stages: vec![ShaderStageKind::Vertex, ShaderStageKind::Fragment],
        starting_stage: ShaderStageKind::Vertex,
        inputs: vec![
            ShaderInput { scalar: ShaderScalar::F32, components: 3 },
            ShaderInput { scalar: ShaderScalar::F32, components: 2 },
            ShaderInput { scalar: ShaderScalar::F32, components: 3 },
        ],
        uniforms: vec![
            uniform(ShaderScalar::Mat4x4, 1, "unif_light_vp"),
            uniform(ShaderScalar::Mat4x4, 1, "unif_model"),
        ],
        texture_attachments: vec![],
    }
}

/// Shadow composite shader: adds the camera matrix and the depth sampler
fn shadow_composite_descriptor() -> ShaderDescriptor {
    ShaderDescriptor {
        stages: vec![ShaderStageKind::Vertex, ShaderStageKind::Fragment],
        starting_stage: ShaderStageKind::Vertex,
        inputs: vec![
            ShaderInput { scalar: ShaderScalar::F32, components: 3 },
            ShaderInput { scalar: ShaderScalar::F32, components: 2 },
            ShaderInput { scalar: ShaderScalar::F32, components: 3 },
        ],
        uniforms: vec![
            uniform(ShaderScalar::Mat4x4, 1, "unif_light_vp"),
            uniform(ShaderScalar::Mat4x4, 1, "unif_model"),
            uniform(ShaderScalar::Mat4x4, 1, "unif_vp"),
            uniform(ShaderScalar::Texture, 1, "unif_shadow_depth"),
        ],
        texture_attachments: vec![],
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
