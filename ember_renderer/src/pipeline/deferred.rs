//! Deferred draw orchestrator.
//!
//! Owns the offscreen GPU objects of the deferred pipeline: the G-buffer
//! (position / normal / albedo-specular / shadow-accumulation targets plus
//! depth) and the shadow map. Executes the per-frame pass sequence:
//!
//! 1. geometry pass into the G-buffer
//! 2. shadow pass: depth from each light, then shadow compositing
//! 3. screen-space lighting pass resolving to the default framebuffer
//!
//! The orchestrator owns no mesh/texture/light data; it borrows the
//! registries each frame. Per-draw uniform failures are logged, counted and
//! skipped; a partially drawn frame beats an aborted one.

use glam::Vec3;

use crate::camera::CameraMatrices;
use crate::device::{
    ClearMask, FramebufferId, GraphicsDevice, ShaderScalar, TargetFormat, TextureId,
};
use crate::error::Result;
use crate::render_warn;
use crate::renderer::RendererConfig;
use crate::resource::{LightRegistry, MeshRegistry, TextureRegistry};
use crate::shader::{ShaderHandle, ShaderProgram};

/// Full-screen triangle-strip quad, clip-space XY
const QUAD_VERTICES: [f32; 8] = [-1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0];
const QUAD_VERTEX_COUNT: u32 = 4;

/// Per-frame outcome counters returned by `draw`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Meshes drawn in the geometry pass
    pub meshes_drawn: u32,
    /// Meshes skipped for having no drawable uploaded range
    pub meshes_skipped: u32,
    /// Uniform sets that failed and were skipped, across all passes
    pub uniform_errors: u32,
}

/// The G-buffer: one framebuffer with four color targets plus depth
struct GBuffer {
    framebuffer: FramebufferId,
    position: TextureId,
    normal: TextureId,
    albedo_specular: TextureId,
    shadows: TextureId,
    depth: TextureId,
}

/// Depth-from-light render target
struct ShadowMap {
    framebuffer: FramebufferId,
    depth_texture: TextureId,
    size: u32,
}

/// Ids created while building the offscreen targets, for cleanup on failure
#[derive(Default)]
struct CreatedIds {
    textures: Vec<TextureId>,
    framebuffers: Vec<FramebufferId>,
}

impl CreatedIds {
    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for framebuffer in self.framebuffers.drain(..) {
            device.destroy_framebuffer(framebuffer);
        }
        for texture in self.textures.drain(..) {
            device.destroy_texture(texture);
        }
    }
}

/// The deferred pipeline state: offscreen targets and pass shader handles
pub struct DeferredPipeline {
    gbuffer: GBuffer,
    shadow_map: ShadowMap,
    light_shader: ShaderHandle,
    depth_shader: ShaderHandle,
    composite_shader: ShaderHandle,
    surface_width: u32,
    surface_height: u32,
}

impl DeferredPipeline {
    /// Build the offscreen targets and stage the full-screen quad into the
    /// light-pass shader's vertex buffer.
    pub(crate) fn new(
        device: &mut dyn GraphicsDevice,
        config: &RendererConfig,
        shaders: &mut [ShaderProgram],
        light_shader: ShaderHandle,
        depth_shader: ShaderHandle,
        composite_shader: ShaderHandle,
    ) -> Result<Self> {
        let mut created = CreatedIds::default();
        let targets = Self::build_targets(device, config, &mut created);
        let (gbuffer, shadow_map) = match targets {
            Ok(targets) => targets,
            Err(error) => {
                created.destroy(device);
                return Err(error);
            }
        };

        if let Some(light_program) = shaders.get_mut(light_shader.index() as usize) {
            device.write_buffer(
                crate::device::BufferTarget::Vertex,
                light_program.vertex_buffer_id(),
                0,
                bytemuck::cast_slice(&QUAD_VERTICES),
            );
            light_program.reserve_vertices(QUAD_VERTEX_COUNT);
        }

        Ok(Self {
            gbuffer,
            shadow_map,
            light_shader,
            depth_shader,
            composite_shader,
            surface_width: config.surface_width,
            surface_height: config.surface_height,
        })
    }

    fn build_targets(
        device: &mut dyn GraphicsDevice,
        config: &RendererConfig,
        created: &mut CreatedIds,
    ) -> Result<(GBuffer, ShadowMap)> {
        let width = config.surface_width;
        let height = config.surface_height;

        let target = |device: &mut dyn GraphicsDevice,
                      created: &mut CreatedIds,
                      w: u32,
                      h: u32,
                      format: TargetFormat|
         -> Result<TextureId> {
            let texture = device.create_target_texture(w, h, format)?;
            created.textures.push(texture);
            Ok(texture)
        };

        // G-buffer: 4 color targets + depth
        let framebuffer = device.create_framebuffer()?;
        created.framebuffers.push(framebuffer);

        let position = target(device, created, width, height, TargetFormat::Rgba16Float)?;
        let normal = target(device, created, width, height, TargetFormat::Rgba16Float)?;
        let albedo_specular = target(device, created, width, height, TargetFormat::Rgba16Float)?;
        let shadows = target(device, created, width, height, TargetFormat::R32Float)?;
        let depth = target(device, created, width, height, TargetFormat::Depth32Float)?;

        device.attach_color_target(framebuffer, 0, position);
        device.attach_color_target(framebuffer, 1, normal);
        device.attach_color_target(framebuffer, 2, albedo_specular);
        device.attach_color_target(framebuffer, 3, shadows);
        device.attach_depth_target(framebuffer, depth);
        device.set_color_target_count(framebuffer, 4);

        // Shadow map: depth-only framebuffer at fixed resolution
        let shadow_framebuffer = device.create_framebuffer()?;
        created.framebuffers.push(shadow_framebuffer);

        let shadow_depth = target(
            device,
            created,
            config.shadow_map_size,
            config.shadow_map_size,
            TargetFormat::Depth32Float,
        )?;
        device.attach_depth_target(shadow_framebuffer, shadow_depth);
        device.set_color_target_count(shadow_framebuffer, 0);

        Ok((
            GBuffer {
                framebuffer,
                position,
                normal,
                albedo_specular,
                shadows,
                depth,
            },
            ShadowMap {
                framebuffer: shadow_framebuffer,
                depth_texture: shadow_depth,
                size: config.shadow_map_size,
            },
        ))
    }

    /// Release every GPU object the pipeline owns
    pub(crate) fn destroy(&self, device: &mut dyn GraphicsDevice) {
        device.destroy_framebuffer(self.gbuffer.framebuffer);
        device.destroy_texture(self.gbuffer.position);
        device.destroy_texture(self.gbuffer.normal);
        device.destroy_texture(self.gbuffer.albedo_specular);
        device.destroy_texture(self.gbuffer.shadows);
        device.destroy_texture(self.gbuffer.depth);
        device.destroy_framebuffer(self.shadow_map.framebuffer);
        device.destroy_texture(self.shadow_map.depth_texture);
    }

    /// Execute one frame: geometry pass, shadow pass, lighting pass.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn draw(
        &self,
        device: &mut dyn GraphicsDevice,
        shaders: &[ShaderProgram],
        meshes: &MeshRegistry,
        textures: &TextureRegistry,
        lights: &LightRegistry,
        camera: &CameraMatrices,
        view_position: Vec3,
        screen: (u32, u32),
        time: f32,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        self.geometry_pass(device, shaders, meshes, textures, camera, &mut stats);
        self.shadow_pass(device, shaders, meshes, lights, camera, &mut stats);
        self.lighting_pass(device, shaders, view_position, screen, time, &mut stats);
        stats
    }

    // ===== GEOMETRY PASS =====

    fn geometry_pass(
        &self,
        device: &mut dyn GraphicsDevice,
        shaders: &[ShaderProgram],
        meshes: &MeshRegistry,
        textures: &TextureRegistry,
        camera: &CameraMatrices,
        stats: &mut FrameStats,
    ) {
        device.bind_framebuffer(Some(self.gbuffer.framebuffer));
        device.set_viewport(self.surface_width, self.surface_height);
        device.set_depth_test(true);
        device.set_depth_write(true);
        device.clear(ClearMask::COLOR | ClearMask::DEPTH);

        for mesh in meshes.iter() {
            let Some(program) = shaders.get(mesh.shader().index() as usize) else {
                stats.meshes_skipped += 1;
                continue;
            };
            let range = mesh.range();
            if !program.range_drawable(range) {
                stats.meshes_skipped += 1;
                continue;
            }

            device.use_program(program.program_id());

            let model = mesh.transform.model_matrix();
            let rotation = mesh.transform.rotation_matrix();
            let mvp = camera.view_projection * model;

            set_raw(device, program, "unif_model_rotation", bytemuck::bytes_of(&rotation), ShaderScalar::Mat4x4, stats);
            set_raw(device, program, "unif_mvp", bytemuck::bytes_of(&mvp), ShaderScalar::Mat4x4, stats);
            set_raw(device, program, "unif_model", bytemuck::bytes_of(&model), ShaderScalar::Mat4x4, stats);
            set_declared(device, program, "unif_material_color", bytemuck::bytes_of(&mesh.material.color), stats);

            // material textures in declared attachment order; missing slots
            // get the "no texture" sampler value
            for (slot, attachment) in program.texture_attachments().iter().enumerate() {
                let handle = mesh.material.textures.get(slot);
                let device_id = handle.and_then(|handle| textures.device_id(*handle));
                match device_id {
                    Some(texture) => {
                        device.bind_texture(slot as u32, texture);
                        let unit = slot as i32;
                        set_declared(device, program, &attachment.uniform, bytemuck::bytes_of(&unit), stats);
                    }
                    None => {
                        if handle.is_some() {
                            stats.uniform_errors += 1;
                            render_warn!(
                                "ember::DeferredPipeline",
                                "material slot {} names an unknown texture, drawing unbound",
                                slot
                            );
                        }
                        let no_texture = -1i32;
                        set_declared(device, program, &attachment.uniform, bytemuck::bytes_of(&no_texture), stats);
                    }
                }
            }

            device.bind_geometry(
                program.vertex_array_id(),
                program.vertex_buffer_id(),
                program.index_buffer_id(),
            );
            device.draw_indexed(range.index_offset, range.index_count);
            stats.meshes_drawn += 1;
        }
    }

    // ===== SHADOW PASS =====

    fn shadow_pass(
        &self,
        device: &mut dyn GraphicsDevice,
        shaders: &[ShaderProgram],
        meshes: &MeshRegistry,
        lights: &LightRegistry,
        camera: &CameraMatrices,
        stats: &mut FrameStats,
    ) {
        let Some(depth_program) = shaders.get(self.depth_shader.index() as usize) else {
            return;
        };
        let Some(composite_program) = shaders.get(self.composite_shader.index() as usize) else {
            return;
        };

        // depth from each light into the shadow map
        device.bind_framebuffer(Some(self.shadow_map.framebuffer));
        device.set_viewport(self.shadow_map.size, self.shadow_map.size);
        device.set_depth_test(true);
        device.set_depth_write(true);
        device.clear(ClearMask::DEPTH);
        device.use_program(depth_program.program_id());

        self.each_shadow_draw(device, shaders, meshes, lights, |device, model, light_vp| {
            set_declared(device, depth_program, "unif_light_vp", bytemuck::bytes_of(light_vp), stats);
            set_declared(device, depth_program, "unif_model", bytemuck::bytes_of(model), stats);
        });

        // composite shadow attenuation into the G-buffer, depth writes off
        device.bind_framebuffer(Some(self.gbuffer.framebuffer));
        device.set_viewport(self.surface_width, self.surface_height);
        device.set_depth_write(false);
        device.use_program(composite_program.program_id());

        let shadow_texture = self.shadow_map.depth_texture;
        let view_projection = camera.view_projection;
        self.each_shadow_draw(device, shaders, meshes, lights, |device, model, light_vp| {
            set_declared(device, composite_program, "unif_light_vp", bytemuck::bytes_of(light_vp), stats);
            set_declared(device, composite_program, "unif_model", bytemuck::bytes_of(model), stats);
            set_declared(device, composite_program, "unif_vp", bytemuck::bytes_of(&view_projection), stats);
            device.bind_texture(0, shadow_texture);
            let unit = 0i32;
            set_declared(device, composite_program, "unif_shadow_depth", bytemuck::bytes_of(&unit), stats);
        });
    }

    /// Iterate meshes × lights, binding each mesh's geometry and drawing its
    /// range after `set_uniforms` has prepared the pass-specific state.
    fn each_shadow_draw(
        &self,
        device: &mut dyn GraphicsDevice,
        shaders: &[ShaderProgram],
        meshes: &MeshRegistry,
        lights: &LightRegistry,
        mut set_uniforms: impl FnMut(&mut dyn GraphicsDevice, &glam::Mat4, &glam::Mat4),
    ) {
        for mesh in meshes.iter() {
            let Some(mesh_program) = shaders.get(mesh.shader().index() as usize) else {
                continue;
            };
            let range = mesh.range();
            if !mesh_program.range_drawable(range) {
                continue;
            }

            let model = mesh.transform.model_matrix();
            for light in lights.iter() {
                let light_vp = light.view_projection();
                set_uniforms(device, &model, &light_vp);
                device.bind_geometry(
                    mesh_program.vertex_array_id(),
                    mesh_program.vertex_buffer_id(),
                    mesh_program.index_buffer_id(),
                );
                device.draw_indexed(range.index_offset, range.index_count);
            }
        }
    }

    // ===== LIGHTING PASS =====

    fn lighting_pass(
        &self,
        device: &mut dyn GraphicsDevice,
        shaders: &[ShaderProgram],
        view_position: Vec3,
        screen: (u32, u32),
        time: f32,
        stats: &mut FrameStats,
    ) {
        let Some(light_program) = shaders.get(self.light_shader.index() as usize) else {
            return;
        };

        device.bind_framebuffer(None);
        device.set_viewport(screen.0, screen.1);
        device.set_depth_test(false);
        device.set_depth_write(false);
        device.clear(ClearMask::COLOR | ClearMask::DEPTH);
        device.use_program(light_program.program_id());

        let screen_size = [screen.0 as f32, screen.1 as f32];
        set_declared(device, light_program, "unif_screen", bytemuck::cast_slice(&screen_size), stats);

        let bindings = [
            (self.gbuffer.position, "unif_gbuffer_geometry"),
            (self.gbuffer.normal, "unif_gbuffer_normal"),
            (self.gbuffer.albedo_specular, "unif_gbuffer_albedo_specular"),
            (self.gbuffer.shadows, "unif_gbuffer_shadows"),
        ];
        for (unit, (texture, name)) in bindings.iter().enumerate() {
            device.bind_texture(unit as u32, *texture);
            let slot = unit as i32;
            set_declared(device, light_program, name, bytemuck::bytes_of(&slot), stats);
        }

        set_raw(device, light_program, "unif_view_pos", bytemuck::bytes_of(&view_position), ShaderScalar::F32, stats);
        set_raw(device, light_program, "unif_time", bytemuck::bytes_of(&time), ShaderScalar::F32, stats);

        device.bind_geometry(
            light_program.vertex_array_id(),
            light_program.vertex_buffer_id(),
            light_program.index_buffer_id(),
        );
        device.draw_strip(0, QUAD_VERTEX_COUNT);
    }
}

// ===== SOFT UNIFORM HELPERS =====

/// Set a declared uniform; failures are logged, counted and skipped.
fn set_declared(
    device: &mut dyn GraphicsDevice,
    program: &ShaderProgram,
    name: &str,
    data: &[u8],
    stats: &mut FrameStats,
) {
    if let Err(code) = program.set_uniform(device, name, data) {
        stats.uniform_errors += 1;
        render_warn!(
            "ember::DeferredPipeline",
            "uniform '{}' skipped: {:?}",
            name,
            code
        );
    }
}

/// Set an untracked uniform; failures are logged, counted and skipped.
fn set_raw(
    device: &mut dyn GraphicsDevice,
    program: &ShaderProgram,
    name: &str,
    data: &[u8],
    scalar: ShaderScalar,
    stats: &mut FrameStats,
) {
    if let Err(code) = program.set_uniform_raw(device, name, data, scalar) {
        stats.uniform_errors += 1;
        render_warn!(
            "ember::DeferredPipeline",
            "uniform '{}' skipped: {:?}",
            name,
            code
        );
    }
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;
