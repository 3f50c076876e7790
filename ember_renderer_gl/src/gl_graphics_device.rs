//! GlGraphicsDevice - OpenGL implementation of the GraphicsDevice trait
//!
//! A thin 1:1 mapping of the device operations onto `glow` calls. GPU objects
//! are kept in id → native-object tables; the integer ids crossing the trait
//! boundary never leave this crate's control. All logic (validation, cursor
//! management, pass ordering) lives in `ember_renderer`; this file only
//! translates.

use glow::HasContext;
use rustc_hash::FxHashMap;

use ember_renderer::device::{
    BufferId, BufferTarget, ClearMask, FramebufferId, GraphicsDevice, ProgramId, ShaderStageKind,
    StageId, TargetFormat, TextureId, TextureUpload, UniformLocationId, UniformValue,
    VertexArrayId, VertexAttribute,
};
use ember_renderer::{render_err, render_warn, Error, Result};

use crate::gl_format;

const SOURCE: &str = "ember::gl::Device";

/// OpenGL device over a caller-owned context
pub struct GlGraphicsDevice {
    gl: glow::Context,

    stages: FxHashMap<u32, glow::NativeShader>,
    programs: FxHashMap<u32, glow::NativeProgram>,
    buffers: FxHashMap<u32, glow::NativeBuffer>,
    vertex_arrays: FxHashMap<u32, glow::NativeVertexArray>,
    textures: FxHashMap<u32, glow::NativeTexture>,
    framebuffers: FxHashMap<u32, glow::NativeFramebuffer>,

    /// Interned uniform locations, addressed by UniformLocationId
    locations: Vec<glow::NativeUniformLocation>,
    location_cache: FxHashMap<(u32, String), u32>,

    next_id: u32,
}

impl GlGraphicsDevice {
    /// Create a device over an existing, current GL context.
    ///
    /// Applies the fixed state the renderer assumes: counter-clockwise front
    /// faces, back-face cull mode, depth testing enabled.
    ///
    /// # Safety
    ///
    /// The loader must come from a live context that stays current on the
    /// calling thread for the device's whole lifetime.
    pub unsafe fn from_loader(
        loader: impl FnMut(&str) -> *const std::ffi::c_void,
    ) -> Self {
        let gl = glow::Context::from_loader_function(loader);

        gl.front_face(glow::CCW);
        gl.cull_face(glow::BACK);
        gl.enable(glow::DEPTH_TEST);

        Self {
            gl,
            stages: FxHashMap::default(),
            programs: FxHashMap::default(),
            buffers: FxHashMap::default(),
            vertex_arrays: FxHashMap::default(),
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            locations: Vec::new(),
            location_cache: FxHashMap::default(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn buffer_target_to_gl(target: BufferTarget) -> u32 {
        match target {
            BufferTarget::Vertex => glow::ARRAY_BUFFER,
            BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

impl GraphicsDevice for GlGraphicsDevice {
    fn create_shader_stage(&mut self, kind: ShaderStageKind, source: &str) -> Result<StageId> {
        let shader = unsafe {
            let shader = self
                .gl
                .create_shader(gl_format::shader_stage_to_gl(kind))
                .map_err(Error::Backend)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(render_err!(
                    SOURCE,
                    CompileOrLink,
                    "{:?} stage compilation failed:\n{}",
                    kind,
                    log
                ));
            }
            shader
        };

        let id = self.next_id();
        self.stages.insert(id, shader);
        Ok(StageId(id))
    }

    fn destroy_shader_stage(&mut self, stage: StageId) {
        if let Some(shader) = self.stages.remove(&stage.0) {
            unsafe { self.gl.delete_shader(shader) };
        }
    }

    fn create_program(&mut self, stages: &[StageId]) -> Result<ProgramId> {
        let mut native_stages = Vec::with_capacity(stages.len());
        for stage in stages {
            match self.stages.get(&stage.0) {
                Some(&shader) => native_stages.push(shader),
                None => {
                    return Err(render_err!(
                        SOURCE,
                        Backend,
                        "unknown shader stage {}",
                        stage.0
                    ))
                }
            }
        }

        let program = unsafe {
            let program = self.gl.create_program().map_err(Error::Backend)?;
            for &shader in &native_stages {
                self.gl.attach_shader(program, shader);
            }
            self.gl.link_program(program);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(render_err!(
                    SOURCE,
                    CompileOrLink,
                    "program link failed:\n{}",
                    log
                ));
            }
            for &shader in &native_stages {
                self.gl.detach_shader(program, shader);
            }
            program
        };

        let id = self.next_id();
        self.programs.insert(id, program);
        Ok(ProgramId(id))
    }

    fn destroy_program(&mut self, program: ProgramId) {
        if let Some(native) = self.programs.remove(&program.0) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        let Some(&native) = self.programs.get(&program.0) else {
            render_warn!(SOURCE, "use_program on unknown program {}", program.0);
            return;
        };
        unsafe { self.gl.use_program(Some(native)) };
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocationId> {
        let key = (program.0, name.to_string());
        if let Some(&index) = self.location_cache.get(&key) {
            return Some(UniformLocationId(index));
        }

        let &native = self.programs.get(&program.0)?;
        let location = unsafe { self.gl.get_uniform_location(native, name) }?;

        let index = self.locations.len() as u32;
        self.locations.push(location);
        self.location_cache.insert(key, index);
        Some(UniformLocationId(index))
    }

    fn set_uniform(&mut self, location: UniformLocationId, value: UniformValue<'_>) {
        let Some(native) = self.locations.get(location.0 as usize) else {
            render_warn!(SOURCE, "set_uniform on unknown location {}", location.0);
            return;
        };
        let location = Some(native);
        unsafe {
            match value {
                UniformValue::F32(x) => self.gl.uniform_1_f32(location, x),
                UniformValue::F32x2([x, y]) => self.gl.uniform_2_f32(location, x, y),
                UniformValue::F32x3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::F32x4([x, y, z, w]) => self.gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::F32Slice(values) => self.gl.uniform_1_f32_slice(location, values),
                UniformValue::S32(x) => self.gl.uniform_1_i32(location, x),
                UniformValue::S32x2([x, y]) => self.gl.uniform_2_i32(location, x, y),
                UniformValue::S32x3([x, y, z]) => self.gl.uniform_3_i32(location, x, y, z),
                UniformValue::S32x4([x, y, z, w]) => self.gl.uniform_4_i32(location, x, y, z, w),
                UniformValue::S32Slice(values) => self.gl.uniform_1_i32_slice(location, values),
                UniformValue::U32(x) => self.gl.uniform_1_u32(location, x),
                UniformValue::U32x2([x, y]) => self.gl.uniform_2_u32(location, x, y),
                UniformValue::U32x3([x, y, z]) => self.gl.uniform_3_u32(location, x, y, z),
                UniformValue::U32x4([x, y, z, w]) => self.gl.uniform_4_u32(location, x, y, z, w),
                UniformValue::U32Slice(values) => self.gl.uniform_1_u32_slice(location, values),
                UniformValue::Mat4(matrix) => {
                    self.gl.uniform_matrix_4_f32_slice(location, false, matrix)
                }
            }
        }
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId> {
        let vertex_array = unsafe { self.gl.create_vertex_array().map_err(Error::Backend)? };
        let id = self.next_id();
        self.vertex_arrays.insert(id, vertex_array);
        Ok(VertexArrayId(id))
    }

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if let Some(native) = self.vertex_arrays.remove(&vertex_array.0) {
            unsafe { self.gl.delete_vertex_array(native) };
        }
    }

    fn create_buffer(&mut self, target: BufferTarget, capacity_bytes: usize) -> Result<BufferId> {
        let gl_target = Self::buffer_target_to_gl(target);
        let buffer = unsafe {
            let buffer = self.gl.create_buffer().map_err(Error::Backend)?;
            self.gl.bind_buffer(gl_target, Some(buffer));
            self.gl
                .buffer_data_size(gl_target, capacity_bytes as i32, glow::DYNAMIC_DRAW);
            buffer
        };
        let id = self.next_id();
        self.buffers.insert(id, buffer);
        Ok(BufferId(id))
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if let Some(native) = self.buffers.remove(&buffer.0) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn write_buffer(
        &mut self,
        target: BufferTarget,
        buffer: BufferId,
        offset_bytes: usize,
        data: &[u8],
    ) {
        let Some(&native) = self.buffers.get(&buffer.0) else {
            render_warn!(SOURCE, "write_buffer on unknown buffer {}", buffer.0);
            return;
        };
        let gl_target = Self::buffer_target_to_gl(target);
        unsafe {
            self.gl.bind_buffer(gl_target, Some(native));
            self.gl
                .buffer_sub_data_u8_slice(gl_target, offset_bytes as i32, data);
        }
    }

    fn configure_vertex_layout(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        attributes: &[VertexAttribute],
    ) {
        let (Some(&vao), Some(&vbo), Some(&ibo)) = (
            self.vertex_arrays.get(&vertex_array.0),
            self.buffers.get(&vertex_buffer.0),
            self.buffers.get(&index_buffer.0),
        ) else {
            render_warn!(SOURCE, "configure_vertex_layout on unknown objects");
            return;
        };

        unsafe {
            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));

            for attribute in attributes {
                let Some(component_type) = gl_format::attribute_type_to_gl(attribute.scalar)
                else {
                    render_warn!(
                        SOURCE,
                        "attribute {} has non-attribute scalar {:?}, skipping",
                        attribute.location,
                        attribute.scalar
                    );
                    continue;
                };
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components as i32,
                    component_type,
                    false,
                    attribute.stride as i32,
                    attribute.offset as i32,
                );
                self.gl.enable_vertex_attrib_array(attribute.location);
            }

            self.gl.bind_vertex_array(None);
        }
    }

    fn bind_geometry(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
    ) {
        let (Some(&vao), Some(&vbo), Some(&ibo)) = (
            self.vertex_arrays.get(&vertex_array.0),
            self.buffers.get(&vertex_buffer.0),
            self.buffers.get(&index_buffer.0),
        ) else {
            render_warn!(SOURCE, "bind_geometry on unknown objects");
            return;
        };
        unsafe {
            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        }
    }

    fn draw_indexed(&mut self, first_index: u32, index_count: u32) {
        unsafe {
            self.gl.draw_elements(
                glow::TRIANGLES,
                index_count as i32,
                glow::UNSIGNED_INT,
                (first_index * 4) as i32,
            );
        }
    }

    fn draw_strip(&mut self, first_vertex: u32, vertex_count: u32) {
        unsafe {
            self.gl
                .draw_arrays(glow::TRIANGLE_STRIP, first_vertex as i32, vertex_count as i32);
        }
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureId> {
        let texture = unsafe {
            let texture = self.gl.create_texture().map_err(Error::Backend)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));

            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                gl_format::filter_to_gl_min(upload.filter),
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                gl_format::filter_to_gl_mag(upload.filter),
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                gl_format::wrap_to_gl(upload.wrap),
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                gl_format::wrap_to_gl(upload.wrap),
            );

            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                upload.width as i32,
                upload.height as i32,
                0,
                gl_format::pixel_format_to_gl(upload.format),
                glow::UNSIGNED_BYTE,
                Some(upload.pixels),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };

        let id = self.next_id();
        self.textures.insert(id, texture);
        Ok(TextureId(id))
    }

    fn create_target_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TargetFormat,
    ) -> Result<TextureId> {
        let (internal_format, transfer_format, component_type) =
            gl_format::target_format_to_gl(format);

        let texture = unsafe {
            let texture = self.gl.create_texture().map_err(Error::Backend)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
            if format == TargetFormat::Depth32Float {
                self.gl.tex_parameter_i32(
                    glow::TEXTURE_2D,
                    glow::TEXTURE_WRAP_S,
                    glow::REPEAT as i32,
                );
                self.gl.tex_parameter_i32(
                    glow::TEXTURE_2D,
                    glow::TEXTURE_WRAP_T,
                    glow::REPEAT as i32,
                );
            }
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal_format,
                width as i32,
                height as i32,
                0,
                transfer_format,
                component_type,
                None,
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };

        let id = self.next_id();
        self.textures.insert(id, texture);
        Ok(TextureId(id))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if let Some(native) = self.textures.remove(&texture.0) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        let Some(&native) = self.textures.get(&texture.0) else {
            render_warn!(SOURCE, "bind_texture on unknown texture {}", texture.0);
            return;
        };
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native));
        }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        let framebuffer = unsafe { self.gl.create_framebuffer().map_err(Error::Backend)? };
        let id = self.next_id();
        self.framebuffers.insert(id, framebuffer);
        Ok(FramebufferId(id))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(native) = self.framebuffers.remove(&framebuffer.0) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn attach_color_target(&mut self, framebuffer: FramebufferId, slot: u32, texture: TextureId) {
        let (Some(&fb), Some(&tex)) = (
            self.framebuffers.get(&framebuffer.0),
            self.textures.get(&texture.0),
        ) else {
            render_warn!(SOURCE, "attach_color_target on unknown objects");
            return;
        };
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fb));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0 + slot,
                glow::TEXTURE_2D,
                Some(tex),
                0,
            );
        }
    }

    fn attach_depth_target(&mut self, framebuffer: FramebufferId, texture: TextureId) {
        let (Some(&fb), Some(&tex)) = (
            self.framebuffers.get(&framebuffer.0),
            self.textures.get(&texture.0),
        ) else {
            render_warn!(SOURCE, "attach_depth_target on unknown objects");
            return;
        };
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fb));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::TEXTURE_2D,
                Some(tex),
                0,
            );
        }
    }

    fn set_color_target_count(&mut self, framebuffer: FramebufferId, count: u32) {
        let Some(&fb) = self.framebuffers.get(&framebuffer.0) else {
            render_warn!(SOURCE, "set_color_target_count on unknown framebuffer");
            return;
        };
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fb));
            if count == 0 {
                self.gl.draw_buffers(&[glow::NONE]);
            } else {
                let attachments: Vec<u32> =
                    (0..count).map(|slot| glow::COLOR_ATTACHMENT0 + slot).collect();
                self.gl.draw_buffers(&attachments);
            }
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        match framebuffer {
            Some(id) => {
                let Some(&fb) = self.framebuffers.get(&id.0) else {
                    render_warn!(SOURCE, "bind_framebuffer on unknown framebuffer {}", id.0);
                    return;
                };
                unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fb)) };
            }
            None => unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, None) },
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { self.gl.clear(bits) };
    }

    fn set_depth_test(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn set_depth_write(&mut self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) };
    }
}
