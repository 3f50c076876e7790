//! Mock graphics device for unit tests (no GPU required)
//!
//! Records every operation as a command string into a shared journal so tests
//! can assert on the exact sequence the renderer issued. Ids are sequential,
//! live ids are tracked per resource kind for leak assertions, and failure
//! knobs let tests force compile/link failures or unresolved uniforms.

use std::cell::RefCell;
use std::rc::Rc;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use super::{
    BufferId, BufferTarget, ClearMask, FramebufferId, GraphicsDevice, ProgramId, ShaderStageKind,
    StageId, TargetFormat, TextureId, TextureUpload, UniformLocationId, UniformValue,
    VertexArrayId, VertexAttribute,
};

/// Everything the mock observed, shared with the test via `Rc<RefCell<..>>`
#[derive(Debug, Default)]
pub struct MockJournal {
    /// Flat command log, one entry per device call
    pub commands: Vec<String>,

    /// Live (created, not yet destroyed) ids per resource kind
    pub live_stages: FxHashSet<u32>,
    pub live_programs: FxHashSet<u32>,
    pub live_buffers: FxHashSet<u32>,
    pub live_vertex_arrays: FxHashSet<u32>,
    pub live_textures: FxHashSet<u32>,
    pub live_framebuffers: FxHashSet<u32>,

    /// (target, buffer, offset_bytes, len_bytes) per write_buffer call
    pub buffer_writes: Vec<(BufferTarget, u32, usize, usize)>,

    /// Decoded u32 payloads of index-buffer writes, in call order
    pub index_data_writes: Vec<Vec<u32>>,

    /// (first_index, index_count) per draw_indexed call
    pub indexed_draws: Vec<(u32, u32)>,

    /// (first_vertex, vertex_count) per draw_strip call
    pub strip_draws: Vec<(u32, u32)>,

    // ===== FAILURE KNOBS =====
    /// Fail the next create_shader_stage calls with this log
    pub fail_compile: Option<String>,
    /// Fail the next create_program calls with this log
    pub fail_link: Option<String>,
    /// Uniform names that resolve to no location
    pub unresolved_uniforms: FxHashSet<String>,
}

impl MockJournal {
    /// Total number of live GPU objects across every kind
    pub fn live_total(&self) -> usize {
        self.live_stages.len()
            + self.live_programs.len()
            + self.live_buffers.len()
            + self.live_vertex_arrays.len()
            + self.live_textures.len()
            + self.live_framebuffers.len()
    }
}

/// Recording implementation of [`GraphicsDevice`]
pub struct MockGraphicsDevice {
    journal: Rc<RefCell<MockJournal>>,
    next_id: u32,
    /// Interned uniform locations, stable across repeated queries
    locations: FxHashMap<(u32, String), u32>,
    next_location: u32,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            journal: Rc::new(RefCell::new(MockJournal::default())),
            next_id: 0,
            locations: FxHashMap::default(),
            next_location: 0,
        }
    }

    /// Shared handle onto the journal; keep a clone before boxing the device
    pub fn journal(&self) -> Rc<RefCell<MockJournal>> {
        Rc::clone(&self.journal)
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&self, command: String) {
        self.journal.borrow_mut().commands.push(command);
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_shader_stage(&mut self, kind: ShaderStageKind, _source: &str) -> Result<StageId> {
        if let Some(log) = self.journal.borrow().fail_compile.clone() {
            return Err(Error::CompileOrLink(log));
        }
        let id = self.next_id();
        self.journal.borrow_mut().live_stages.insert(id);
        self.record(format!("create_shader_stage {:?} -> {}", kind, id));
        Ok(StageId(id))
    }

    fn destroy_shader_stage(&mut self, stage: StageId) {
        self.journal.borrow_mut().live_stages.remove(&stage.0);
        self.record(format!("destroy_shader_stage {}", stage.0));
    }

    fn create_program(&mut self, stages: &[StageId]) -> Result<ProgramId> {
        if let Some(log) = self.journal.borrow().fail_link.clone() {
            return Err(Error::CompileOrLink(log));
        }
        let id = self.next_id();
        self.journal.borrow_mut().live_programs.insert(id);
        let stage_ids: Vec<u32> = stages.iter().map(|s| s.0).collect();
        self.record(format!("create_program {:?} -> {}", stage_ids, id));
        Ok(ProgramId(id))
    }

    fn destroy_program(&mut self, program: ProgramId) {
        self.journal.borrow_mut().live_programs.remove(&program.0);
        self.record(format!("destroy_program {}", program.0));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.record(format!("use_program {}", program.0));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocationId> {
        if self.journal.borrow().unresolved_uniforms.contains(name) {
            return None;
        }
        let key = (program.0, name.to_string());
        if let Some(&location) = self.locations.get(&key) {
            return Some(UniformLocationId(location));
        }
        let location = self.next_location;
        self.next_location += 1;
        self.locations.insert(key, location);
        Some(UniformLocationId(location))
    }

    fn set_uniform(&mut self, location: UniformLocationId, value: UniformValue<'_>) {
        self.record(format!("set_uniform {} {:?}", location.0, value));
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId> {
        let id = self.next_id();
        self.journal.borrow_mut().live_vertex_arrays.insert(id);
        self.record(format!("create_vertex_array -> {}", id));
        Ok(VertexArrayId(id))
    }

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.journal.borrow_mut().live_vertex_arrays.remove(&vertex_array.0);
        self.record(format!("destroy_vertex_array {}", vertex_array.0));
    }

    fn create_buffer(&mut self, target: BufferTarget, capacity_bytes: usize) -> Result<BufferId> {
        let id = self.next_id();
        self.journal.borrow_mut().live_buffers.insert(id);
        self.record(format!("create_buffer {:?} {} -> {}", target, capacity_bytes, id));
        Ok(BufferId(id))
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.journal.borrow_mut().live_buffers.remove(&buffer.0);
        self.record(format!("destroy_buffer {}", buffer.0));
    }

    fn write_buffer(
        &mut self,
        target: BufferTarget,
        buffer: BufferId,
        offset_bytes: usize,
        data: &[u8],
    ) {
        let mut journal = self.journal.borrow_mut();
        journal
            .buffer_writes
            .push((target, buffer.0, offset_bytes, data.len()));
        if target == BufferTarget::Index {
            let indices: Vec<u32> = data
                .chunks_exact(4)
                .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();
            journal.index_data_writes.push(indices);
        }
        journal.commands.push(format!(
            "write_buffer {:?} {} offset={} len={}",
            target,
            buffer.0,
            offset_bytes,
            data.len()
        ));
    }

    fn configure_vertex_layout(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        attributes: &[VertexAttribute],
    ) {
        self.record(format!(
            "configure_vertex_layout vao={} vbo={} ibo={} attrs={}",
            vertex_array.0,
            vertex_buffer.0,
            index_buffer.0,
            attributes.len()
        ));
    }

    fn bind_geometry(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
    ) {
        self.record(format!(
            "bind_geometry vao={} vbo={} ibo={}",
            vertex_array.0, vertex_buffer.0, index_buffer.0
        ));
    }

    fn draw_indexed(&mut self, first_index: u32, index_count: u32) {
        self.journal
            .borrow_mut()
            .indexed_draws
            .push((first_index, index_count));
        self.record(format!("draw_indexed first={} count={}", first_index, index_count));
    }

    fn draw_strip(&mut self, first_vertex: u32, vertex_count: u32) {
        self.journal
            .borrow_mut()
            .strip_draws
            .push((first_vertex, vertex_count));
        self.record(format!("draw_strip first={} count={}", first_vertex, vertex_count));
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureId> {
        let id = self.next_id();
        self.journal.borrow_mut().live_textures.insert(id);
        self.record(format!(
            "create_texture {}x{} {:?} -> {}",
            upload.width, upload.height, upload.format, id
        ));
        Ok(TextureId(id))
    }

    fn create_target_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TargetFormat,
    ) -> Result<TextureId> {
        let id = self.next_id();
        self.journal.borrow_mut().live_textures.insert(id);
        self.record(format!(
            "create_target_texture {}x{} {:?} -> {}",
            width, height, format, id
        ));
        Ok(TextureId(id))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.journal.borrow_mut().live_textures.remove(&texture.0);
        self.record(format!("destroy_texture {}", texture.0));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.record(format!("bind_texture unit={} texture={}", unit, texture.0));
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        let id = self.next_id();
        self.journal.borrow_mut().live_framebuffers.insert(id);
        self.record(format!("create_framebuffer -> {}", id));
        Ok(FramebufferId(id))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.journal.borrow_mut().live_framebuffers.remove(&framebuffer.0);
        self.record(format!("destroy_framebuffer {}", framebuffer.0));
    }

    fn attach_color_target(&mut self, framebuffer: FramebufferId, slot: u32, texture: TextureId) {
        self.record(format!(
            "attach_color_target fb={} slot={} texture={}",
            framebuffer.0, slot, texture.0
        ));
    }

    fn attach_depth_target(&mut self, framebuffer: FramebufferId, texture: TextureId) {
        self.record(format!(
            "attach_depth_target fb={} texture={}",
            framebuffer.0, texture.0
        ));
    }

    fn set_color_target_count(&mut self, framebuffer: FramebufferId, count: u32) {
        self.record(format!(
            "set_color_target_count fb={} count={}",
            framebuffer.0, count
        ));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        match framebuffer {
            Some(fb) => self.record(format!("bind_framebuffer {}", fb.0)),
            None => self.record("bind_framebuffer default".to_string()),
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.record(format!("set_viewport {}x{}", width, height));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(format!("clear {:?}", mask));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.record(format!("set_depth_test {}", enabled));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.record(format!("set_depth_write {}", enabled));
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
