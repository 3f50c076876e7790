use super::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::device::mock_graphics_device::{MockGraphicsDevice, MockJournal};
use crate::device::{PixelFormat, TextureFilter, TextureWrap};
use crate::resource::TextureDescriptor;
use crate::Error;

// ============================================================================
// Helpers
// ============================================================================

fn new_renderer() -> (Renderer, Rc<RefCell<MockJournal>>) {
    let device = MockGraphicsDevice::new();
    let journal = device.journal();
    let renderer = Renderer::new(Box::new(device), RendererConfig::default())
        .expect("mock renderer construction");
    (renderer, journal)
}

fn new_renderer_with(config: RendererConfig) -> (Renderer, Rc<RefCell<MockJournal>>) {
    let device = MockGraphicsDevice::new();
    let journal = device.journal();
    let renderer = Renderer::new(Box::new(device), config).expect("mock renderer construction");
    (renderer, journal)
}

fn test_camera() -> Camera {
    Camera::perspective(80.0, 0.1, 100.0, 4.0 / 3.0)
}

/// Descriptor from the upload scenario: float3 + float2 inputs (stride 20)
/// and one float4 uniform.
fn tint_descriptor() -> ShaderDescriptor {
    ShaderDescriptor {
        stages: vec![ShaderStageKind::Vertex, ShaderStageKind::Fragment],
        starting_stage: ShaderStageKind::Vertex,
        inputs: vec![
            ShaderInput { scalar: ShaderScalar::F32, components: 3 },
            ShaderInput { scalar: ShaderScalar::F32, components: 2 },
        ],
        uniforms: vec![uniform(ShaderScalar::F32, 4, "unif_tint")],
        texture_attachments: vec![],
    }
}

fn create_tint_shader(renderer: &mut Renderer) -> ShaderHandle {
    let vertex = renderer
        .create_shader_stage(ShaderStageKind::Vertex, "vert")
        .unwrap();
    let fragment = renderer
        .create_shader_stage(ShaderStageKind::Fragment, "frag")
        .unwrap();
    let shader = renderer
        .create_shader(&tint_descriptor(), &[vertex, fragment])
        .unwrap();
    renderer.destroy_shader_stage(vertex);
    renderer.destroy_shader_stage(fragment);
    shader
}

fn black_pixel_descriptor() -> TextureDescriptor {
    TextureDescriptor {
        width: 1,
        height: 1,
        bits_per_pixel: 32,
        format: PixelFormat::Bgra,
        filter: TextureFilter::Nearest,
        wrap: TextureWrap::ClampToEdge,
    }
}

/// Cube-sized upload for the default 3/2/3 geometry shader (stride 32)
fn cube_vertices() -> Vec<u8> {
    vec![0u8; 8 * 32]
}

fn cube_indices() -> Vec<u32> {
    (0..36).map(|i| i % 8).collect()
}

// ============================================================================
// Startup tests
// ============================================================================

#[test]
fn test_builtin_shaders_are_created() {
    let (renderer, _journal) = new_renderer();
    // geometry, lighting, shadow depth, shadow composite
    assert_eq!(renderer.shader_count(), 4);
    assert_eq!(renderer.default_shader().index(), 0);
}

#[test]
fn test_builtin_stages_are_released_after_link() {
    let (_renderer, journal) = new_renderer();
    assert_eq!(journal.borrow().live_stages.len(), 0);
}

#[test]
fn test_startup_compile_failure_is_fatal() {
    let device = MockGraphicsDevice::new();
    device.journal().borrow_mut().fail_compile = Some("0:3 unexpected token".to_string());

    let result = Renderer::new(Box::new(device), RendererConfig::default());
    match result {
        Err(Error::CompileOrLink(log)) => assert!(log.contains("unexpected token")),
        other => panic!("expected CompileOrLink, got {:?}", other),
    }
}

// ============================================================================
// Shader scenario tests
// ============================================================================

#[test]
fn test_uniform_scenario_float4_roundtrip() {
    let (mut renderer, _journal) = new_renderer();
    let shader = create_tint_shader(&mut renderer);

    // correctly sized float4 payload succeeds
    let tint: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    assert_eq!(
        renderer.shader_uniform(shader, "unif_tint", bytemuck::cast_slice(&tint)),
        Ok(())
    );

    // a float3-sized payload is rejected with SizeMismatch
    let short: [f32; 3] = [1.0, 0.0, 0.0];
    assert_eq!(
        renderer.shader_uniform(shader, "unif_tint", bytemuck::cast_slice(&short)),
        Err(UniformError::SizeMismatch)
    );
}

#[test]
fn test_uniform_on_unknown_shader() {
    let (mut renderer, _journal) = new_renderer();
    let bogus = ShaderHandle::new(99);
    assert_eq!(
        renderer.shader_uniform(bogus, "unif_tint", &[0u8; 4]),
        Err(UniformError::UnknownShader)
    );
}

#[test]
fn test_create_shader_validation_failure_leaks_nothing() {
    let (mut renderer, journal) = new_renderer();
    journal
        .borrow_mut()
        .unresolved_uniforms
        .insert("unif_tint".to_string());

    let vertex = renderer
        .create_shader_stage(ShaderStageKind::Vertex, "vert")
        .unwrap();
    let fragment = renderer
        .create_shader_stage(ShaderStageKind::Fragment, "frag")
        .unwrap();

    let live_before = journal.borrow().live_total();
    let result = renderer.create_shader(&tint_descriptor(), &[vertex, fragment]);
    assert!(matches!(result, Err(Error::Validation(_))));

    // the failed creation released every intermediate object
    assert_eq!(journal.borrow().live_total(), live_before);
    assert_eq!(renderer.shader_count(), 4);

    renderer.destroy_shader_stage(vertex);
    renderer.destroy_shader_stage(fragment);
}

#[test]
fn test_shader_use_unknown_handle() {
    let (mut renderer, _journal) = new_renderer();
    assert!(matches!(
        renderer.shader_use(ShaderHandle::new(42)),
        Err(Error::ResourceNotFound(_))
    ));
    assert!(renderer.shader_use(renderer.default_shader()).is_ok());
}

#[test]
fn test_shader_uniform_exists() {
    let (mut renderer, _journal) = new_renderer();
    let shader = create_tint_shader(&mut renderer);

    assert!(renderer.shader_uniform_exists(shader, "unif_tint"));
    assert!(!renderer.shader_uniform_exists(shader, "unif_other"));
    assert!(!renderer.shader_uniform_exists(ShaderHandle::new(99), "unif_tint"));
}

// ============================================================================
// Texture scenario tests
// ============================================================================

#[test]
fn test_texture_handles_start_at_one_and_increase() {
    let (mut renderer, _journal) = new_renderer();

    let black = [0u8; 4];
    let first = renderer
        .create_texture(&black_pixel_descriptor(), &black)
        .unwrap();
    assert_eq!(first.index(), 1);

    let second = renderer
        .create_texture(&black_pixel_descriptor(), &black)
        .unwrap();
    assert!(second.index() > first.index());
    assert_eq!(renderer.texture_count(), 2);
}

// ============================================================================
// Mesh scenario tests
// ============================================================================

#[test]
fn test_create_mesh_with_unknown_shader_fails() {
    let (mut renderer, _journal) = new_renderer();
    let result = renderer.create_mesh(
        Transform::default(),
        Material::default(),
        ShaderHandle::new(17),
    );
    assert!(matches!(result, Err(Error::ResourceNotFound(_))));
}

#[test]
fn test_mesh_upload_records_ranges() {
    let (mut renderer, _journal) = new_renderer();
    let shader = renderer.default_shader();

    let a = renderer
        .create_mesh(Transform::default(), Material::default(), shader)
        .unwrap();
    let b = renderer
        .create_mesh(Transform::default(), Material::default(), shader)
        .unwrap();

    renderer.mesh_upload(a, &cube_vertices(), &cube_indices()).unwrap();
    renderer.mesh_upload(b, &cube_vertices(), &cube_indices()).unwrap();

    let range_a = renderer.mesh(a).unwrap().range();
    let range_b = renderer.mesh(b).unwrap().range();
    assert!(range_a.is_uploaded());
    assert!(range_b.is_uploaded());

    // the second mesh lands directly after the first
    assert_eq!(range_b.vertex_offset, range_a.vertex_offset + range_a.vertex_count);
    assert_eq!(range_b.index_offset, range_a.index_offset + range_a.index_count);
}

#[test]
fn test_mesh_reupload_appends_a_fresh_range() {
    let (mut renderer, _journal) = new_renderer();
    let mesh = renderer
        .create_mesh(
            Transform::default(),
            Material::default(),
            renderer.default_shader(),
        )
        .unwrap();

    renderer.mesh_upload(mesh, &cube_vertices(), &cube_indices()).unwrap();
    let first = renderer.mesh(mesh).unwrap().range();

    renderer.mesh_upload(mesh, &cube_vertices(), &cube_indices()).unwrap();
    let second = renderer.mesh(mesh).unwrap().range();

    // the mesh now points at a disjoint, newer range
    assert_eq!(second.vertex_offset, first.vertex_offset + first.vertex_count);
    assert_eq!(second.index_offset, first.index_offset + first.index_count);
}

#[test]
fn test_mesh_upload_capacity_exceeded_is_recoverable() {
    let config = RendererConfig {
        vertex_capacity: 8,
        index_capacity: 36,
        ..RendererConfig::default()
    };
    let (mut renderer, _journal) = new_renderer_with(config);
    let mesh = renderer
        .create_mesh(
            Transform::default(),
            Material::default(),
            renderer.default_shader(),
        )
        .unwrap();

    // 9 vertices into an 8-vertex buffer
    let oversized = vec![0u8; 9 * 32];
    let result = renderer.mesh_upload(mesh, &oversized, &cube_indices());
    assert!(matches!(result, Err(Error::CapacityExceeded(_))));
    assert!(!renderer.mesh(mesh).unwrap().range().is_uploaded());

    // a fitting upload afterwards still succeeds
    renderer.mesh_upload(mesh, &cube_vertices(), &cube_indices()).unwrap();
    assert!(renderer.mesh(mesh).unwrap().range().is_uploaded());
}

#[test]
fn test_mesh_transform_and_material_updates() {
    let (mut renderer, _journal) = new_renderer();
    let mesh = renderer
        .create_mesh(
            Transform::default(),
            Material::default(),
            renderer.default_shader(),
        )
        .unwrap();

    let entry = renderer.mesh_mut(mesh).unwrap();
    entry.transform.position = glam::Vec3::new(0.0, 1.0, 0.0);
    entry.material.color = glam::Vec3::new(0.2, 0.4, 0.8);

    assert_eq!(
        renderer.mesh(mesh).unwrap().transform.position,
        glam::Vec3::new(0.0, 1.0, 0.0)
    );
}

// ============================================================================
// Light scenario tests
// ============================================================================

#[test]
fn test_light_creation_and_mutation() {
    let (mut renderer, _journal) = new_renderer();
    let light = renderer.create_light(glam::Vec3::ZERO, glam::Vec3::ONE, 20.0);

    // intensity 20 → shadow far plane 500
    assert_eq!(renderer.light(light).unwrap().shadow_far_plane(), 500.0);

    renderer
        .set_light_position(light, glam::Vec3::new(1.0, 0.0, 1.0))
        .unwrap();
    assert_eq!(
        renderer.light(light).unwrap().position,
        glam::Vec3::new(1.0, 0.0, 1.0)
    );
}

#[test]
fn test_set_position_on_unknown_light_fails() {
    let (mut renderer, _journal) = new_renderer();
    renderer.create_light(glam::Vec3::ZERO, glam::Vec3::ONE, 1.0);

    // a handle three entries past the single registered light
    let bogus = {
        let mut other = LightRegistry::new();
        other.create(glam::Vec3::ZERO, glam::Vec3::ONE, 1.0);
        other.create(glam::Vec3::ZERO, glam::Vec3::ONE, 1.0);
        other.create(glam::Vec3::ZERO, glam::Vec3::ONE, 1.0)
    };
    assert!(matches!(
        renderer.set_light_position(bogus, glam::Vec3::ZERO),
        Err(Error::ResourceNotFound(_))
    ));
}

// ============================================================================
// Frame tests
// ============================================================================

#[test]
fn test_unuploaded_mesh_is_skipped() {
    let (mut renderer, journal) = new_renderer();
    renderer
        .create_mesh(
            Transform::default(),
            Material::default(),
            renderer.default_shader(),
        )
        .unwrap();

    let stats = renderer.draw(&test_camera(), (800, 600), 0.0);
    assert_eq!(stats.meshes_drawn, 0);
    assert_eq!(stats.meshes_skipped, 1);
    // no indexed draw reached the device
    assert!(journal.borrow().indexed_draws.is_empty());
}

#[test]
fn test_uploaded_mesh_is_drawn() {
    let (mut renderer, journal) = new_renderer();
    let mesh = renderer
        .create_mesh(
            Transform::default(),
            Material::default(),
            renderer.default_shader(),
        )
        .unwrap();
    renderer.mesh_upload(mesh, &cube_vertices(), &cube_indices()).unwrap();

    let stats = renderer.draw(&test_camera(), (800, 600), 0.0);
    assert_eq!(stats.meshes_drawn, 1);
    assert_eq!(stats.meshes_skipped, 0);
    assert_eq!(stats.uniform_errors, 0);

    // geometry pass drew the mesh's full index range from its offset
    assert_eq!(journal.borrow().indexed_draws, vec![(0, 36)]);
}

#[test]
fn test_material_textures_bind_in_attachment_order() {
    let (mut renderer, journal) = new_renderer();

    let albedo = renderer
        .create_texture(&black_pixel_descriptor(), &[0u8; 4])
        .unwrap();
    let material = Material {
        color: glam::Vec3::ONE,
        textures: vec![albedo],
    };
    let mesh = renderer
        .create_mesh(Transform::default(), material, renderer.default_shader())
        .unwrap();
    renderer.mesh_upload(mesh, &cube_vertices(), &cube_indices()).unwrap();

    renderer.draw(&test_camera(), (800, 600), 0.0);

    let journal = journal.borrow();
    // slot 0 carries the albedo texture, the two empty slots are set to -1
    assert!(journal.commands.iter().any(|c| c.starts_with("bind_texture unit=0")));
    let unbound = journal
        .commands
        .iter()
        .filter(|c| c.starts_with("set_uniform") && c.contains("S32(-1)"))
        .count();
    assert_eq!(unbound, 2);
}

#[test]
fn test_draw_is_idempotent() {
    let (mut renderer, journal) = new_renderer();
    let mesh = renderer
        .create_mesh(
            Transform::default(),
            Material::default(),
            renderer.default_shader(),
        )
        .unwrap();
    renderer.mesh_upload(mesh, &cube_vertices(), &cube_indices()).unwrap();
    renderer.create_light(glam::Vec3::new(0.0, 2.0, 2.0), glam::Vec3::ONE, 20.0);

    let camera = test_camera();

    let start = journal.borrow().commands.len();
    renderer.draw(&camera, (800, 600), 1.5);
    let middle = journal.borrow().commands.len();
    renderer.draw(&camera, (800, 600), 1.5);
    let end = journal.borrow().commands.len();

    let journal = journal.borrow();
    assert_eq!(
        &journal.commands[start..middle],
        &journal.commands[middle..end],
        "two draws with unchanged state must issue identical command streams"
    );
}

#[test]
fn test_draw_continues_past_uniform_failures() {
    let (mut renderer, journal) = new_renderer();
    let mesh = renderer
        .create_mesh(
            Transform::default(),
            Material::default(),
            renderer.default_shader(),
        )
        .unwrap();
    renderer.mesh_upload(mesh, &cube_vertices(), &cube_indices()).unwrap();

    // the material color uniform stops resolving after startup
    journal
        .borrow_mut()
        .unresolved_uniforms
        .insert("unif_material_color".to_string());

    let stats = renderer.draw(&test_camera(), (800, 600), 0.0);
    // the failure was counted and the mesh still drew
    assert!(stats.uniform_errors >= 1);
    assert_eq!(stats.meshes_drawn, 1);
    assert_eq!(journal.borrow().indexed_draws.len(), 1);
}

// ============================================================================
// Teardown tests
// ============================================================================

#[test]
fn test_drop_releases_every_gpu_object() {
    let (renderer, journal) = new_renderer();
    assert!(journal.borrow().live_total() > 0);

    drop(renderer);
    assert_eq!(journal.borrow().live_total(), 0);
}

#[test]
fn test_drop_releases_user_resources_too() {
    let (mut renderer, journal) = new_renderer();

    create_tint_shader(&mut renderer);
    renderer
        .create_texture(&black_pixel_descriptor(), &[0u8; 4])
        .unwrap();

    drop(renderer);
    assert_eq!(journal.borrow().live_total(), 0);
}
