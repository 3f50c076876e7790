//! Built-in GLSL sources for the deferred pipeline passes.
//!
//! Shader-stage loading from disk stays with the caller; the pipeline's own
//! programs ship as embedded source so the renderer is usable without an
//! asset directory. Uniform and attribute names here must match the
//! descriptors built in `Renderer::new`.

/// Geometry pass vertex stage: position/uv/normal in, G-buffer varyings out
pub const GEOMETRY_VERT: &str = r#"#version 410 core
layout(location = 0) in vec3 in_position;
layout(location = 1) in vec2 in_uv;
layout(location = 2) in vec3 in_normal;

uniform mat4 unif_mvp;
uniform mat4 unif_model;
uniform mat4 unif_model_rotation;

out vec3 frag_position;
out vec2 frag_uv;
out vec3 frag_normal;

void main() {
    vec4 world = unif_model * vec4(in_position, 1.0);
    frag_position = world.xyz;
    frag_uv = in_uv;
    frag_normal = normalize((unif_model_rotation * vec4(in_normal, 0.0)).xyz);
    gl_Position = unif_mvp * vec4(in_position, 1.0);
}
"#;

/// Geometry pass fragment stage: writes position/normal/albedo-specular and
/// primes the shadow target as fully lit
pub const GEOMETRY_FRAG: &str = r#"#version 410 core
uniform vec3 unif_material_color;
uniform sampler2D unif_texture_albedo;
uniform sampler2D unif_texture_normal;
uniform sampler2D unif_texture_specular;

in vec3 frag_position;
in vec2 frag_uv;
in vec3 frag_normal;

layout(location = 0) out vec4 out_position;
layout(location = 1) out vec4 out_normal;
layout(location = 2) out vec4 out_albedo_specular;
layout(location = 3) out float out_shadow;

void main() {
    vec3 bump = texture(unif_texture_normal, frag_uv).rgb * 2.0 - 1.0;
    vec3 normal = normalize(frag_normal + bump * 0.1);

    out_position = vec4(frag_position, 1.0);
    out_normal = vec4(normal, 0.0);
    out_albedo_specular = vec4(
        unif_material_color * texture(unif_texture_albedo, frag_uv).rgb,
        texture(unif_texture_specular, frag_uv).r
    );
    out_shadow = 1.0;
}
"#;

/// Lighting pass vertex stage: full-screen clip-space quad
pub const LIGHT_VERT: &str = r#"#version 410 core
layout(location = 0) in vec2 in_position;

void main() {
    gl_Position = vec4(in_position, 0.0, 1.0);
}
"#;

/// Lighting pass fragment stage: resolves the G-buffer to the final color
pub const LIGHT_FRAG: &str = r#"#version 410 core
uniform sampler2D unif_gbuffer_geometry;
uniform sampler2D unif_gbuffer_normal;
uniform sampler2D unif_gbuffer_albedo_specular;
uniform sampler2D unif_gbuffer_shadows;
uniform vec2 unif_screen;
uniform vec3 unif_view_pos;
uniform float unif_time;

layout(location = 0) out vec4 out_color;

void main() {
    vec2 uv = gl_FragCoord.xy / unif_screen;

    vec3 position = texture(unif_gbuffer_geometry, uv).xyz;
    vec3 normal = normalize(texture(unif_gbuffer_normal, uv).xyz);
    vec4 albedo_specular = texture(unif_gbuffer_albedo_specular, uv);
    float shadow = texture(unif_gbuffer_shadows, uv).r;

    vec3 to_view = normalize(unif_view_pos - position);
    float diffuse = max(dot(normal, to_view), 0.0);
    float specular = albedo_specular.a * pow(max(dot(normal, to_view), 0.0), 16.0);
    float ambient = 0.05 + 0.02 * sin(unif_time);

    vec3 color = albedo_specular.rgb * (ambient + diffuse * shadow) + vec3(specular * shadow);
    out_color = vec4(color, 1.0);
}
"#;

/// Shadow depth pass vertex stage: depth from the light's point of view
pub const SHADOW_DEPTH_VERT: &str = r#"#version 410 core
layout(location = 0) in vec3 in_position;

uniform mat4 unif_light_vp;
uniform mat4 unif_model;

void main() {
    gl_Position = unif_light_vp * unif_model * vec4(in_position, 1.0);
}
"#;

/// Shadow depth pass fragment stage: depth only, no color output
pub const SHADOW_DEPTH_FRAG: &str = r#"#version 410 core
void main() {
}
"#;

/// Shadow composite vertex stage: camera-space position plus light-space
/// coordinates for the depth comparison
pub const SHADOW_COMPOSITE_VERT: &str = r#"#version 410 core
layout(location = 0) in vec3 in_position;

uniform mat4 unif_light_vp;
uniform mat4 unif_model;
uniform mat4 unif_vp;

out vec4 frag_light_space;

void main() {
    vec4 world = unif_model * vec4(in_position, 1.0);
    frag_light_space = unif_light_vp * world;
    gl_Position = unif_vp * world;
}
"#;

/// Shadow composite fragment stage: writes the shadow attenuation target
pub const SHADOW_COMPOSITE_FRAG: &str = r#"#version 410 core
uniform sampler2D unif_shadow_depth;

in vec4 frag_light_space;

layout(location = 3) out float out_shadow;

void main() {
    vec3 ndc = frag_light_space.xyz / frag_light_space.w;
    vec3 coords = ndc * 0.5 + 0.5;

    float lit = 1.0;
    if (coords.z <= 1.0) {
        float nearest = texture(unif_shadow_depth, coords.xy).r;
        lit = coords.z - 0.005 > nearest ? 0.0 : 1.0;
    }
    out_shadow = lit;
}
"#;
