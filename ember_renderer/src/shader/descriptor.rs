//! Declarative shader descriptors.
//!
//! A [`ShaderDescriptor`] states everything the renderer needs to know about
//! a pipeline configuration up front: the stages, the vertex input slots, the
//! uniforms and the material texture attachments. Structural validation
//! happens here; location validation against the linked program happens in
//! [`ShaderProgram::build`](crate::shader::ShaderProgram::build).

use rustc_hash::FxHashMap;
use crate::device::{ShaderScalar, ShaderStageKind};
use crate::error::Result;
use crate::render_bail;

/// Vertex input slot: scalar type + component count
#[derive(Debug, Clone, Copy)]
pub struct ShaderInput {
    pub scalar: ShaderScalar,
    pub components: u32,
}

/// Declared uniform: scalar type, component count and GLSL name
#[derive(Debug, Clone)]
pub struct ShaderUniform {
    pub scalar: ShaderScalar,
    pub components: u32,
    pub name: String,
}

impl ShaderUniform {
    /// Expected payload size in bytes for this uniform
    pub fn size_bytes(&self) -> usize {
        self.components as usize * self.scalar.size_bytes()
    }
}

/// Semantic role a material texture slot fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureRole {
    Unknown,
    Albedo,
    Normal,
    Specular,
    Roughness,
}

/// Binds a material texture slot to a sampler uniform by name.
/// Slot order is declaration order.
#[derive(Debug, Clone)]
pub struct TextureAttachment {
    pub role: TextureRole,
    pub uniform: String,
}

/// Everything needed to build one pipeline configuration
#[derive(Debug, Clone)]
pub struct ShaderDescriptor {
    pub stages: Vec<ShaderStageKind>,
    pub starting_stage: ShaderStageKind,
    pub inputs: Vec<ShaderInput>,
    pub uniforms: Vec<ShaderUniform>,
    pub texture_attachments: Vec<TextureAttachment>,
}

impl ShaderDescriptor {
    /// Interleaved vertex stride in bytes: Σ components × scalar size over the
    /// inputs, laid out contiguously in declaration order.
    pub fn vertex_stride(&self) -> u32 {
        self.inputs
            .iter()
            .map(|input| input.components * input.scalar.size_bytes() as u32)
            .sum()
    }

    /// Structural validation, independent of any linked program.
    ///
    /// Rejects: an empty input list, inputs whose type cannot feed a vertex
    /// attribute, duplicate uniform names, and texture attachments whose
    /// uniform is missing or not texture-typed.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            render_bail!(
                "ember::ShaderDescriptor",
                Validation,
                "shader descriptor declares no vertex inputs"
            );
        }

        for (slot, input) in self.inputs.iter().enumerate() {
            if !input.scalar.is_attribute_compatible() {
                render_bail!(
                    "ember::ShaderDescriptor",
                    Validation,
                    "vertex input {} has non-attribute type {:?}",
                    slot,
                    input.scalar
                );
            }
        }

        let mut by_name: FxHashMap<&str, &ShaderUniform> = FxHashMap::default();
        for uniform in &self.uniforms {
            if by_name.insert(uniform.name.as_str(), uniform).is_some() {
                render_bail!(
                    "ember::ShaderDescriptor",
                    Validation,
                    "duplicate uniform name '{}'",
                    uniform.name
                );
            }
        }

        for attachment in &self.texture_attachments {
            match by_name.get(attachment.uniform.as_str()) {
                None => {
                    render_bail!(
                        "ember::ShaderDescriptor",
                        Validation,
                        "texture attachment references unknown uniform '{}'",
                        attachment.uniform
                    );
                }
                Some(uniform) if uniform.scalar != ShaderScalar::Texture => {
                    render_bail!(
                        "ember::ShaderDescriptor",
                        Validation,
                        "texture attachment uniform '{}' is {:?}, not a texture",
                        attachment.uniform,
                        uniform.scalar
                    );
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
