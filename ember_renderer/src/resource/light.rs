//! Point-light registry.
//!
//! Lights are created once per scene and mutated between frames through the
//! registry (an opaque handle plus explicit setters, no long-lived pointers
//! into the backing storage). Intensity drives the shadow frustum's far
//! plane, so a brighter light casts shadows over a longer range.

use glam::{Mat4, Vec3};

/// Vertical field of view of the shadow frustum, in degrees
pub const SHADOW_FOV_DEGREES: f32 = 45.0;

/// Near plane of the shadow frustum
pub const SHADOW_NEAR_PLANE: f32 = 0.1;

/// Far plane per unit of light intensity
pub const SHADOW_FAR_PER_INTENSITY: f32 = 25.0;

/// Fixed look-at target of the light-space view
const SHADOW_TARGET: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Opaque light handle (sequential index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightHandle(u32);

impl LightHandle {
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// A point light
#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    /// Far plane of this light's shadow frustum (25 × intensity)
    pub fn shadow_far_plane(&self) -> f32 {
        SHADOW_FAR_PER_INTENSITY * self.intensity
    }

    /// View-projection from the light's point of view: a 45° square-aspect
    /// perspective looking at the fixed shadow target.
    pub fn view_projection(&self) -> Mat4 {
        let projection = Mat4::perspective_rh_gl(
            SHADOW_FOV_DEGREES.to_radians(),
            1.0,
            SHADOW_NEAR_PLANE,
            self.shadow_far_plane(),
        );
        let view = Mat4::look_at_rh(self.position, SHADOW_TARGET, Vec3::Y);
        projection * view
    }
}

/// Registry of point lights, indexed by sequential handles
#[derive(Default)]
pub struct LightRegistry {
    entries: Vec<Light>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, position: Vec3, color: Vec3, intensity: f32) -> LightHandle {
        let handle = LightHandle(self.entries.len() as u32);
        self.entries.push(Light {
            position,
            color,
            intensity,
        });
        handle
    }

    pub fn get(&self, handle: LightHandle) -> Option<&Light> {
        self.entries.get(handle.0 as usize)
    }

    /// Move a light; the usual per-frame mutation
    pub fn set_position(&mut self, handle: LightHandle, position: Vec3) -> bool {
        match self.entries.get_mut(handle.0 as usize) {
            Some(light) => {
                light.position = position;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
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
#[path = "light_tests.rs"]
mod tests;
