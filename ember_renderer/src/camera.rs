//! Camera: perspective or orthographic view-projection supplier.
//!
//! The camera is owned and driven by the frame loop, not by the renderer:
//! the renderer only reads the matrices computed here once per frame.
//! Rotation is expressed in degrees on all three axes.

use glam::{Mat4, Vec3};

/// Position/rotation pair driving the view matrix. Rotation is in degrees.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraTransform {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
}

/// Projection selection
#[derive(Debug, Clone, Copy)]
enum Projection {
    Perspective { fov_degrees: f32 },
    Orthographic,
}

/// The matrices a camera produces for one frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
}

/// A camera with mutable transform and fixed projection parameters.
///
/// `matrices()` is a pure computation over the current state, so drawing the
/// same scene twice with an unchanged camera yields identical matrices.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: CameraTransform,
    projection: Projection,
    near: f32,
    far: f32,
    aspect: f32,
}

impl Camera {
    /// Perspective camera. `fov_degrees` is the vertical field of view.
    pub fn perspective(fov_degrees: f32, near: f32, far: f32, aspect: f32) -> Self {
        Self {
            transform: CameraTransform::default(),
            projection: Projection::Perspective { fov_degrees },
            near,
            far,
            aspect,
        }
    }

    /// Orthographic camera spanning [-aspect, aspect] × [-1, 1].
    pub fn orthographic(near: f32, far: f32, aspect: f32) -> Self {
        Self {
            transform: CameraTransform::default(),
            projection: Projection::Orthographic,
            near,
            far,
            aspect,
        }
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic)
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Compute the view, projection and combined matrices from the current
    /// transform.
    ///
    /// The view matrix is the inverse translation of the camera position; the
    /// camera rotation is folded into the projection (negated around X and Z),
    /// matching the composition order the draw pipeline expects.
    pub fn matrices(&self) -> CameraMatrices {
        let view = Mat4::from_translation(-self.transform.position);

        let mut projection = match self.projection {
            Projection::Perspective { fov_degrees } => Mat4::perspective_rh_gl(
                fov_degrees.to_radians(),
                self.aspect,
                self.near,
                self.far,
            ),
            Projection::Orthographic => Mat4::orthographic_rh_gl(
                -self.aspect,
                self.aspect,
                -1.0,
                1.0,
                -self.far,
                self.far,
            ),
        };

        let rotation = self.transform.rotation_degrees;
        projection = projection
            * Mat4::from_rotation_x((-rotation.x).to_radians())
            * Mat4::from_rotation_y(rotation.y.to_radians())
            * Mat4::from_rotation_z((-rotation.z).to_radians());

        CameraMatrices {
            view,
            projection,
            view_projection: projection * view,
        }
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
