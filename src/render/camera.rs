use crate::error::{ConfigError, GeometryError, Result};
use crate::math::intersect_3d::Ray;
use crate::math::{Point3, Vector3, TOLERANCE};

/// Pinhole camera with a vertical field of view.
///
/// Image row 0 is the top of the picture and column 0 its left edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Point3,
    look_at: Point3,
    up: Vector3,
    fov_degrees: f64,
    forward: Vector3,
    right: Vector3,
    true_up: Vector3,
}

impl Camera {
    /// Creates a new camera at `position` looking towards `look_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if `position` and `look_at` coincide, `up` is zero or
    /// parallel to the viewing direction, or `fov_degrees` is outside
    /// `(0, 180)`.
    pub fn new(position: Point3, look_at: Point3, up: Vector3, fov_degrees: f64) -> Result<Self> {
        if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "field of view must lie in (0, 180) degrees, got {fov_degrees}"
            ))
            .into());
        }

        let view = look_at - position;
        let view_len = view.norm();
        if view_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let forward = view / view_len;

        let right = forward.cross(&up);
        let right_len = right.norm();
        if right_len < TOLERANCE {
            return Err(
                GeometryError::Degenerate("camera up vector is parallel to view".into()).into(),
            );
        }
        let right = right / right_len;
        let true_up = right.cross(&forward);

        Ok(Self {
            position,
            look_at,
            up,
            fov_degrees,
            forward,
            right,
            true_up,
        })
    }

    #[must_use]
    pub fn position(&self) -> &Point3 {
        &self.position
    }

    #[must_use]
    pub fn look_at(&self) -> &Point3 {
        &self.look_at
    }

    #[must_use]
    pub fn up(&self) -> &Vector3 {
        &self.up
    }

    /// Vertical field of view in degrees.
    #[must_use]
    pub fn fov_degrees(&self) -> f64 {
        self.fov_degrees
    }

    /// Unit viewing direction.
    #[must_use]
    pub fn forward(&self) -> &Vector3 {
        &self.forward
    }

    /// Ray through the continuous image position `(x, y)` of a
    /// `width × height` image; `(x + 0.5, y + 0.5)` is the center of pixel
    /// `(x, y)`.
    #[must_use]
    pub fn primary_ray(&self, x: f64, y: f64, width: u32, height: u32) -> Ray {
        let width = f64::from(width);
        let height = f64::from(height);
        let half_height = (self.fov_degrees.to_radians() * 0.5).tan();
        let half_width = half_height * width / height;

        let sx = (2.0 * x / width - 1.0) * half_width;
        let sy = (1.0 - 2.0 * y / height) * half_height;
        let direction = (self.forward + self.right * sx + self.true_up * sy).normalize();
        Ray::new(self.position, direction)
    }
}
