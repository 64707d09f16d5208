pub mod intersect_3d;
pub mod polygon_3d;
pub mod sampling;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Linear RGB triple used for reflectance, emission and radiosity.
///
/// Channel-wise products use [`nalgebra::Matrix::component_mul`].
pub type Rgb = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Offset applied along a surface normal before casting a secondary ray,
/// so the ray does not re-hit the surface it starts on.
pub const RAY_EPSILON: f64 = 1e-7;

/// Sum of the three channels of a colour.
#[must_use]
pub fn channel_sum(color: &Rgb) -> f64 {
    color.x + color.y + color.z
}

/// Returns `true` if every channel of `color` is finite.
#[must_use]
pub fn is_finite_rgb(color: &Rgb) -> bool {
    color.iter().all(|c| c.is_finite())
}
