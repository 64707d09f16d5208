//! Closed-form form factors for reference configurations.
//!
//! Used to validate the stochastic estimator.

use std::f64::consts::PI;

/// Form factor between two identical, directly opposed parallel rectangles
/// of size `a × b` separated by `distance`.
#[must_use]
pub fn parallel_rectangles(a: f64, b: f64, distance: f64) -> f64 {
    let x = a / distance;
    let y = b / distance;
    let x1 = (1.0 + x * x).sqrt();
    let y1 = (1.0 + y * y).sqrt();

    let log_term = ((1.0 + x * x) * (1.0 + y * y) / (1.0 + x * x + y * y)).sqrt().ln();
    let terms = log_term + x * y1 * (x / y1).atan() + y * x1 * (y / x1).atan()
        - x * x.atan()
        - y * y.atan();

    2.0 / (PI * x * y) * terms
}

/// Form factor from a `width × length` rectangle to a `height × length`
/// rectangle perpendicular to it, the two sharing their `length` edge.
#[must_use]
pub fn perpendicular_rectangles(width: f64, height: f64, length: f64) -> f64 {
    let w = width / length;
    let h = height / length;
    let w2 = w * w;
    let h2 = h * h;
    let hw = (h2 + w2).sqrt();

    let arctan_terms = w * (1.0 / w).atan() + h * (1.0 / h).atan() - hw * (1.0 / hw).atan();

    let a = (1.0 + w2) * (1.0 + h2) / (1.0 + w2 + h2);
    let b = w2 * (1.0 + w2 + h2) / ((1.0 + w2) * (w2 + h2));
    let c = h2 * (1.0 + w2 + h2) / ((1.0 + h2) * (h2 + w2));
    let log_term = 0.25 * (a.ln() + w2 * b.ln() + h2 * c.ln());

    (arctan_terms + log_term) / (PI * w)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn unit_squares_one_apart() {
        assert_relative_eq!(parallel_rectangles(1.0, 1.0, 1.0), 0.199_825, epsilon = 1e-5);
    }

    #[test]
    fn close_parallel_plates_see_each_other_fully() {
        assert!(parallel_rectangles(100.0, 100.0, 0.01) > 0.999);
    }

    #[test]
    fn unit_squares_at_right_angle() {
        assert_relative_eq!(perpendicular_rectangles(1.0, 1.0, 1.0), 0.200_044, epsilon = 1e-5);
    }

    #[test]
    fn perpendicular_reciprocity() {
        // A_1 F_12 = A_2 F_21 for a 2x1 and a 1x1 face sharing the unit edge.
        let f12 = perpendicular_rectangles(2.0, 1.0, 1.0);
        let f21 = perpendicular_rectangles(1.0, 2.0, 1.0);
        assert_relative_eq!(2.0 * f12, 1.0 * f21, epsilon = 1e-12);
    }
}
