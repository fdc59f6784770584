//! Vector helpers used by the shading engine.

use crate::Vec3;

/// Normalize a vector, returning zero for a zero-length input.
#[inline]
pub fn normalize(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

/// Reflect a direction about a unit normal.
#[inline]
pub fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Refract a unit direction through a surface with relative index `eta`.
///
/// Falls back to the mirror direction under total internal reflection.
pub fn refract(direction: Vec3, normal: Vec3, eta: f32) -> Vec3 {
    let cos_i = -direction.dot(normal);
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        return reflect(direction, normal);
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    eta * direction + (eta * cos_i - cos_t) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_zero() {
        assert_eq!(normalize(Vec3::ZERO), Vec3::ZERO);
        assert!((normalize(Vec3::new(3.0, 4.0, 0.0)).length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_reflect() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        let r = reflect(d, Vec3::Y);
        assert!((r - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_refract_straight_through() {
        let r = refract(Vec3::NEG_Y, Vec3::Y, 1.0 / 1.5);
        assert!((r - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_refract_bends_towards_normal() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        let r = refract(d, Vec3::Y, 1.0 / 1.5).normalize();
        // Entering a denser medium, the ray leans closer to -N.
        assert!(r.dot(Vec3::NEG_Y) > d.dot(Vec3::NEG_Y));
    }

    #[test]
    fn test_total_internal_reflection() {
        let d = Vec3::new(1.0, -0.1, 0.0).normalize();
        assert_eq!(refract(d, Vec3::Y, 1.5), reflect(d, Vec3::Y));
    }
}
