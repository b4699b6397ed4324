//! Scalar helpers with the clamping rules every evaluator relies on.

use glam::Vec3;

/// Exponent arguments are clamped to `[-EXP_CLAMP, EXP_CLAMP]`.
pub const EXP_CLAMP: f32 = 40.0;

/// Smallest magnitude allowed in a divisor.
pub const MIN_DENOMINATOR: f32 = 1e-6;

/// `exp(x)` with the argument clamped to `[-40, 40]`.
#[inline]
pub fn safe_exp(x: f32) -> f32 {
    x.clamp(-EXP_CLAMP, EXP_CLAMP).exp()
}

/// Component-wise [`safe_exp`].
#[inline]
pub fn safe_exp_vec3(v: Vec3) -> Vec3 {
    Vec3::new(safe_exp(v.x), safe_exp(v.y), safe_exp(v.z))
}

/// `num / den` with `|den|` kept above [`MIN_DENOMINATOR`] (sign preserved).
#[inline]
pub fn safe_div(num: f32, den: f32) -> f32 {
    let den = if den.abs() < MIN_DENOMINATOR {
        MIN_DENOMINATOR.copysign(den)
    } else {
        den
    };
    num / den
}

#[inline]
pub fn saturate(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Hermite smoothstep. Handles reversed edges (`edge0 > edge1`).
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = saturate(safe_div(x - edge0, edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear remap of `x` from `[in_min, in_max]` to `[out_min, out_max]` (unclamped).
pub fn remap(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + safe_div(x - in_min, in_max - in_min) * (out_max - out_min)
}

/// Rec. 709 luminance of a linear RGB colour.
#[inline]
pub fn luminance(rgb: Vec3) -> f32 {
    rgb.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_exp_clamps() {
        assert_eq!(safe_exp(-1000.0), (-EXP_CLAMP).exp());
        assert_eq!(safe_exp(1000.0), EXP_CLAMP.exp());
        assert!(safe_exp(-1000.0) > 0.0);
        assert!((safe_exp(1.0) - std::f32::consts::E).abs() < 1e-6);
    }

    #[test]
    fn test_safe_div_never_infinite() {
        assert!(safe_div(1.0, 0.0).is_finite());
        assert!(safe_div(1.0, -0.0).is_finite());
        assert_eq!(safe_div(6.0, 3.0), 2.0);
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        // Reversed edges invert the ramp.
        assert_eq!(smoothstep(10.0, -6.0, 12.0), 0.0);
        assert_eq!(smoothstep(10.0, -6.0, -8.0), 1.0);
    }

    #[test]
    fn test_smoothstep_degenerate_edges() {
        let v = smoothstep(1.0, 1.0, 1.0);
        assert!(v.is_finite());
    }

    #[test]
    fn test_remap_and_lerp() {
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
        assert!((remap(5.0, 0.0, 10.0, 0.0, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_luminance_of_white() {
        assert!((luminance(Vec3::ONE) - 1.0).abs() < 1e-5);
    }
}
