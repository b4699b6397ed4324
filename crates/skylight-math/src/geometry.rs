//! Ray/sphere intersection and direction helpers.
//!
//! All spheres are centred on the origin (the planet centre). Directions use
//! a Y-up frame: azimuth is measured from +Z (north) towards +X (east).

use glam::Vec3;

/// Parametric interval `[near, far]` along a ray.
///
/// An empty interval is encoded with `near > far`; it never contains NaN.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayInterval {
    /// Entry distance (may be negative when the origin is inside the sphere).
    pub near: f32,
    /// Exit distance.
    pub far: f32,
}

impl RayInterval {
    /// Sentinel for "no intersection".
    pub const EMPTY: Self = Self {
        near: 1.0,
        far: -1.0,
    };

    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// True when the ray misses the sphere entirely.
    pub fn is_empty(&self) -> bool {
        self.near > self.far
    }

    /// True when the sphere is hit somewhere in front of the origin.
    pub fn hits_ahead(&self) -> bool {
        !self.is_empty() && self.far >= 0.0
    }

    /// Interval clipped to the forward half-line (`t >= 0`).
    pub fn forward(&self) -> Self {
        if !self.hits_ahead() {
            return Self::EMPTY;
        }
        Self {
            near: self.near.max(0.0),
            far: self.far,
        }
    }

    /// Length of the interval, zero when empty.
    pub fn length(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.far - self.near
        }
    }
}

/// Intersect a ray with an origin-centred sphere.
///
/// Solved in double precision: at kilometre scale the `|o|² − r²` term loses
/// most of its significant digits in `f32` for cameras near the surface.
/// Returns [`RayInterval::EMPTY`] for a miss, a non-positive radius or a
/// degenerate direction.
pub fn ray_sphere_intersect(origin: Vec3, dir: Vec3, radius: f32) -> RayInterval {
    let o = origin.as_dvec3();
    let d = dir.as_dvec3();
    let a = d.length_squared();
    if a < 1e-12 || radius <= 0.0 || !a.is_finite() {
        return RayInterval::EMPTY;
    }
    let r = radius as f64;
    let b = o.dot(d);
    let c = o.length_squared() - r * r;
    let disc = b * b - a * c;
    if disc < 0.0 || !disc.is_finite() {
        return RayInterval::EMPTY;
    }
    let sqrt_disc = disc.sqrt();
    // Numerically stable form: avoid cancellation between -b and sqrt_disc.
    let q = if b > 0.0 {
        -(b + sqrt_disc)
    } else {
        -b + sqrt_disc
    };
    let (t0, t1) = if q.abs() < 1e-300 {
        (-b / a, -b / a)
    } else {
        (q / a, c / q)
    };
    let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
    RayInterval::new(near as f32, far as f32)
}

/// Unit direction from elevation and azimuth (radians).
pub fn direction_from_angles(elevation: f32, azimuth: f32) -> Vec3 {
    let (sin_el, cos_el) = elevation.sin_cos();
    let (sin_az, cos_az) = azimuth.sin_cos();
    Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
}

/// Orthonormal `(right, up)` pair perpendicular to `forward`.
///
/// `up` is as close to world +Y as possible; falls back to +Z when
/// `forward` is vertical.
pub fn tangent_basis(forward: Vec3) -> (Vec3, Vec3) {
    let f = forward.normalize_or(Vec3::Y);
    let reference = if f.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
    let right = reference.cross(f).normalize_or(Vec3::X);
    let up = f.cross(right);
    (right, up)
}
