//! Sun and moon discs: antialiased edges, lunar phase shading, solar eclipse
//! and corona.
//!
//! All directions are unit vectors from the viewer. Angular sizes are radii
//! in radians.

use glam::{Vec2, Vec3};
use skylight_math::{saturate, smoothstep, tangent_basis};

/// Angular sizes and edge antialiasing of the two discs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscParams {
    pub sun_angular_radius: f32,
    /// Slightly larger than the sun so a full eclipse is total.
    pub moon_angular_radius: f32,
    /// Width of the antialiased rim as a fraction of the radius.
    pub edge_softness: f32,
}

impl Default for DiscParams {
    fn default() -> Self {
        Self {
            sun_angular_radius: 0.00935 / 2.0,
            moon_angular_radius: 0.0049,
            edge_softness: 0.15,
        }
    }
}

/// Angle between two unit vectors, accurate for tiny separations.
fn angle_between(a: Vec3, b: Vec3) -> f32 {
    a.cross(b).length().atan2(a.dot(b))
}

/// Antialiased disc coverage in `[0, 1]`.
pub fn sun_disc(view: Vec3, center: Vec3, angular_radius: f32, edge_softness: f32) -> f32 {
    let angle = angle_between(view, center);
    1.0 - smoothstep(angular_radius * (1.0 - edge_softness), angular_radius, angle)
}

fn eclipse_start_separation(params: &DiscParams) -> f32 {
    (params.sun_angular_radius + params.moon_angular_radius) * 1.05
}

fn eclipse_separation(amount: f32, params: &DiscParams) -> f32 {
    (1.0 - saturate(amount)) * eclipse_start_separation(params)
}

/// Apparent moon position during an eclipse: slides from just outside the
/// sun's limb (`amount = 0`) onto its centre (`amount = 1`).
pub fn eclipse_moon_direction(sun_direction: Vec3, amount: f32, params: &DiscParams) -> Vec3 {
    let separation = eclipse_separation(amount, params);
    let (right, _) = tangent_basis(sun_direction);
    (sun_direction * separation.cos() + right * separation.sin()).normalize()
}

/// Fraction of the solar disc area hidden by the moon, `[0, 1]`.
pub fn eclipse_occlusion(amount: f32, params: &DiscParams) -> f32 {
    if amount <= 0.0 {
        return 0.0;
    }
    circle_overlap_fraction(
        params.sun_angular_radius,
        params.moon_angular_radius,
        eclipse_separation(amount, params),
    )
}

/// Overlap area of circle `b` on circle `a`, as a fraction of `a`'s area.
fn circle_overlap_fraction(ra: f32, rb: f32, d: f32) -> f32 {
    if d >= ra + rb {
        return 0.0;
    }
    if d <= (rb - ra).abs() {
        let inner = ra.min(rb);
        return saturate((inner * inner) / (ra * ra));
    }
    let (ra2, rb2, d2) = (ra * ra, rb * rb, d * d);
    let alpha = ((d2 + ra2 - rb2) / (2.0 * d * ra)).clamp(-1.0, 1.0).acos();
    let beta = ((d2 + rb2 - ra2) / (2.0 * d * rb)).clamp(-1.0, 1.0).acos();
    let kite = ((-d + ra + rb) * (d + ra - rb) * (d - ra + rb) * (d + ra + rb))
        .max(0.0)
        .sqrt();
    let area = ra2 * alpha + rb2 * beta - 0.5 * kite;
    saturate(area / (std::f32::consts::PI * ra2))
}

/// Corona glow around the eclipsed sun. Zero until 90 % totality.
pub fn corona_intensity(view: Vec3, sun_direction: Vec3, amount: f32, params: &DiscParams) -> f32 {
    let strength = smoothstep(0.9, 1.0, amount);
    if strength <= 0.0 {
        return 0.0;
    }
    let radius = params.sun_angular_radius;
    let beyond_limb = (angle_between(view, sun_direction) - radius).max(0.0) / radius;
    strength * (-1.2 * beyond_limb).exp()
}

/// Sun disc sample with the eclipse applied.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SolarDiscSample {
    /// Visible photosphere coverage, `[0, 1]`.
    pub disc: f32,
    /// Corona glow, `[0, 1]`.
    pub corona: f32,
}

pub fn solar_disc(
    view: Vec3,
    sun_direction: Vec3,
    eclipse_amount: f32,
    params: &DiscParams,
) -> SolarDiscSample {
    let mut disc = sun_disc(
        view,
        sun_direction,
        params.sun_angular_radius,
        params.edge_softness,
    );
    if eclipse_amount > 0.0 && disc > 0.0 {
        let moon = eclipse_moon_direction(sun_direction, eclipse_amount, params);
        let silhouette = sun_disc(view, moon, params.moon_angular_radius, params.edge_softness);
        disc *= 1.0 - silhouette;
    }
    SolarDiscSample {
        disc,
        corona: corona_intensity(view, sun_direction, eclipse_amount, params),
    }
}

/// Lit fraction of the lunar disc for a given light direction: 0.5 at
/// quadrature, 1 when the light comes from behind the viewer.
pub fn lunar_phase_mask(moon_direction: Vec3, light_direction: Vec3) -> f32 {
    let cos_phase_angle = -light_direction
        .normalize_or_zero()
        .dot(moon_direction.normalize_or_zero());
    saturate(0.5 * (1.0 + cos_phase_angle))
}

/// Synthetic light direction reproducing a synodic phase (0 new, 0.5 full)
/// for a moon at `moon_direction`. Used when the phase is overridden.
pub fn lunar_light_direction(moon_direction: Vec3, phase: f32) -> Vec3 {
    let elongation = phase.rem_euclid(1.0) * std::f32::consts::TAU;
    let (right, _) = tangent_basis(moon_direction);
    (moon_direction * elongation.cos() + right * elongation.sin()).normalize()
}

/// One pixel of the lunar disc.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoonDiscSample {
    /// Antialiased disc coverage, `[0, 1]`.
    pub coverage: f32,
    /// Lambert shading floored by earthshine, `[0, 1]`.
    pub shade: f32,
}

impl MoonDiscSample {
    pub fn intensity(&self) -> f32 {
        self.coverage * self.shade
    }
}

/// Shade the lunar disc: tangent-plane coordinates are lifted onto a unit
/// sphere facing the viewer and lit with Lambert against `light_direction`.
pub fn moon_disc(
    view: Vec3,
    moon_direction: Vec3,
    light_direction: Vec3,
    earthshine: f32,
    params: &DiscParams,
) -> MoonDiscSample {
    if view.dot(moon_direction) <= 0.0 {
        return MoonDiscSample::default();
    }
    let radius = params.moon_angular_radius;
    let coverage = sun_disc(view, moon_direction, radius, params.edge_softness);
    if coverage <= 0.0 {
        return MoonDiscSample::default();
    }

    let (right, up) = tangent_basis(moon_direction);
    let local = Vec2::new(view.dot(right), view.dot(up)) / radius.sin();
    let r2 = local.length_squared().min(1.0);
    let z = (1.0 - r2).sqrt();
    let normal = right * local.x + up * local.y - moon_direction * z;
    let lambert = normal.dot(light_direction).max(0.0);

    MoonDiscSample {
        coverage,
        shade: lambert.max(earthshine.max(0.0)).min(1.0),
    }
}
