//! Spherical cloud shell and its density field.

use glam::{Vec2, Vec3, Vec4};
use skylight_config::{CloudConfig, CloudStyle};
use skylight_math::{RayInterval, lerp, ray_sphere_intersect, saturate, smoothstep};
use tracing::warn;

use crate::cloud_noise::CloudNoise;

/// Extinction of a fully dense cloud, per kilometre.
pub const CLOUD_EXTINCTION_PER_KM: f32 = 30.0;

/// Weight of the baked map base against the live 3D noise.
const MAP_BLEND: f32 = 0.35;

/// Cloud layer geometry and shaping controls, planet-centred kilometres.
#[derive(Clone, Debug, PartialEq)]
pub struct CloudLayer {
    pub enabled: bool,
    pub style: CloudStyle,
    pub bottom_radius: f32,
    pub top_radius: f32,
    pub coverage: f32,
    pub density: f32,
    /// Wind velocity in km/s on the horizontal plane (x, z).
    pub wind: Vec2,
    pub detail_scale: f32,
    pub sharpness: f32,
    pub primary_steps: u32,
    pub light_steps: u32,
    pub max_distance: f32,
    pub seed: u32,
}

impl CloudLayer {
    pub fn from_config(config: &CloudConfig, planet_radius: f32) -> Self {
        let bottom = config.bottom_km.max(0.0);
        let top = config.top_km.max(bottom + 0.01);
        if bottom != config.bottom_km || top != config.top_km {
            warn!(
                bottom_km = config.bottom_km,
                top_km = config.top_km,
                "cloud layer bounds clamped to {bottom}..{top} km"
            );
        }
        Self {
            enabled: config.enabled,
            style: config.style,
            bottom_radius: planet_radius + bottom,
            top_radius: planet_radius + top,
            coverage: saturate(config.coverage),
            density: config.density.max(0.0),
            wind: Vec2::from_array(config.wind_direction).normalize_or_zero()
                * config.wind_speed_km_s,
            detail_scale: config.detail_scale.max(0.0),
            sharpness: saturate(config.sharpness),
            primary_steps: config.primary_steps.max(1),
            light_steps: config.light_steps.max(1),
            max_distance: config.max_distance_km.max(0.0),
            seed: config.seed,
        }
    }

    pub fn thickness(&self) -> f32 {
        self.top_radius - self.bottom_radius
    }

    /// Mid-shell radius, where the cloud map is projected.
    pub fn mid_radius(&self) -> f32 {
        0.5 * (self.bottom_radius + self.top_radius)
    }

    /// Fractional height of `p` inside the shell, `[0, 1]`.
    pub fn height_fraction(&self, p: Vec3) -> f32 {
        saturate((p.length() - self.bottom_radius) / self.thickness())
    }

    pub fn contains(&self, p: Vec3) -> bool {
        let r = p.length();
        r >= self.bottom_radius && r <= self.top_radius
    }

    /// Horizontal wind displacement after `time_s` seconds.
    pub fn wind_offset(&self, time_s: f32) -> Vec3 {
        let d = self.wind * time_s;
        Vec3::new(d.x, 0.0, d.y)
    }

    /// Segment of the ray inside the shell, clipped to the march distance.
    /// Rays blocked by the planet before reaching the shell are empty.
    pub fn intersect(&self, origin: Vec3, dir: Vec3, planet_radius: f32) -> RayInterval {
        let outer = ray_sphere_intersect(origin, dir, self.top_radius).forward();
        if outer.is_empty() {
            return RayInterval::EMPTY;
        }
        let inner = ray_sphere_intersect(origin, dir, self.bottom_radius);
        let r = origin.length();

        let (start, end) = if r < self.bottom_radius {
            let ground = ray_sphere_intersect(origin, dir, planet_radius);
            if ground.hits_ahead() && ground.near > 0.0 {
                return RayInterval::EMPTY;
            }
            (inner.far.max(0.0), outer.far)
        } else {
            let end = if inner.hits_ahead() && inner.near > 0.0 {
                inner.near
            } else {
                outer.far
            };
            (outer.near, end)
        };
        let end = end.min(start + self.max_distance);
        if end <= start {
            RayInterval::EMPTY
        } else {
            RayInterval::new(start, end)
        }
    }
}

/// Vertical profile: rounded base, tapering top. `cloud_type` in `[0, 1]`
/// raises the top from flat layers to towering cumulus.
pub fn height_gradient(height: f32, cloud_type: f32) -> f32 {
    let top = lerp(0.45, 1.0, saturate(cloud_type));
    smoothstep(0.0, 0.12, height) * (1.0 - smoothstep(top * 0.6, top, height))
}

/// Density field of one cloud layer for one frame.
#[derive(Clone, Copy, Debug)]
pub struct CloudDensity<'a> {
    pub layer: &'a CloudLayer,
    pub noise: &'a CloudNoise,
    pub wind_offset: Vec3,
}

impl CloudDensity<'_> {
    /// Cloud density at `p` in `[0, layer.density]`. `map` is the cloud-map
    /// texel along the view ray, used by [`CloudStyle::Paraboloid`].
    pub fn sample(&self, p: Vec3, map: Option<Vec4>) -> f32 {
        let layer = self.layer;
        if layer.coverage <= 0.0 || !layer.contains(p) {
            return 0.0;
        }
        // Paraboloid maps blend their baked base into the 3D noise, scale
        // coverage by the weather mask and pick the vertical profile.
        let (coverage, cloud_type, baked) = match (layer.style, map) {
            (CloudStyle::Paraboloid, Some(texel)) => (
                saturate(layer.coverage * (0.5 + texel.z)),
                texel.w,
                Some((texel.x, texel.y)),
            ),
            _ => (layer.coverage, 0.5, None),
        };
        if coverage <= 0.0 {
            return 0.0;
        }

        let q = p + self.wind_offset;
        let gradient = height_gradient(layer.height_fraction(p), cloud_type);
        let mut base = self.noise.base(q);
        let mut erosion = 0.5;
        if let Some((baked_base, baked_detail)) = baked {
            base = lerp(base, baked_base, MAP_BLEND);
            erosion *= 0.5 + baked_detail;
        }
        let edge = (coverage * lerp(1.0, 0.1, layer.sharpness)).max(1e-3);
        let shape = saturate((base * gradient - (1.0 - coverage)) / edge);
        if shape <= 0.0 {
            return 0.0;
        }
        let detail = self.noise.detail(q);
        let eroded = saturate(shape - (1.0 - detail) * (1.0 - shape) * erosion);
        eroded * layer.density
    }

    /// Extinction coefficient at `p`, per kilometre.
    pub fn extinction(&self, p: Vec3, map: Option<Vec4>) -> f32 {
        self.sample(p, map) * CLOUD_EXTINCTION_PER_KM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANET: f32 = 6371.0;

    fn layer() -> CloudLayer {
        CloudLayer::from_config(&CloudConfig::default(), PLANET)
    }

    #[test]
    fn test_from_config_radii() {
        let layer = layer();
        assert_eq!(layer.bottom_radius, PLANET + 1.5);
        assert_eq!(layer.top_radius, PLANET + 4.0);
        assert!((layer.wind.length() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_intersect_from_ground() {
        let layer = layer();
        let origin = Vec3::new(0.0, PLANET + 0.2, 0.0);
        let up = layer.intersect(origin, Vec3::Y, PLANET);
        assert!((up.near - 1.3).abs() < 1e-3, "enter at {}", up.near);
        assert!((up.far - 3.8).abs() < 1e-3, "exit at {}", up.far);
        assert!(layer.intersect(origin, -Vec3::Y, PLANET).is_empty());
        let grazing = layer.intersect(origin, Vec3::X, PLANET);
        assert!(!grazing.is_empty());
        assert!(grazing.length() <= layer.max_distance + 1e-3);
    }

    #[test]
    fn test_intersect_from_inside_and_above() {
        let layer = layer();
        let inside = Vec3::new(0.0, PLANET + 2.0, 0.0);
        let up = layer.intersect(inside, Vec3::Y, PLANET);
        assert_eq!(up.near, 0.0);
        assert!((up.far - 2.0).abs() < 1e-3);
        let down = layer.intersect(inside, -Vec3::Y, PLANET);
        assert!((down.far - 0.5).abs() < 1e-3);

        let above = Vec3::new(0.0, PLANET + 10.0, 0.0);
        let down = layer.intersect(above, -Vec3::Y, PLANET);
        assert!((down.near - 6.0).abs() < 1e-3 && (down.far - 8.5).abs() < 1e-3);
        assert!(layer.intersect(above, Vec3::Y, PLANET).is_empty());
    }

    #[test]
    fn test_height_gradient_shape() {
        assert_eq!(height_gradient(0.0, 0.5), 0.0);
        assert_eq!(height_gradient(1.0, 1.0), 0.0);
        assert!(height_gradient(0.3, 0.5) > 0.9);
        assert!(height_gradient(0.6, 1.0) > height_gradient(0.6, 0.0));
    }

    #[test]
    fn test_zero_coverage_has_no_density() {
        let layer = CloudLayer {
            coverage: 0.0,
            ..layer()
        };
        let noise = CloudNoise::new(1, 2.5);
        let field = CloudDensity {
            layer: &layer,
            noise: &noise,
            wind_offset: Vec3::ZERO,
        };
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.37, PLANET + 2.0 + (i % 7) as f32 * 0.2, i as f32 * 0.11);
            assert_eq!(field.sample(p, Some(Vec4::ONE)), 0.0);
        }
    }

    #[test]
    fn test_density_bounded_by_layer_density() {
        let layer = CloudLayer {
            coverage: 1.0,
            density: 0.7,
            ..layer()
        };
        let noise = CloudNoise::new(1, 2.5);
        let field = CloudDensity {
            layer: &layer,
            noise: &noise,
            wind_offset: Vec3::ZERO,
        };
        let mut any = false;
        for i in 0..500 {
            let p = Vec3::new(i as f32 * 0.91, PLANET + 2.0, i as f32 * 0.53);
            let d = field.sample(p, None);
            assert!((0.0..=0.7).contains(&d));
            any |= d > 0.0;
        }
        assert!(any, "full coverage produces clouds");
        assert_eq!(field.sample(Vec3::new(0.0, PLANET + 0.5, 0.0), None), 0.0);
    }
}
