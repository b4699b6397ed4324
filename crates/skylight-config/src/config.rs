//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Physical atmosphere parameters.
    pub atmosphere: AtmosphereConfig,
    /// Volumetric cloud layer.
    pub clouds: CloudConfig,
    /// Height fog and aerial perspective.
    pub fog: FogConfig,
    /// Date, location and sun/moon controls.
    pub celestial: CelestialConfig,
    /// Sky reconstruction and star field.
    pub sky: SkyConfig,
    /// Offline renderer output.
    pub render: RenderConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Atmosphere parameters. Lengths in kilometres, coefficients per kilometre.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtmosphereConfig {
    pub planet_radius_km: f32,
    pub atmosphere_radius_km: f32,
    /// Rayleigh scattering at sea level (RGB).
    pub rayleigh_scattering: [f32; 3],
    pub rayleigh_scale_height_km: f32,
    pub mie_scattering: f32,
    pub mie_absorption: f32,
    pub mie_scale_height_km: f32,
    /// Cornette-Shanks asymmetry parameter.
    pub mie_anisotropy: f32,
    /// Ozone absorption at the layer peak (RGB).
    pub ozone_absorption: [f32; 3],
    pub ozone_center_km: f32,
    pub ozone_width_km: f32,
    /// Solar irradiance at the top of the atmosphere (RGB).
    pub solar_irradiance: [f32; 3],
    /// Angular radius of the sun disc in radians.
    pub sun_angular_radius: f32,
    pub ground_albedo: f32,
}

/// Which density source drives the cloud raymarcher.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CloudStyle {
    /// Pure 3D fractal noise.
    Procedural,
    /// Noise modulated by the per-frame paraboloid cloud map.
    #[default]
    Paraboloid,
}

/// Volumetric cloud layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CloudConfig {
    pub enabled: bool,
    pub style: CloudStyle,
    /// Layer bottom above the surface, km.
    pub bottom_km: f32,
    /// Layer top above the surface, km.
    pub top_km: f32,
    /// Sky fraction covered, `[0, 1]`.
    pub coverage: f32,
    /// Density multiplier, `[0, 2]`.
    pub density: f32,
    /// Horizontal wind direction (x, z).
    pub wind_direction: [f32; 2],
    /// Wind speed in km/s.
    pub wind_speed_km_s: f32,
    /// Frequency multiplier for the detail noise.
    pub detail_scale: f32,
    /// Edge sharpness of the coverage mask.
    pub sharpness: f32,
    pub primary_steps: u32,
    pub light_steps: u32,
    /// Maximum march length, km.
    pub max_distance_km: f32,
    /// Noise seed.
    pub seed: u32,
}

/// Height fog and aerial perspective. Lengths in metres (scene units).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FogConfig {
    pub enabled: bool,
    pub base_height_m: f32,
    pub scale_height_m: f32,
    /// Scattering density at `base_height_m`, per metre.
    pub density: f32,
    /// Absorption at `base_height_m`, per metre.
    pub absorption: f32,
    /// Centre height of the ground-hugging layer.
    pub layer_height_m: f32,
    pub layer_thickness_m: f32,
    pub layer_density: f32,
    /// Distance at which the large-scale scattering blend saturates.
    pub max_blend_distance_m: f32,
    /// Steps used for the camera-to-fragment scattering integral.
    pub aerial_steps: u32,
}

/// Date, observer location and sun/moon controls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CelestialConfig {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Local time of day in hours, `[0, 24)`.
    pub hour: f64,
    /// Offset from UTC in hours.
    pub timezone_offset_hours: f64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Real-time seconds per simulated day (0 = frozen).
    pub day_duration_seconds: f64,
    pub eclipse_enabled: bool,
    /// Eclipse fraction, `[0, 1]`.
    pub eclipse_amount: f32,
    /// Floor brightness of the unlit lunar disc.
    pub earthshine: f32,
    pub moon_brightness: f32,
    pub moon_disc_intensity: f32,
    /// Force a lunar phase (0 new, 0.5 full) instead of the computed one.
    pub moon_phase_override: Option<f32>,
}

/// Sky reconstruction settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkyConfig {
    pub exposure: f32,
    /// Minimum night-sky radiance (RGB).
    pub night_floor: [f32; 3],
    pub halo_strength: f32,
    /// Fraction of star cells that contain a star.
    pub star_density: f32,
    pub star_brightness: f32,
    /// Cosine change in sun/moon direction that invalidates the sky-view table.
    pub sky_view_direction_threshold: f32,
    /// Camera altitude change (km) that invalidates the sky-view table.
    pub sky_view_altitude_threshold_km: f32,
}

/// Panorama projection used by the offline renderer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Projection {
    /// Full sphere, azimuth across, elevation down.
    #[default]
    Equirectangular,
    /// Upper hemisphere, zenith at the centre.
    Fisheye,
}

/// Offline renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub projection: Projection,
    /// Camera height above the surface in metres.
    pub camera_altitude_m: f32,
    /// Worker threads for table builds and rendering (0 = one per core).
    pub threads: usize,
    /// Output image path. With more than one frame the frame index is
    /// appended to the file stem.
    pub output: String,
    /// Frames to render in sequence.
    pub frames: u32,
    /// Real-time seconds between frames, fed to the day/night clock.
    pub frame_interval_s: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write every LUT to PNG after building.
    pub export_luts: bool,
    pub lut_export_dir: String,
}

// --- Default implementations ---

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            planet_radius_km: 6371.0,
            atmosphere_radius_km: 6471.0,
            rayleigh_scattering: [5.802e-3, 13.558e-3, 33.1e-3],
            rayleigh_scale_height_km: 8.0,
            mie_scattering: 3.996e-3,
            mie_absorption: 4.4e-3,
            mie_scale_height_km: 1.2,
            mie_anisotropy: 0.8,
            ozone_absorption: [0.65e-3, 1.881e-3, 0.085e-3],
            ozone_center_km: 25.0,
            ozone_width_km: 15.0,
            solar_irradiance: [1.474, 1.8504, 1.91198],
            sun_angular_radius: 0.00935 / 2.0,
            ground_albedo: 0.3,
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            style: CloudStyle::Paraboloid,
            bottom_km: 1.5,
            top_km: 4.0,
            coverage: 0.6,
            density: 0.3,
            wind_direction: [1.0, 0.0],
            wind_speed_km_s: 0.01,
            detail_scale: 2.5,
            sharpness: 0.3,
            primary_steps: 32,
            light_steps: 6,
            max_distance_km: 60.0,
            seed: 1337,
        }
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_height_m: 0.0,
            scale_height_m: 300.0,
            density: 0.003,
            absorption: 0.003,
            layer_height_m: 0.0,
            layer_thickness_m: 30.0,
            layer_density: 0.008,
            max_blend_distance_m: 20_000.0,
            aerial_steps: 8,
        }
    }
}

impl Default for CelestialConfig {
    fn default() -> Self {
        Self {
            year: 2024,
            month: 6,
            day: 21,
            hour: 12.0,
            timezone_offset_hours: 0.0,
            latitude_deg: 51.5074,
            longitude_deg: -0.1278,
            day_duration_seconds: 0.0,
            eclipse_enabled: false,
            eclipse_amount: 0.0,
            earthshine: 0.02,
            moon_brightness: 1.0,
            moon_disc_intensity: 1.0,
            moon_phase_override: None,
        }
    }
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            exposure: 8.0,
            night_floor: [0.0004, 0.0006, 0.0012],
            halo_strength: 1.0,
            star_density: 0.04,
            star_brightness: 0.6,
            sky_view_direction_threshold: 1e-4,
            sky_view_altitude_threshold_km: 0.05,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 512,
            projection: Projection::Equirectangular,
            camera_altitude_m: 200.0,
            threads: 0,
            output: "sky.png".to_string(),
            frames: 1,
            frame_interval_s: 1.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            export_luts: false,
            lut_export_dir: "luts".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: config_dir.join(CONFIG_FILE_NAME),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(config_dir.join(CONFIG_FILE_NAME), serialized).map_err(write_error)
    }

    /// Re-read the file; `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;
        if &fresh != self {
            log::info!("Config reloaded with changes");
            Ok(Some(fresh))
        } else {
            Ok(None)
        }
    }

    /// Reject values that would make the renderer produce garbage.
    ///
    /// Soft ranges (coverage, density, eclipse amount) are clamped by their
    /// consumers instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.atmosphere;
        if a.planet_radius_km <= 0.0 {
            return Err(invalid("atmosphere.planet_radius_km", "must be positive"));
        }
        if a.atmosphere_radius_km <= a.planet_radius_km {
            return Err(invalid(
                "atmosphere.atmosphere_radius_km",
                "must exceed planet_radius_km",
            ));
        }
        if self.clouds.top_km <= self.clouds.bottom_km {
            return Err(invalid("clouds.top_km", "must exceed bottom_km"));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(invalid("render.width/height", "must be non-zero"));
        }
        if !(1..=12).contains(&self.celestial.month) || !(1..=31).contains(&self.celestial.day) {
            return Err(invalid("celestial.month/day", "not a calendar date"));
        }
        if self.render.frames == 0 {
            return Err(invalid("render.frames", "must be at least one"));
        }
        if self.render.frame_interval_s.is_nan() || self.render.frame_interval_s < 0.0 {
            return Err(invalid("render.frame_interval_s", "must be non-negative"));
        }
        let day = self.celestial.day_duration_seconds;
        if day.is_nan() || day < 0.0 {
            return Err(invalid("celestial.day_duration_seconds", "must be non-negative"));
        }
        if self.sky.sky_view_direction_threshold < 0.0
            || self.sky.sky_view_altitude_threshold_km < 0.0
        {
            return Err(invalid("sky.sky_view_*_threshold", "must be non-negative"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}
