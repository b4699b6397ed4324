//! Physical description of the atmosphere.
//!
//! Lengths are kilometres and scattering coefficients are per kilometre.
//! Positions are planet-centred with +Y up.

use glam::Vec3;
use skylight_config::AtmosphereConfig;

use crate::error::AtmosphereError;

/// Planet and participating-media parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct AtmosphereParams {
    pub planet_radius: f32,
    pub atmosphere_radius: f32,
    pub rayleigh_scattering: Vec3,
    pub rayleigh_scale_height: f32,
    pub mie_scattering: f32,
    pub mie_absorption: f32,
    pub mie_scale_height: f32,
    /// Henyey-Greenstein `g` used by the Cornette-Shanks phase.
    pub mie_anisotropy: f32,
    pub ozone_absorption: Vec3,
    /// Altitude of the ozone density peak.
    pub ozone_center: f32,
    pub ozone_width: f32,
    /// Top-of-atmosphere solar illuminance.
    pub solar_irradiance: Vec3,
    /// Angular radius of the sun, radians.
    pub sun_angular_radius: f32,
    pub ground_albedo: f32,
}

impl Default for AtmosphereParams {
    fn default() -> Self {
        Self::earth()
    }
}

impl From<&AtmosphereConfig> for AtmosphereParams {
    fn from(config: &AtmosphereConfig) -> Self {
        Self {
            planet_radius: config.planet_radius_km,
            atmosphere_radius: config.atmosphere_radius_km,
            rayleigh_scattering: Vec3::from_array(config.rayleigh_scattering),
            rayleigh_scale_height: config.rayleigh_scale_height_km,
            mie_scattering: config.mie_scattering,
            mie_absorption: config.mie_absorption,
            mie_scale_height: config.mie_scale_height_km,
            mie_anisotropy: config.mie_anisotropy,
            ozone_absorption: Vec3::from_array(config.ozone_absorption),
            ozone_center: config.ozone_center_km,
            ozone_width: config.ozone_width_km,
            solar_irradiance: Vec3::from_array(config.solar_irradiance),
            sun_angular_radius: config.sun_angular_radius,
            ground_albedo: config.ground_albedo,
        }
    }
}

impl AtmosphereParams {
    /// Earth-like defaults.
    pub fn earth() -> Self {
        Self::from(&AtmosphereConfig::default())
    }

    /// Check every invariant the LUT builders depend on.
    pub fn validate(&self) -> Result<(), AtmosphereError> {
        let positive = [
            ("planet_radius", self.planet_radius),
            ("rayleigh_scale_height", self.rayleigh_scale_height),
            ("mie_scale_height", self.mie_scale_height),
            ("ozone_width", self.ozone_width),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AtmosphereError::InvalidParameter {
                    field,
                    reason: "must be finite and positive",
                });
            }
        }
        if !(self.atmosphere_radius.is_finite() && self.atmosphere_radius > self.planet_radius) {
            return Err(AtmosphereError::InvalidParameter {
                field: "atmosphere_radius",
                reason: "must exceed the planet radius",
            });
        }
        let non_negative = [
            ("rayleigh_scattering", self.rayleigh_scattering.min_element()),
            ("mie_scattering", self.mie_scattering),
            ("mie_absorption", self.mie_absorption),
            ("ozone_absorption", self.ozone_absorption.min_element()),
            ("solar_irradiance", self.solar_irradiance.min_element()),
            ("ozone_center", self.ozone_center),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AtmosphereError::InvalidParameter {
                    field,
                    reason: "must be finite and non-negative",
                });
            }
        }
        if !(self.mie_anisotropy > -1.0 && self.mie_anisotropy < 1.0) {
            return Err(AtmosphereError::InvalidParameter {
                field: "mie_anisotropy",
                reason: "must lie in (-1, 1)",
            });
        }
        if !(self.sun_angular_radius > 0.0 && self.sun_angular_radius < 0.5) {
            return Err(AtmosphereError::InvalidParameter {
                field: "sun_angular_radius",
                reason: "must lie in (0, 0.5) radians",
            });
        }
        if !(0.0..=1.0).contains(&self.ground_albedo) {
            return Err(AtmosphereError::InvalidParameter {
                field: "ground_albedo",
                reason: "must lie in [0, 1]",
            });
        }
        Ok(())
    }

    /// Height of the atmosphere shell above the ground.
    pub fn thickness(&self) -> f32 {
        self.atmosphere_radius - self.planet_radius
    }

    /// Mie extinction (scattering plus absorption) at sea level.
    pub fn mie_extinction(&self) -> f32 {
        self.mie_scattering + self.mie_absorption
    }

    /// Planet-centred position of a camera `altitude_km` above the ground.
    /// The altitude is kept just inside the shell.
    pub fn camera_position(&self, altitude_km: f32) -> Vec3 {
        let altitude = altitude_km.clamp(1e-3, self.thickness() - 1e-3);
        Vec3::new(0.0, self.planet_radius + altitude, 0.0)
    }

    /// Altitude above the ground of a planet-centred position.
    pub fn altitude(&self, position: Vec3) -> f32 {
        position.length() - self.planet_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earth_defaults_validate() {
        let params = AtmosphereParams::earth();
        assert!(params.validate().is_ok());
        assert_eq!(params.planet_radius, 6371.0);
        assert_eq!(params.thickness(), 100.0);
    }

    #[test]
    fn test_rejects_inverted_radii() {
        let params = AtmosphereParams {
            atmosphere_radius: 6000.0,
            ..AtmosphereParams::earth()
        };
        assert!(matches!(
            params.validate(),
            Err(AtmosphereError::InvalidParameter {
                field: "atmosphere_radius",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_positive_scale_height() {
        for height in [0.0, -1.0, f32::NAN] {
            let params = AtmosphereParams {
                rayleigh_scale_height: height,
                ..AtmosphereParams::earth()
            };
            assert!(params.validate().is_err(), "scale height {height} accepted");
        }
    }

    #[test]
    fn test_rejects_negative_coefficients() {
        let params = AtmosphereParams {
            rayleigh_scattering: Vec3::new(1e-3, -1e-3, 1e-3),
            ..AtmosphereParams::earth()
        };
        assert!(params.validate().is_err());
        let params = AtmosphereParams {
            mie_anisotropy: 1.0,
            ..AtmosphereParams::earth()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_camera_position_stays_inside_shell() {
        let params = AtmosphereParams::earth();
        let ground = params.camera_position(-5.0);
        assert!(params.altitude(ground) > 0.0);
        let space = params.camera_position(500.0);
        assert!(space.length() < params.atmosphere_radius);
        let camera = params.camera_position(0.2);
        assert!((params.altitude(camera) - 0.2).abs() < 1e-3);
    }
}
