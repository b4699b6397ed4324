//! Owner of the static lookup tables.

use std::time::Instant;

use glam::Vec3;
use skylight_celestial::CelestialState;
use tracing::info;

use crate::error::AtmosphereError;
use crate::integrate::{LightSource, ScatteringTables};
use crate::irradiance::IrradianceLuts;
use crate::lut::worker_count;
use crate::multiscatter::MultiScatterLut;
use crate::params::AtmosphereParams;
use crate::sky_view::SkyViewLut;
use crate::transmittance::TransmittanceLut;

/// Atmosphere parameters together with the tables that depend only on them.
///
/// The transmittance table is built first; the multiple-scattering and
/// irradiance tables read it.
#[derive(Clone, Debug)]
pub struct AtmosphereModel {
    params: AtmosphereParams,
    threads: usize,
    transmittance: TransmittanceLut,
    multiscatter: MultiScatterLut,
    irradiance: IrradianceLuts,
}

struct StaticTables {
    transmittance: TransmittanceLut,
    multiscatter: MultiScatterLut,
    irradiance: IrradianceLuts,
}

fn build_static(params: &AtmosphereParams, threads: usize) -> StaticTables {
    let start = Instant::now();
    let transmittance = TransmittanceLut::build(params, threads);
    let multiscatter = MultiScatterLut::build(params, &transmittance, threads);
    let irradiance = IrradianceLuts::build(params, &transmittance, threads);
    info!(
        threads,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "static atmosphere LUTs built"
    );
    StaticTables {
        transmittance,
        multiscatter,
        irradiance,
    }
}

impl AtmosphereModel {
    /// Validate `params` and build the static tables on `threads` workers
    /// (zero uses every CPU).
    pub fn new(params: AtmosphereParams, threads: usize) -> Result<Self, AtmosphereError> {
        params.validate()?;
        let threads = worker_count(threads);
        let tables = build_static(&params, threads);
        Ok(Self {
            params,
            threads,
            transmittance: tables.transmittance,
            multiscatter: tables.multiscatter,
            irradiance: tables.irradiance,
        })
    }

    /// Replace the parameters, rebuilding the tables only when they changed.
    /// Returns whether a rebuild happened.
    pub fn set_params(&mut self, params: AtmosphereParams) -> Result<bool, AtmosphereError> {
        if params == self.params {
            return Ok(false);
        }
        params.validate()?;
        let tables = build_static(&params, self.threads);
        self.params = params;
        self.transmittance = tables.transmittance;
        self.multiscatter = tables.multiscatter;
        self.irradiance = tables.irradiance;
        Ok(true)
    }

    pub fn params(&self) -> &AtmosphereParams {
        &self.params
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn transmittance(&self) -> &TransmittanceLut {
        &self.transmittance
    }

    pub fn multiscatter(&self) -> &MultiScatterLut {
        &self.multiscatter
    }

    pub fn irradiance(&self) -> &IrradianceLuts {
        &self.irradiance
    }

    pub fn tables(&self) -> ScatteringTables<'_> {
        ScatteringTables {
            transmittance: &self.transmittance,
            multiscatter: Some(&self.multiscatter),
        }
    }

    /// Distance from the planet centre of a camera `altitude_km` up.
    pub fn camera_radius(&self, altitude_km: f32) -> f32 {
        self.params.camera_position(altitude_km).y
    }

    /// Sun and moon as seen by the scattering integrals.
    pub fn lights(&self, celestial: &CelestialState) -> [LightSource; 2] {
        let solar = self.params.solar_irradiance;
        [
            LightSource::new(celestial.sun_direction, celestial.sun_illuminance(solar)),
            LightSource::new(celestial.moon_direction, celestial.moon_illuminance(solar)),
        ]
    }

    pub fn build_sky_view(&self, camera_altitude_km: f32, celestial: &CelestialState) -> SkyViewLut {
        self.build_sky_view_with(camera_altitude_km, &self.lights(celestial))
    }

    pub fn build_sky_view_with(&self, camera_altitude_km: f32, lights: &[LightSource]) -> SkyViewLut {
        SkyViewLut::build(
            &self.params,
            self.tables(),
            camera_altitude_km,
            lights,
            self.threads,
        )
    }

    /// Transmittance from a planet-centred `position` towards a light in
    /// direction `dir`, planet shadow included.
    pub fn light_transmittance(&self, position: Vec3, dir: Vec3) -> Vec3 {
        let r = position.length().max(self.params.planet_radius);
        let mu = position.dot(dir) / position.length().max(1e-6);
        self.transmittance.to_sun(r, mu)
    }

    /// Uniform sky radiance lighting a planet-centred `position` from above,
    /// from sun and moon together. Light elevations are taken against the
    /// local zenith of `position`.
    pub fn ambient_radiance(&self, position: Vec3, celestial: &CelestialState) -> Vec3 {
        let r = position.length().max(self.params.planet_radius);
        let zenith = position.normalize_or(Vec3::Y);
        self.lights(celestial)
            .iter()
            .map(|light| {
                let mu_s = zenith.dot(light.direction);
                self.irradiance.ambient_radiance(r, mu_s) * light.illuminance
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylight_celestial::CelestialSettings;

    #[test]
    fn test_rejects_invalid_params() {
        let params = AtmosphereParams {
            planet_radius: -1.0,
            ..AtmosphereParams::earth()
        };
        assert!(AtmosphereModel::new(params, 2).is_err());
    }

    #[test]
    fn test_set_params_rebuilds_only_on_change() {
        let mut model = AtmosphereModel::new(AtmosphereParams::earth(), 4).unwrap();
        assert!(!model.set_params(AtmosphereParams::earth()).unwrap());

        let before = model.transmittance().sample(6372.0, 0.1);
        let hazy = AtmosphereParams {
            mie_scattering: 0.02,
            ..AtmosphereParams::earth()
        };
        assert!(model.set_params(hazy).unwrap());
        let after = model.transmittance().sample(6372.0, 0.1);
        assert!(after.max_element() < before.max_element());

        let broken = AtmosphereParams {
            ground_albedo: 2.0,
            ..AtmosphereParams::earth()
        };
        assert!(model.set_params(broken).is_err());
        assert_eq!(model.params().mie_scattering, 0.02, "failed update keeps state");
    }

    #[test]
    fn test_lights_follow_celestial_state() {
        let model = AtmosphereModel::new(AtmosphereParams::earth(), 4).unwrap();
        let settings = CelestialSettings::default();
        let sun = Vec3::new(0.0, 0.5, 0.866);
        let state = CelestialState::from_directions(sun, -Vec3::Y, 2451545.0, &settings);
        let [sun_light, moon_light] = model.lights(&state);
        assert!((sun_light.direction - sun).length() < 1e-5);
        assert_eq!(sun_light.illuminance, model.params().solar_irradiance);
        assert_eq!(moon_light.illuminance, Vec3::ZERO);
        let ambient = model.ambient_radiance(model.params().camera_position(0.2), &state);
        assert!(ambient.z > ambient.x, "daylight ambient is blue: {ambient:?}");
    }

    #[test]
    fn test_ambient_uses_local_zenith() {
        let model = AtmosphereModel::new(AtmosphereParams::earth(), 4).unwrap();
        let settings = CelestialSettings::default();
        let r = model.params().planet_radius + 0.2;
        let state = CelestialState::from_directions(Vec3::Y, -Vec3::Y, 2451545.0, &settings);
        let solar = model.params().solar_irradiance;

        // A point a quarter of the way around the planet sees the sun on
        // its horizon, not overhead.
        let tilted = Vec3::new(1.0, 1.0, 0.0).normalize() * r;
        let expected = model.irradiance().ambient_radiance(r, tilted.y / r) * solar;
        let ambient = model.ambient_radiance(tilted, &state);
        assert!(
            (ambient - expected).abs().max_element() <= 1e-4 * expected.max_element(),
            "{ambient:?} vs {expected:?}"
        );
        let overhead = model.ambient_radiance(Vec3::Y * r, &state);
        assert!(overhead.max_element() > ambient.max_element());

        // Rotating the sun together with the point gives the overhead value.
        let following = CelestialState::from_directions(
            tilted / r,
            -tilted / r,
            2451545.0,
            &settings,
        );
        let rotated = model.ambient_radiance(tilted, &following);
        assert!((rotated - overhead).abs().max_element() <= 1e-3 * overhead.max_element());
    }
}
