//! PNG export of lookup tables and rendered images for debugging.
//!
//! Values are scaled and clamped to 8 bits. Single-channel tables are
//! written as grey; two-channel tables as grey (first channel) with the
//! second channel in alpha.

use std::path::{Path, PathBuf};

use glam::Vec4;
use tracing::info;

use crate::error::ExportError;
use crate::lut::{Lut2D, Texel};
use crate::model::AtmosphereModel;
use crate::sky_view::SkyViewLut;

/// Exposure applied to each table so its typical range is visible.
const TRANSMITTANCE_SCALE: f32 = 1.0;
const MULTISCATTER_SCALE: f32 = 20.0;
const IRRADIANCE_SCALE: f32 = 1.0;
const SKY_VIEW_SCALE: f32 = 4.0;

fn to_byte(v: f32) -> u8 {
    if v.is_finite() {
        (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
    } else {
        0
    }
}

/// Convert a table to 8-bit RGBA, scaling the colour channels by `scale`.
pub fn lut_to_rgba8<T: Texel>(lut: &Lut2D<T>, scale: f32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(lut.data().len() * 4);
    for texel in lut.rgba_texels() {
        let rgba = match T::CHANNELS {
            1 => Vec4::new(texel.x * scale, texel.x * scale, texel.x * scale, 1.0),
            2 => Vec4::new(texel.x * scale, texel.x * scale, texel.x * scale, texel.y * scale),
            3 => (texel.truncate() * scale).extend(1.0),
            _ => (texel.truncate() * scale).extend(texel.w),
        };
        bytes.extend(rgba.to_array().map(to_byte));
    }
    bytes
}

/// Encode 8-bit RGBA pixels as a PNG in memory.
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>, ExportError> {
    let mut png_buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(std::io::Cursor::new(&mut png_buf), width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba)?;
    }
    Ok(png_buf)
}

/// Write 8-bit RGBA pixels to `path` as a PNG.
pub fn write_rgba_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<(), ExportError> {
    let encoded = encode_png(width, height, rgba)?;
    std::fs::write(path, encoded)?;
    Ok(())
}

/// Write one table to `path`.
pub fn write_lut_png<T: Texel>(lut: &Lut2D<T>, path: &Path, scale: f32) -> Result<(), ExportError> {
    write_rgba_png(path, lut.width(), lut.height(), &lut_to_rgba8(lut, scale))?;
    info!(path = %path.display(), width = lut.width(), height = lut.height(), "exported LUT");
    Ok(())
}

/// Write the transmittance, multiple-scattering and irradiance tables into
/// `dir`, creating it if needed. Returns the written paths.
pub fn export_static_luts(model: &AtmosphereModel, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let transmittance = dir.join("transmittance.png");
    write_lut_png(model.transmittance().lut(), &transmittance, TRANSMITTANCE_SCALE)?;
    let multiscatter = dir.join("multiscatter.png");
    write_lut_png(model.multiscatter().lut(), &multiscatter, MULTISCATTER_SCALE)?;
    let rayleigh = dir.join("irradiance_rayleigh.png");
    write_lut_png(model.irradiance().rayleigh(), &rayleigh, IRRADIANCE_SCALE)?;
    let mie = dir.join("irradiance_mie.png");
    write_lut_png(model.irradiance().mie(), &mie, IRRADIANCE_SCALE)?;
    Ok(vec![transmittance, multiscatter, rayleigh, mie])
}

/// Write the sky-view table into `dir` as `sky_view.png`.
pub fn export_sky_view(sky_view: &SkyViewLut, dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join("sky_view.png");
    write_lut_png(sky_view.lut(), &path, SKY_VIEW_SCALE)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn read_png(path: &Path) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(std::fs::File::open(path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    #[test]
    fn test_two_channel_maps_to_grey_and_alpha() {
        let mut lut: Lut2D<Vec2> = Lut2D::new(1, 1);
        lut.set(0, 0, Vec2::new(0.5, 1.0));
        let bytes = lut_to_rgba8(&lut, 1.0);
        assert_eq!(bytes, vec![128, 128, 128, 255]);
    }

    #[test]
    fn test_values_are_clamped() {
        let mut lut: Lut2D<Vec3> = Lut2D::new(2, 1);
        lut.set(0, 0, Vec3::new(-1.0, 2.0, f32::NAN));
        lut.set(1, 0, Vec3::new(0.25, 0.5, 1.0));
        let bytes = lut_to_rgba8(&lut, 2.0);
        assert_eq!(&bytes[..4], &[0, 255, 0, 255]);
        assert_eq!(&bytes[4..], &[128, 255, 255, 255]);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let lut = Lut2D::build(8, 4, 2, |x, y| Vec3::new(x as f32 / 8.0, y as f32 / 4.0, 0.5));
        let path = dir.path().join("lut.png");
        write_lut_png(&lut, &path, 1.0).unwrap();
        let (width, height, pixels) = read_png(&path);
        assert_eq!((width, height), (8, 4));
        assert_eq!(pixels.len(), 8 * 4 * 4);
        assert_eq!(&pixels[..4], &lut_to_rgba8(&lut, 1.0)[..4]);
    }

    #[test]
    fn test_export_static_luts_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let model =
            AtmosphereModel::new(crate::params::AtmosphereParams::earth(), 4).unwrap();
        let out = dir.path().join("luts");
        let paths = export_static_luts(&model, &out).unwrap();
        assert_eq!(paths.len(), 4);
        let (width, height, _) = read_png(&paths[0]);
        assert_eq!((width, height), (256, 64));
        let (width, height, _) = read_png(&paths[1]);
        assert_eq!((width, height), (32, 32));
    }
}
