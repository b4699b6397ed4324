//! The skylight command-line renderer.
//!
//! Loads `config.ron`, applies CLI overrides, builds the atmosphere tables
//! for the configured date and place, and writes one tone-mapped panorama
//! per frame while the day/night clock runs.

mod error;
mod platform;
mod render;

use std::path::{Path, PathBuf};

use clap::Parser;
use skylight_atmosphere::write_rgba_png;
use skylight_config::{CliArgs, Config};
use tracing::{error, info};

use crate::error::AppError;
use crate::platform::PlatformDirs;
use crate::render::{Renderer, Scene, frame_path};

fn main() {
    let args = CliArgs::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        eprintln!("skylight: {e}");
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), AppError> {
    let dirs = match &args.config {
        Some(root) => PlatformDirs::resolve_with_root(root),
        None => PlatformDirs::resolve()?,
    };
    dirs.create_dirs()?;

    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(args);
    config.validate()?;
    skylight_log::init_logging(
        Some(&dirs.log_dir),
        cfg!(debug_assertions),
        Some(&config),
    );
    info!(config_dir = %dirs.config_dir.display(), "skylight starting");

    let mut renderer = Renderer::new(&config)?;
    let frames = config.render.frames.max(1);
    let output = PathBuf::from(&config.render.output);
    for index in 0..frames {
        if index > 0 {
            renderer.advance(config.render.frame_interval_s);
        }
        let frame = renderer.frame();
        let scene = Scene::new(&frame, &config.fog);
        let image = render::render(
            &scene,
            config.render.projection,
            config.render.width,
            config.render.height,
            config.render.threads,
        );

        let path = frame_path(&output, index, frames);
        ensure_parent(&path)?;
        write_rgba_png(
            &path,
            image.width,
            image.height,
            &image.to_rgba8(config.sky.exposure),
        )?;
        info!(path = %path.display(), frame = index, "wrote image");

        if index == 0 && config.debug.export_luts {
            let written = frame.export_luts(Path::new(&config.debug.lut_export_dir))?;
            info!(count = written.len(), dir = %config.debug.lut_export_dir, "exported LUTs");
        }
    }
    info!(
        frames,
        sky_view_rebuilds = renderer.sky_view_rebuilds(),
        "render finished"
    );
    Ok(())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
