//! Command-line argument parsing for the skylight renderer.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// skylight command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "skylight", about = "Precomputed sky, cloud and celestial renderer")]
pub struct CliArgs {
    /// Output image width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Output image height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Local time of day in hours (0-24).
    #[arg(long)]
    pub hour: Option<f64>,

    /// Calendar date as YYYY-MM-DD; a leading `-` gives years before 1 CE
    /// (astronomical numbering, so `-0001` is 2 BCE).
    #[arg(long, allow_hyphen_values = true)]
    pub date: Option<String>,

    /// Observer latitude in degrees.
    #[arg(long)]
    pub latitude: Option<f64>,

    /// Observer longitude in degrees.
    #[arg(long)]
    pub longitude: Option<f64>,

    /// Cloud coverage (0-1).
    #[arg(long)]
    pub coverage: Option<f32>,

    /// Eclipse fraction (0-1); enables the eclipse.
    #[arg(long)]
    pub eclipse: Option<f32>,

    /// Output image path.
    #[arg(long, short)]
    pub output: Option<String>,

    /// Number of frames to render, advancing the day/night clock between them.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Export every LUT as PNG.
    #[arg(long)]
    pub export_luts: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Parse `YYYY-MM-DD` or `-YYYY-MM-DD`.
fn parse_date(text: &str) -> Option<(i32, u32, u32)> {
    let text = text.trim();
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text),
    };
    let mut parts = rest.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    let day = parts.next()?.parse().ok()?;
    Some((sign * year, month, day))
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.render.width = w;
        }
        if let Some(h) = args.height {
            self.render.height = h;
        }
        if let Some(hour) = args.hour {
            self.celestial.hour = hour.rem_euclid(24.0);
        }
        if let Some(ref date) = args.date {
            match parse_date(date) {
                Some((year, month, day)) => {
                    self.celestial.year = year;
                    self.celestial.month = month;
                    self.celestial.day = day;
                }
                None => log::warn!("Ignoring malformed --date {date:?} (expected YYYY-MM-DD)"),
            }
        }
        if let Some(lat) = args.latitude {
            self.celestial.latitude_deg = lat.clamp(-90.0, 90.0);
        }
        if let Some(lon) = args.longitude {
            self.celestial.longitude_deg = lon;
        }
        if let Some(coverage) = args.coverage {
            self.clouds.coverage = coverage.clamp(0.0, 1.0);
        }
        if let Some(amount) = args.eclipse {
            self.celestial.eclipse_enabled = true;
            self.celestial.eclipse_amount = amount.clamp(0.0, 1.0);
        }
        if let Some(ref output) = args.output {
            self.render.output = output.clone();
        }
        if let Some(frames) = args.frames {
            self.render.frames = frames.max(1);
        }
        if args.export_luts {
            self.debug.export_luts = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
