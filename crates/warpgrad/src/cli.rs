use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use renderer::{RenderConfiguration, Rgb, SurfaceSize};

#[derive(Parser, Debug)]
#[command(
    name = "warpgrad",
    author,
    version,
    about = "Animated, pointer-reactive gradient with film grain",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub preset: PresetArgs,

    /// Initial window size (e.g. `1280x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<SurfaceSize>,

    /// Reload the preset file whenever it changes on disk.
    #[arg(long)]
    pub watch: bool,
}

/// Preset file selection plus per-field overrides, applied on top of the file.
#[derive(Args, Debug, Default, Clone)]
pub struct PresetArgs {
    /// Preset TOML file; defaults to `<config dir>/preset.toml` when present.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dark gradient stop as `#rrggbb`.
    #[arg(long, value_name = "HEX", value_parser = parse_color)]
    pub dark: Option<Rgb>,

    /// Middle gradient stop as `#rrggbb`.
    #[arg(long, value_name = "HEX", value_parser = parse_color)]
    pub middle: Option<Rgb>,

    /// Light gradient stop as `#rrggbb`.
    #[arg(long, value_name = "HEX", value_parser = parse_color)]
    pub light: Option<Rgb>,

    /// Strength of the pointer warp inside the border band.
    #[arg(long, value_name = "AMOUNT")]
    pub warp: Option<f32>,

    /// Gradient rotation in degrees.
    #[arg(long, value_name = "DEGREES", allow_negative_numbers = true)]
    pub angle: Option<f32>,

    /// Gradient width; smaller values compress the ramp.
    #[arg(long, value_name = "WIDTH")]
    pub width: Option<f32>,

    /// Fold the gradient into a repeating band pattern.
    #[arg(long, value_name = "BOOL")]
    pub repeating: Option<bool>,

    /// Corner radius in pixels.
    #[arg(long, value_name = "PIXELS")]
    pub border_radius: Option<f32>,

    /// Border band thickness in pixels.
    #[arg(long, value_name = "PIXELS")]
    pub border_thickness: Option<f32>,

    /// Grain strength (0 disables the grain).
    #[arg(long, value_name = "AMOUNT")]
    pub noise_intensity: Option<f32>,

    /// Grain cell count across the surface.
    #[arg(long, value_name = "SCALE")]
    pub noise_scale: Option<f32>,
}

impl PresetArgs {
    /// Writes every supplied flag over `configuration`.
    pub fn apply_overrides(&self, configuration: &mut RenderConfiguration) {
        if let Some(color) = self.dark {
            configuration.dark_color = color;
        }
        if let Some(color) = self.middle {
            configuration.middle_color = color;
        }
        if let Some(color) = self.light {
            configuration.light_color = color;
        }
        if let Some(value) = self.warp {
            configuration.warp_value = value;
        }
        if let Some(value) = self.angle {
            configuration.gradient_angle = value;
        }
        if let Some(value) = self.width {
            configuration.gradient_width = value;
        }
        if let Some(value) = self.repeating {
            configuration.gradient_repeating = value;
        }
        if let Some(value) = self.border_radius {
            configuration.border_radius = value;
        }
        if let Some(value) = self.border_thickness {
            configuration.border_thickness = value;
        }
        if let Some(value) = self.noise_intensity {
            configuration.noise_intensity = value;
        }
        if let Some(value) = self.noise_scale {
            configuration.noise_scale = value;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one frame on the CPU and write it as PNG.
    Still(StillArgs),
    /// Inspect presets and configuration paths.
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
pub struct StillArgs {
    #[command(flatten)]
    pub preset: PresetArgs,

    /// Output PNG path.
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Image size (e.g. `1280x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<SurfaceSize>,

    /// Settled pointer position in `[-1, 1]` per axis, `y` growing downward.
    #[arg(
        long,
        value_name = "X,Y",
        value_parser = parse_pointer,
        allow_hyphen_values = true
    )]
    pub pointer: Option<(f32, f32)>,

    /// Render with the press offset fully applied.
    #[arg(long)]
    pub pressed: bool,
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the built-in defaults as a preset file.
    Defaults,
    /// Parse and validate a preset file.
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the resolved configuration directory and default preset path.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<SurfaceSize, String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{trimmed}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size '{trimmed}' must be non-zero in both dimensions"));
    }
    Ok(SurfaceSize::new(width, height))
}

pub fn parse_pointer(value: &str) -> Result<(f32, f32), String> {
    let trimmed = value.trim();
    let (x, y) = trimmed
        .split_once(',')
        .ok_or_else(|| format!("invalid pointer '{trimmed}'; expected X,Y"))?;
    let axis = |raw: &str, name: &str| -> Result<f32, String> {
        let parsed: f32 = raw
            .trim()
            .parse()
            .map_err(|_| format!("invalid {name} coordinate in '{trimmed}'"))?;
        if !parsed.is_finite() || !(-1.0..=1.0).contains(&parsed) {
            return Err(format!("{name} coordinate {parsed} is outside [-1, 1]"));
        }
        Ok(parsed)
    };
    Ok((axis(x, "x")?, axis(y, "y")?))
}

pub fn parse_color(value: &str) -> Result<Rgb, String> {
    Rgb::from_hex(value).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_both_separators() {
        assert_eq!(parse_size("1280x800").unwrap(), SurfaceSize::new(1280, 800));
        assert_eq!(parse_size(" 64X32 ").unwrap(), SurfaceSize::new(64, 32));
    }

    #[test]
    fn parse_size_rejects_malformed_or_zero() {
        assert!(parse_size("1280").is_err());
        assert!(parse_size("axb").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("10x-4").is_err());
    }

    #[test]
    fn parse_pointer_reads_signed_pairs() {
        assert_eq!(parse_pointer("0.25,-0.5").unwrap(), (0.25, -0.5));
        assert_eq!(parse_pointer(" -1 , 1 ").unwrap(), (-1.0, 1.0));
    }

    #[test]
    fn parse_pointer_rejects_out_of_range() {
        assert!(parse_pointer("1.5,0").is_err());
        assert!(parse_pointer("0").is_err());
        assert!(parse_pointer("nan,0").is_err());
    }

    #[test]
    fn parse_color_reports_bad_hex() {
        assert_eq!(parse_color("#ffffff").unwrap(), Rgb::new(1.0, 1.0, 1.0));
        let err = parse_color("#12").unwrap_err();
        assert!(err.contains("#12"), "{err}");
    }

    #[test]
    fn overrides_replace_only_supplied_fields() {
        let args = PresetArgs {
            warp: Some(2.5),
            repeating: Some(true),
            light: Some(Rgb::new(1.0, 0.0, 0.0)),
            ..PresetArgs::default()
        };
        let mut configuration = RenderConfiguration::default();
        args.apply_overrides(&mut configuration);

        let defaults = RenderConfiguration::default();
        assert_eq!(configuration.warp_value, 2.5);
        assert!(configuration.gradient_repeating);
        assert_eq!(configuration.light_color, Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(configuration.dark_color, defaults.dark_color);
        assert_eq!(configuration.noise_scale, defaults.noise_scale);
    }

    #[test]
    fn cli_parses_still_subcommand() {
        let cli = Cli::try_parse_from([
            "warpgrad",
            "still",
            "--out",
            "frame.png",
            "--size",
            "32x16",
            "--pointer",
            "-0.5,0.5",
            "--pressed",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Still(args)) => {
                assert_eq!(args.out, PathBuf::from("frame.png"));
                assert_eq!(args.size, Some(SurfaceSize::new(32, 16)));
                assert_eq!(args.pointer, Some((-0.5, 0.5)));
                assert!(args.pressed);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
