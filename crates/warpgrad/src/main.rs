mod cli;
mod paths;
mod run;
mod still;

use std::path::Path;

use anyhow::{Context, Result};
use cli::{Command, ConfigAction};
use gradientconfig::PresetFile;
use paths::AppPaths;
use renderer::RenderConfiguration;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Still(args)) => still::export(args),
        Some(Command::Config(config_cmd)) => handle_config_command(config_cmd.action),
        None => run::run(cli.run),
    }
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Defaults => run_config_defaults(),
        ConfigAction::Check { file } => run_config_check(&file),
        ConfigAction::Where => run_config_where(),
    }
}

fn run_config_defaults() -> Result<()> {
    let preset = PresetFile::from_configuration(&RenderConfiguration::default());
    let rendered = preset
        .to_toml_string()
        .context("failed to render default preset")?;
    print!("{rendered}");
    Ok(())
}

fn run_config_check(file: &Path) -> Result<()> {
    let configuration = run::load_preset(file)?;
    println!("{} is valid", file.display());
    println!(
        "  colors:   dark={} middle={} light={}",
        configuration.dark_color, configuration.middle_color, configuration.light_color
    );
    println!(
        "  gradient: width={} angle={} repeating={} warp={}",
        configuration.gradient_width,
        configuration.gradient_angle,
        configuration.gradient_repeating,
        configuration.warp_value
    );
    println!(
        "  border:   radius={} thickness={}",
        configuration.border_radius, configuration.border_thickness
    );
    println!(
        "  noise:    intensity={} scale={}",
        configuration.noise_intensity, configuration.noise_scale
    );
    for field in configuration.out_of_range_fields() {
        println!("  warning:  {field} is outside the control range");
    }
    Ok(())
}

fn run_config_where() -> Result<()> {
    let paths = AppPaths::discover()?;
    let preset = paths.default_preset();
    println!("Configuration directories:");
    println!("  config:     {}", paths.config_dir().display());
    println!(
        "  preset:     {} ({})",
        preset.display(),
        if preset.is_file() { "present" } else { "missing" }
    );
    Ok(())
}
