use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use gradientconfig::PresetFile;
use renderer::{RenderConfiguration, Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::{PresetArgs, RunArgs};
use crate::paths::AppPaths;

const WATCH_INTERVAL: Duration = Duration::from_millis(500);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let resolved = resolve_configuration(&args.preset, &paths)?;
    log_out_of_range(&resolved.configuration);

    let mut renderer_config = RendererConfig {
        configuration: resolved.configuration,
        ..RendererConfig::default()
    };
    if let Some(size) = args.size {
        renderer_config.surface_size = size;
    }

    let mut renderer = Renderer::new(renderer_config);
    if args.watch {
        match resolved.source {
            Some(path) => {
                tracing::info!(path = %path.display(), "watching preset for changes");
                renderer = renderer.with_configuration_updates(spawn_watcher(path, args.preset));
            }
            None => tracing::warn!("--watch requested but no preset file is in use"),
        }
    }

    renderer.run()
}

/// A configuration plus the preset file it was read from, if any.
#[derive(Debug)]
pub struct ResolvedConfiguration {
    pub configuration: RenderConfiguration,
    pub source: Option<PathBuf>,
}

/// Layers defaults, then the preset file, then command-line overrides.
pub fn resolve_configuration(args: &PresetArgs, paths: &AppPaths) -> Result<ResolvedConfiguration> {
    let source = match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let fallback = paths.default_preset();
            fallback.is_file().then_some(fallback)
        }
    };

    let base = match &source {
        Some(path) => load_preset(path)?,
        None => RenderConfiguration::default(),
    };
    let configuration = layer_overrides(base, args)?;
    Ok(ResolvedConfiguration {
        configuration,
        source,
    })
}

pub fn load_preset(path: &Path) -> Result<RenderConfiguration> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read preset {}", path.display()))?;
    let preset = PresetFile::from_toml_str(&contents)
        .with_context(|| format!("invalid preset {}", path.display()))?;
    let configuration = preset.configuration()?;
    tracing::debug!(path = %path.display(), "loaded preset");
    Ok(configuration)
}

fn layer_overrides(
    mut configuration: RenderConfiguration,
    args: &PresetArgs,
) -> Result<RenderConfiguration> {
    args.apply_overrides(&mut configuration);
    configuration
        .validate()
        .context("command-line overrides produce an invalid configuration")?;
    Ok(configuration.normalized())
}

fn log_out_of_range(configuration: &RenderConfiguration) {
    for field in configuration.out_of_range_fields() {
        tracing::warn!(%field, "configuration value outside the control range");
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Polls the preset's modification time and sends each successfully reloaded
/// configuration. Flags passed on the command line keep overriding the file.
fn spawn_watcher(path: PathBuf, overrides: PresetArgs) -> Receiver<RenderConfiguration> {
    let (tx, rx) = unbounded();
    let spawned = thread::Builder::new()
        .name("warpgrad-watch".into())
        .spawn(move || watch_loop(&path, &overrides, &tx));
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "failed to start preset watcher");
    }
    rx
}

fn watch_loop(path: &Path, overrides: &PresetArgs, tx: &Sender<RenderConfiguration>) {
    let mut last_seen = modified_at(path);
    loop {
        thread::sleep(WATCH_INTERVAL);
        let current = modified_at(path);
        if current.is_none() || current == last_seen {
            continue;
        }
        last_seen = current;

        let reloaded = load_preset(path).and_then(|base| layer_overrides(base, overrides));
        match reloaded {
            Ok(configuration) => {
                tracing::info!(path = %path.display(), "preset reloaded");
                if tx.send(configuration).is_err() {
                    break;
                }
            }
            Err(err) => tracing::warn!(error = %format!("{err:#}"), "ignoring preset change"),
        }
    }
}
