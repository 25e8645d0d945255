use anyhow::{Context, Result};
use renderer::{field, PointerTracker, SurfaceSize};

use crate::cli::StillArgs;
use crate::paths::AppPaths;
use crate::run::resolve_configuration;

const DEFAULT_STILL_SIZE: SurfaceSize = SurfaceSize::new(1280, 800);

/// Evaluates both passes on the CPU for a pointer that has settled, then
/// writes the frame as PNG.
pub fn export(args: StillArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let resolved = resolve_configuration(&args.preset, &paths)?;
    let size = args.size.unwrap_or(DEFAULT_STILL_SIZE);
    let (x, y) = args.pointer.unwrap_or((0.0, 0.0));
    let pointer = PointerTracker::at_rest(x, y, args.pressed).color_pass_position();

    tracing::debug!(%size, ?pointer, "rendering still");
    let image = field::render_still(&resolved.configuration, pointer, size);
    image
        .save(&args.out)
        .with_context(|| format!("failed to write still to {}", args.out.display()))?;
    println!("Wrote {size} still to {}", args.out.display());
    Ok(())
}
