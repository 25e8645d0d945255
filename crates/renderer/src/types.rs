use gradientconfig::RenderConfiguration;
use winit::dpi::PhysicalSize;

/// Backing-buffer dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Minimised windows report zero-sized surfaces; those are never applied.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_vec2(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl From<PhysicalSize<u32>> for SurfaceSize {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

impl From<SurfaceSize> for PhysicalSize<u32> {
    fn from(size: SurfaceSize) -> Self {
        PhysicalSize::new(size.width, size.height)
    }
}

impl std::fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// GPU adapter preference forwarded to wgpu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags: how large the window should open,
/// what it is titled, and the gradient configuration for the first frame.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: SurfaceSize,
    pub title: String,
    pub configuration: RenderConfiguration,
    pub gpu_power: GpuPowerPreference,
}

impl Default for RendererConfig {
    /// Provides a 1280x800 window rendering the default gradient.
    fn default() -> Self {
        Self {
            surface_size: SurfaceSize::new(1280, 800),
            title: "warpgrad".to_string(),
            configuration: RenderConfiguration::default(),
            gpu_power: GpuPowerPreference::default(),
        }
    }
}
