use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::error::RenderError;
use crate::types::{GpuPowerPreference, SurfaceSize};

/// wgpu instance, device and surface wiring for one session.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: SurfaceSize,
    pub surface_format: wgpu::TextureFormat,
    max_dimension: u32,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: SurfaceSize,
        gpu_power: GpuPowerPreference,
    ) -> Result<Self, RenderError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target.window_handle().map_err(|err| {
            RenderError::ContextUnavailable(format!("failed to acquire window handle: {err}"))
        })?;
        let display_handle = target.display_handle().map_err(|err| {
            RenderError::ContextUnavailable(format!("failed to acquire display handle: {err}"))
        })?;

        // The host keeps the window alive until the session is torn down.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(|err| {
            RenderError::ContextUnavailable(format!("failed to create rendering surface: {err}"))
        })?;

        let power_preference = match gpu_power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| {
            RenderError::ContextUnavailable(format!("failed to find a suitable GPU adapter: {err}"))
        })?;

        let adapter_info = adapter.get_info();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let width = initial_size.width.max(1);
        let height = initial_size.height.max(1);
        check_surface_size(SurfaceSize::new(width, height), max_dimension)?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("warpgrad device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| {
            RenderError::ContextUnavailable(format!("failed to create GPU device: {err}"))
        })?;

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            return Err(RenderError::ContextUnavailable(
                "surface is incompatible with the selected adapter".to_string(),
            ));
        };
        // Shader output is already gamma-encoded; an sRGB swapchain would encode it twice.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    fallback = ?first_format,
                    "no non-sRGB surface format available; colors will look washed out"
                );
                first_format
            });

        let present_mode = if surface_caps
            .present_modes
            .contains(&wgpu::PresentMode::Fifo)
        {
            wgpu::PresentMode::Fifo
        } else {
            surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        };
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        tracing::debug!(?surface_format, ?present_mode, "configuring surface");

        let size = SurfaceSize::new(width, height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            surface_format,
            max_dimension,
        })
    }

    pub(crate) fn check_size(&self, size: SurfaceSize) -> Result<(), RenderError> {
        check_surface_size(size, self.max_dimension)
    }

    /// Callers validate `new_size` with [`check_size`](Self::check_size) first.
    pub(crate) fn resize(&mut self, new_size: SurfaceSize) {
        if new_size.is_empty() {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Re-applies the current configuration after the surface was lost or outdated.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Rejects surfaces the device cannot back with a single 2D texture.
pub(crate) fn check_surface_size(size: SurfaceSize, max_dimension: u32) -> Result<(), RenderError> {
    if size.width > max_dimension || size.height > max_dimension {
        return Err(RenderError::ResourceAllocation {
            resource: "surface",
            log: format!("GPU max texture dimension is {max_dimension}, requested surface is {size}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_size_within_limits_is_accepted() {
        assert!(check_surface_size(SurfaceSize::new(8192, 8192), 8192).is_ok());
        assert!(check_surface_size(SurfaceSize::new(1, 1), 8192).is_ok());
    }

    #[test]
    fn oversized_surface_reports_resource_allocation() {
        let err = check_surface_size(SurfaceSize::new(8193, 600), 8192).unwrap_err();
        match err {
            RenderError::ResourceAllocation { resource, log } => {
                assert_eq!(resource, "surface");
                assert!(log.contains("8193x600"), "{log}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
