use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::error::RenderError;
use crate::lifecycle::{Lifecycle, ResourceKind};
use crate::types::{GpuPowerPreference, SurfaceSize};

use super::context::GpuContext;
use super::pipeline::ProgramSet;
use super::resources::{self, OffscreenSlot};
use super::uniforms::{ColorUniforms, NoiseUniforms, UniformSlot};

/// The live GPU resource set of one session.
///
/// Every object created here is also recorded in the session's [`Lifecycle`]
/// in creation order, so a failure halfway through setup releases exactly
/// what had been created by then.
pub(crate) struct GpuState {
    context: GpuContext,
    programs: ProgramSet,
    quad: wgpu::Buffer,
    color_uniforms: UniformSlot<ColorUniforms>,
    noise_uniforms: UniformSlot<NoiseUniforms>,
    sampler: wgpu::Sampler,
    offscreen: OffscreenSlot,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        size: SurfaceSize,
        gpu_power: GpuPowerPreference,
        lifecycle: &mut Lifecycle,
    ) -> Result<Self, RenderError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size, gpu_power)?;
        let device = &context.device;

        let programs = ProgramSet::new(device, context.surface_format, lifecycle)?;

        let quad = resources::create_quad(device)?;
        track_buffer(lifecycle, "quad vertices", &quad);

        let color_uniforms = UniformSlot::new(device, &programs.uniform_layout, "color uniforms")?;
        track_buffer(lifecycle, "color uniforms", &color_uniforms.buffer);
        let noise_uniforms = UniformSlot::new(device, &programs.uniform_layout, "noise uniforms")?;
        track_buffer(lifecycle, "noise uniforms", &noise_uniforms.buffer);

        let sampler = resources::create_sampler(device);
        let offscreen = OffscreenSlot::allocate(
            device,
            &programs.texture_layout,
            &sampler,
            context.size,
            lifecycle,
        )?;

        tracing::debug!(size = %context.size, live = lifecycle.live(), "GPU resources ready");

        Ok(Self {
            context,
            programs,
            quad,
            color_uniforms,
            noise_uniforms,
            sampler,
            offscreen,
        })
    }

    pub(crate) fn size(&self) -> SurfaceSize {
        self.context.size
    }

    /// Swaps in an offscreen target of `new_size`, then reconfigures the
    /// surface to match.
    ///
    /// Both are checked against the device limits first. On failure the
    /// surface and the old target keep their previous size.
    pub(crate) fn resize(
        &mut self,
        new_size: SurfaceSize,
        lifecycle: &mut Lifecycle,
    ) -> Result<(), RenderError> {
        if new_size.is_empty() || new_size == self.context.size {
            return Ok(());
        }
        self.context.check_size(new_size)?;
        self.offscreen.reallocate(
            &self.context.device,
            &self.programs.texture_layout,
            &self.sampler,
            new_size,
            lifecycle,
        )?;
        self.context.resize(new_size);
        Ok(())
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Encodes both passes and presents the frame.
    pub(crate) fn render(
        &mut self,
        color: &ColorUniforms,
        noise: &NoiseUniforms,
    ) -> Result<(), wgpu::SurfaceError> {
        let offscreen = self.offscreen.target();
        debug_assert_eq!(offscreen.size(), self.context.size);

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let queue = &self.context.queue;
        self.color_uniforms.write(queue, color);
        self.noise_uniforms.write(queue, noise);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });
        let size = self.context.size;

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("color pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &offscreen.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_viewport(0.0, 0.0, size.width as f32, size.height as f32, 0.0, 1.0);
            pass.set_pipeline(&self.programs.color);
            pass.set_bind_group(0, &self.color_uniforms.bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad.slice(..));
            pass.draw(0..resources::QUAD_VERTICES.len() as u32, 0..1);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("noise pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_viewport(0.0, 0.0, size.width as f32, size.height as f32, 0.0, 1.0);
            pass.set_pipeline(&self.programs.noise);
            pass.set_bind_group(0, &self.noise_uniforms.bind_group, &[]);
            pass.set_bind_group(1, &offscreen.bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad.slice(..));
            pass.draw(0..resources::QUAD_VERTICES.len() as u32, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn track_buffer(lifecycle: &mut Lifecycle, label: &'static str, buffer: &wgpu::Buffer) {
    let held = buffer.clone();
    lifecycle.track(ResourceKind::Buffer, label, move || held.destroy());
}
