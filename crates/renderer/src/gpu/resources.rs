use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::lifecycle::{Lifecycle, ResourceId, ResourceKind};
use crate::types::SurfaceSize;

use super::pipeline::OFFSCREEN_FORMAT;
use super::scope;

/// Two triangles covering normalized device space.
pub(crate) const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// `a_position` at location 0, one vec2 per vertex.
pub(crate) const QUAD_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &QUAD_ATTRIBUTES,
};

pub(crate) fn create_quad(device: &wgpu::Device) -> Result<wgpu::Buffer, RenderError> {
    let (buffer, error) = scope::capture(device, || {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        })
    });
    match error {
        Some(error) => Err(RenderError::ResourceAllocation {
            resource: "quad vertex buffer",
            log: error.to_string(),
        }),
        None => Ok(buffer),
    }
}

/// Color pass render target and the bind group the noise pass samples it through.
///
/// Texture storage is fixed at allocation, so a resize builds a new
/// `OffscreenTarget` rather than touching this one.
pub(crate) struct OffscreenTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
    size: SurfaceSize,
}

impl OffscreenTarget {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: SurfaceSize,
    ) -> Result<Self, RenderError> {
        let ((texture, view, bind_group), error) = scope::capture(device, || {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("offscreen color"),
                size: wgpu::Extent3d {
                    width: size.width.max(1),
                    height: size.height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: OFFSCREEN_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("offscreen sampling"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            });
            (texture, view, bind_group)
        });
        if let Some(error) = error {
            return Err(RenderError::ResourceAllocation {
                resource: "offscreen texture",
                log: error.to_string(),
            });
        }
        tracing::debug!(%size, "allocated offscreen target");
        Ok(Self {
            texture,
            view,
            bind_group,
            size,
        })
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }
}

/// The current offscreen target plus its two ledger entries.
///
/// Reallocation builds the replacement first; the old texture is destroyed
/// through the ledger only once the new one exists.
pub(crate) struct OffscreenSlot {
    target: OffscreenTarget,
    texture_id: ResourceId,
    attachment_id: ResourceId,
}

impl OffscreenSlot {
    pub fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: SurfaceSize,
        lifecycle: &mut Lifecycle,
    ) -> Result<Self, RenderError> {
        let target = OffscreenTarget::new(device, layout, sampler, size)?;
        let texture_id = lifecycle.track(
            ResourceKind::Texture,
            "offscreen color",
            release_texture(&target),
        );
        let attachment_id = lifecycle.track(
            ResourceKind::Framebuffer,
            "offscreen attachment",
            release_attachment(&target),
        );
        Ok(Self {
            target,
            texture_id,
            attachment_id,
        })
    }

    pub fn target(&self) -> &OffscreenTarget {
        &self.target
    }

    /// Swaps in a target of `size`. On failure the current target is kept.
    pub fn reallocate(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: SurfaceSize,
        lifecycle: &mut Lifecycle,
    ) -> Result<(), RenderError> {
        let target = OffscreenTarget::new(device, layout, sampler, size)?;
        lifecycle.replace(self.attachment_id, release_attachment(&target));
        lifecycle.replace(self.texture_id, release_texture(&target));
        self.target = target;
        Ok(())
    }
}

fn release_texture(target: &OffscreenTarget) -> impl FnOnce() + 'static {
    let texture = target.texture.clone();
    move || texture.destroy()
}

fn release_attachment(target: &OffscreenTarget) -> impl FnOnce() + 'static {
    let view = target.view.clone();
    let bind_group = target.bind_group.clone();
    move || {
        drop(bind_group);
        drop(view);
    }
}

pub(crate) fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("offscreen sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::headless;
    use crate::gpu::pipeline::ProgramSet;
    use crate::lifecycle::Lifecycle;

    #[test]
    fn quad_covers_clip_space_with_two_triangles() {
        assert_eq!(QUAD_VERTICES.len(), 6);
        let area: f32 = QUAD_VERTICES
            .chunks(3)
            .map(|tri| {
                let [a, b, c] = [tri[0], tri[1], tri[2]];
                ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() / 2.0
            })
            .sum();
        assert_eq!(area, 4.0);
    }

    #[test]
    fn vertex_layout_is_tightly_packed_vec2() {
        assert_eq!(QUAD_VERTEX_LAYOUT.array_stride, 8);
        assert_eq!(QUAD_VERTEX_LAYOUT.attributes.len(), 1);
        assert_eq!(QUAD_VERTEX_LAYOUT.attributes[0].shader_location, 0);
        assert_eq!(
            QUAD_VERTEX_LAYOUT.attributes[0].format,
            wgpu::VertexFormat::Float32x2
        );
    }

    #[test]
    fn reallocated_target_matches_new_size() {
        let Some((device, _queue)) = headless::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        let mut lifecycle = Lifecycle::new();
        let programs = ProgramSet::new(&device, OFFSCREEN_FORMAT, &mut lifecycle).unwrap();
        let sampler = create_sampler(&device);
        let live_before = lifecycle.live();

        let initial = SurfaceSize::new(320, 200);
        let mut slot = OffscreenSlot::allocate(
            &device,
            &programs.texture_layout,
            &sampler,
            initial,
            &mut lifecycle,
        )
        .unwrap();
        assert_eq!(slot.target().size(), initial);
        assert_eq!(slot.target().texture.width(), 320);
        assert_eq!(slot.target().texture.height(), 200);
        assert_eq!(lifecycle.live(), live_before + 2);

        let resized = SurfaceSize::new(641, 377);
        slot.reallocate(
            &device,
            &programs.texture_layout,
            &sampler,
            resized,
            &mut lifecycle,
        )
        .unwrap();
        assert_eq!(slot.target().size(), resized);
        assert_eq!(slot.target().texture.width(), 641);
        assert_eq!(slot.target().texture.height(), 377);
        assert_eq!(lifecycle.live(), live_before + 2);

        assert_eq!(lifecycle.release_all(), live_before + 2);
    }

    #[test]
    fn failed_reallocation_keeps_current_target() {
        let Some((device, _queue)) = headless::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        let mut lifecycle = Lifecycle::new();
        let programs = ProgramSet::new(&device, OFFSCREEN_FORMAT, &mut lifecycle).unwrap();
        let sampler = create_sampler(&device);
        let initial = SurfaceSize::new(64, 64);
        let mut slot = OffscreenSlot::allocate(
            &device,
            &programs.texture_layout,
            &sampler,
            initial,
            &mut lifecycle,
        )
        .unwrap();

        let too_large = device.limits().max_texture_dimension_2d + 1;
        let err = slot
            .reallocate(
                &device,
                &programs.texture_layout,
                &sampler,
                SurfaceSize::new(too_large, 64),
                &mut lifecycle,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::ResourceAllocation {
                resource: "offscreen texture",
                ..
            }
        ));
        assert_eq!(slot.target().size(), initial);
        assert_eq!(slot.target().texture.width(), 64);
    }
}
