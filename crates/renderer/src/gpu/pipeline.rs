use crate::compile::{self, ShaderSpec};
use crate::error::RenderError;
use crate::lifecycle::{Lifecycle, ResourceKind};

use super::resources::QUAD_VERTEX_LAYOUT;
use super::scope;

/// Format of the offscreen color target written by the color pass.
pub(crate) const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Both render programs plus the bind group layouts they were linked against.
///
/// The two programs share one vertex module. Everything here is created once
/// per session; configuration changes never come back through this type.
pub(crate) struct ProgramSet {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub color: wgpu::RenderPipeline,
    pub noise: wgpu::RenderPipeline,
}

impl ProgramSet {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        lifecycle: &mut Lifecycle,
    ) -> Result<Self, RenderError> {
        let vertex = tracked_shader(device, &compile::QUAD_VERTEX, lifecycle)?;
        let color_fragment = tracked_shader(device, &compile::COLOR_FRAGMENT, lifecycle)?;
        let noise_fragment = tracked_shader(device, &compile::NOISE_FRAGMENT, lifecycle)?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("offscreen sampling layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let color = link(
            device,
            "color program",
            &vertex,
            &color_fragment,
            &[&uniform_layout],
            OFFSCREEN_FORMAT,
        )?;
        track_program(lifecycle, "color program", &color);

        let noise = link(
            device,
            "noise program",
            &vertex,
            &noise_fragment,
            &[&uniform_layout, &texture_layout],
            surface_format,
        )?;
        track_program(lifecycle, "noise program", &noise);

        Ok(Self {
            uniform_layout,
            texture_layout,
            color,
            noise,
        })
    }
}

fn tracked_shader(
    device: &wgpu::Device,
    shader: &ShaderSpec,
    lifecycle: &mut Lifecycle,
) -> Result<wgpu::ShaderModule, RenderError> {
    let module = compile::create_shader_module(device, shader)?;
    let held = module.clone();
    lifecycle.track(ResourceKind::Shader, shader.label, move || drop(held));
    Ok(module)
}

fn track_program(lifecycle: &mut Lifecycle, label: &'static str, pipeline: &wgpu::RenderPipeline) {
    let held = pipeline.clone();
    lifecycle.track(ResourceKind::Program, label, move || drop(held));
}

/// Links a vertex and fragment module into a render pipeline.
///
/// Interface mismatches between the stages or against the bind group layouts
/// surface as wgpu validation errors, reported as [`RenderError::Link`].
pub(crate) fn link(
    device: &wgpu::Device,
    label: &'static str,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    target_format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline, RenderError> {
    let (pipeline, error) = scope::capture(device, || {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts,
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some("main"),
                buffers: &[QUAD_VERTEX_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        })
    });
    if let Some(error) = error {
        let log = error.to_string();
        tracing::error!(label, %log, "program failed to link");
        return Err(RenderError::Link { label, log });
    }
    tracing::debug!(label, ?target_format, "linked program");
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::headless;

    #[test]
    fn program_set_links_and_records_every_object() {
        let Some((device, _queue)) = headless::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        let mut lifecycle = Lifecycle::new();
        ProgramSet::new(&device, wgpu::TextureFormat::Bgra8Unorm, &mut lifecycle).unwrap();
        // three shader modules, two programs
        assert_eq!(lifecycle.live(), 5);
        assert_eq!(lifecycle.release_all(), 5);
    }
}
